//! Error types with fix suggestions
//!
//! Only run-level failures live here. Per-candidate and per-root problems
//! never become errors: unresolvable candidates are dropped and empty roots
//! are reported as diagnostics (see `diagnostics`).

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum ObsgenError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Snapshot loading (OBSGEN-010 to OBSGEN-015)
    // ─────────────────────────────────────────────────────────────

    #[error("OBSGEN-010: Type '{name}' with arity {arity} is declared more than once")]
    DuplicateType { name: String, arity: usize },

    #[error("OBSGEN-011: Invalid identifier '{ident}' in {context}")]
    InvalidIdentifier { ident: String, context: String },

    #[error("OBSGEN-012: Base type '{base}' of '{type_name}' is not declared")]
    UnknownBaseType { type_name: String, base: String },

    #[error("OBSGEN-013: Base type '{base}' of '{type_name}' has {found} type arguments, expected {expected}")]
    BaseArityMismatch {
        type_name: String,
        base: String,
        expected: usize,
        found: usize,
    },

    #[error("OBSGEN-014: Inheritance cycle detected: {cycle}")]
    InheritanceCycle { cycle: String },

    #[error("OBSGEN-015: Malformed type reference '{text}'")]
    MalformedTypeRef { text: String },

    // ─────────────────────────────────────────────────────────────
    // Run setup (OBSGEN-020)
    // ─────────────────────────────────────────────────────────────

    #[error("OBSGEN-020: Well-known type '{name}' could not be located in the compilation")]
    MissingWellKnownType { name: String },

    // ─────────────────────────────────────────────────────────────
    // Emission (OBSGEN-030)
    // ─────────────────────────────────────────────────────────────

    #[error("OBSGEN-030: Artifact '{name}' was emitted twice")]
    DuplicateArtifact { name: String },
}

impl FixSuggestion for ObsgenError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ObsgenError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            ObsgenError::Io(_) => Some("Check file path and permissions"),
            ObsgenError::DuplicateType { .. } => {
                Some("Declare each type once; merge the event lists of duplicate entries")
            }
            ObsgenError::InvalidIdentifier { .. } => {
                Some("Use dotted identifiers like Namespace.Type (letters, digits, underscores)")
            }
            ObsgenError::UnknownBaseType { .. } => {
                Some("Declare the base type under types: or remove the base: entry")
            }
            ObsgenError::BaseArityMismatch { .. } => {
                Some("Pass one type argument per type parameter of the base type")
            }
            ObsgenError::InheritanceCycle { .. } => {
                Some("Break the cycle - a type cannot inherit from itself")
            }
            ObsgenError::MalformedTypeRef { .. } => {
                Some("Use Name or Name<Arg1, Arg2> with balanced angle brackets")
            }
            ObsgenError::MissingWellKnownType { .. } => {
                Some("Keep preamble: true in the snapshot or fix extension_type in the config")
            }
            ObsgenError::DuplicateArtifact { .. } => {
                Some("Two types render to the same display name; rename one of them")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_codes() {
        let err = ObsgenError::MissingWellKnownType {
            name: "Rx.Extensions".to_string(),
        };
        assert!(err.to_string().starts_with("OBSGEN-020"));
        assert!(err.to_string().contains("Rx.Extensions"));
    }

    #[test]
    fn every_variant_has_a_suggestion() {
        let err = ObsgenError::InheritanceCycle {
            cycle: "A -> B -> A".to_string(),
        };
        assert!(err.fix_suggestion().is_some());

        let err = ObsgenError::DuplicateArtifact {
            name: "SourceClassFoo-InstanceEvents.SourceGenerated.cs".to_string(),
        };
        assert!(err.fix_suggestion().unwrap().contains("display name"));
    }
}
