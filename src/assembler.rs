//! Artifact assembly and naming
//!
//! Artifact names are consumed by downstream tooling and must stay
//! bit-exact: `SourceClass<display-name>-<Role>Events.SourceGenerated.cs`.

use crate::config::GeneratorConfig;
use crate::generator::Role;

pub const ARTIFACT_SUFFIX: &str = "SourceGenerated.cs";

/// Fixed name of the preamble emitted at run start
pub const PREAMBLE_ARTIFACT: &str = "ObservableEvents.Preamble.SourceGenerated.cs";

/// Fixed name of the combined extension unit
pub const EXTENSIONS_ARTIFACT: &str = "ObservableEvents.Extensions.SourceGenerated.cs";

pub const AUTO_GENERATED_MARKER: &str = "// <auto-generated />";

/// A finalized unit ready for the emission sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub text: String,
}

/// Header options applied to every assembled unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub nullable_context: bool,
}

impl From<&GeneratorConfig> for AssemblyOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            nullable_context: config.nullable_context,
        }
    }
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            nullable_context: true,
        }
    }
}

/// Per-type artifact name
///
/// Generic display names keep their parameters in braces
/// (`Demo.Box<T, U>` -> `Demo.Box{T,U}`) so `Box` and `Box<T>` never collide.
pub fn artifact_name(display_name: &str, role: Role) -> String {
    let safe: String = display_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '<' => '{',
            '>' => '}',
            other => other,
        })
        .collect();
    format!("SourceClass{}-{}Events.{}", safe, role.tag(), ARTIFACT_SUFFIX)
}

/// Wrap fragments into one unit with a single auto-generated marker
///
/// Returns `None` for an empty input: callers emit nothing in that case.
pub fn assemble<S: AsRef<str>>(fragments: &[S], options: &AssemblyOptions) -> Option<String> {
    if fragments.is_empty() {
        return None;
    }

    let mut text = String::new();
    text.push_str(AUTO_GENERATED_MARKER);
    text.push('\n');
    text.push_str("#pragma warning disable\n");
    if options.nullable_context {
        text.push_str("#nullable enable\n");
    }

    for fragment in fragments {
        text.push('\n');
        text.push_str(fragment.as_ref().trim_end());
        text.push('\n');
    }

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_bit_exact() {
        assert_eq!(
            artifact_name("Foo", Role::Instance),
            "SourceClassFoo-InstanceEvents.SourceGenerated.cs"
        );
        assert_eq!(
            artifact_name("Demo.Clock", Role::Static),
            "SourceClassDemo.Clock-StaticEvents.SourceGenerated.cs"
        );
    }

    #[test]
    fn generic_names_are_file_safe_and_distinct() {
        let generic = artifact_name("Demo.Box<T, U>", Role::Instance);
        assert_eq!(generic, "SourceClassDemo.Box{T,U}-InstanceEvents.SourceGenerated.cs");
        assert_ne!(generic, artifact_name("Demo.Box", Role::Instance));
    }

    #[test]
    fn empty_input_assembles_to_nothing() {
        let none: [&str; 0] = [];
        assert!(assemble(&none, &AssemblyOptions::default()).is_none());
    }

    #[test]
    fn single_marker_for_many_fragments() {
        let text = assemble(&["class A {}", "class B {}\n\n"], &AssemblyOptions::default()).unwrap();
        assert_eq!(text.matches(AUTO_GENERATED_MARKER).count(), 1);
        assert!(text.starts_with(AUTO_GENERATED_MARKER));
        assert!(text.contains("#nullable enable"));
        assert!(text.ends_with("class A {}\n\nclass B {}\n"));
    }

    #[test]
    fn nullable_context_is_optional() {
        let options = AssemblyOptions {
            nullable_context: false,
        };
        let text = assemble(&["class A {}"], &options).unwrap();
        assert!(!text.contains("#nullable"));
    }
}
