//! Resolved symbols handed over by the resolution layer
//!
//! Everything here is immutable once built. Declarations are shared as
//! `Arc<TypeDecl>` so descriptors clone in O(1).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ObsgenError;
use crate::identity::TypeKey;

// ============================================================================
// DECLARATIONS
// ============================================================================

/// An event member declared directly on a type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventDecl {
    pub name: String,
    /// Delegate type of the event (`System.EventHandler`)
    pub handler: String,
    /// Payload type forwarded to subscribers; `None` for parameterless delegates
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

/// A type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Fully qualified name without type arguments
    pub name: Arc<str>,
    pub type_params: Vec<Arc<str>>,
    pub is_static: bool,
    pub base: Option<TypeRef>,
    pub events: Vec<EventDecl>,
}

impl TypeDecl {
    #[inline]
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    /// Namespace part of the qualified name, if any
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(ns, _)| ns)
    }

    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(_, simple)| simple)
            .unwrap_or(&self.name)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn instance_events(&self) -> impl Iterator<Item = &EventDecl> {
        self.events.iter().filter(|e| !e.is_static)
    }

    pub fn static_events(&self) -> impl Iterator<Item = &EventDecl> {
        self.events.iter().filter(|e| e.is_static)
    }
}

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// Syntactic type reference: `Ns.Name` or `Ns.Name<Arg, Other<X>>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn parse(text: &str) -> Result<Self, ObsgenError> {
        let malformed = || ObsgenError::MalformedTypeRef {
            text: text.to_string(),
        };
        let (parsed, rest) = Self::parse_prefix(text.trim()).ok_or_else(malformed)?;
        if !rest.trim().is_empty() {
            return Err(malformed());
        }
        Ok(parsed)
    }

    fn parse_prefix(input: &str) -> Option<(Self, &str)> {
        let input = input.trim_start();
        let end = input.find(&['<', '>', ','][..]).unwrap_or(input.len());
        let name = input[..end].trim();
        if name.is_empty() {
            return None;
        }

        let mut rest = &input[end..];
        let mut args = Vec::new();
        if let Some(inner) = rest.strip_prefix('<') {
            rest = inner;
            loop {
                let (arg, after) = Self::parse_prefix(rest)?;
                args.push(arg);
                let after = after.trim_start();
                if let Some(next) = after.strip_prefix(',') {
                    rest = next;
                } else if let Some(next) = after.strip_prefix('>') {
                    rest = next;
                    break;
                } else {
                    return None;
                }
            }
        }

        Some((
            Self {
                name: name.to_string(),
                args,
            },
            rest,
        ))
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Replace whole-name occurrences of type parameters by their arguments
    pub fn substitute(&self, params: &[Arc<str>], args: &[Arc<str>]) -> String {
        if self.args.is_empty() {
            if let Some(pos) = params.iter().position(|p| p.as_ref() == self.name) {
                if let Some(arg) = args.get(pos) {
                    return arg.to_string();
                }
            }
            return self.name.clone();
        }
        let inner: Vec<String> = self
            .args
            .iter()
            .map(|a| a.substitute(params, args))
            .collect();
        format!("{}<{}>", self.name, inner.join(", "))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// A (possibly instantiated) type as seen by the pipeline
///
/// Equality and hashing go through [`TypeKey`]: instantiation differences
/// are ignored.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    decl: Arc<TypeDecl>,
    type_args: Vec<Arc<str>>,
}

impl TypeDescriptor {
    pub fn new(decl: Arc<TypeDecl>, type_args: Vec<Arc<str>>) -> Self {
        Self { decl, type_args }
    }

    /// The declaration instantiated over its own type parameters
    pub fn declared(decl: Arc<TypeDecl>) -> Self {
        let type_args = decl.type_params.clone();
        Self { decl, type_args }
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        TypeKey::new(Arc::clone(&self.decl.name), self.decl.arity())
    }

    #[inline]
    pub fn decl(&self) -> &TypeDecl {
        &self.decl
    }

    #[inline]
    pub fn decl_arc(&self) -> &Arc<TypeDecl> {
        &self.decl
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.decl.arity()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.decl.is_static
    }

    pub fn type_args(&self) -> &[Arc<str>] {
        &self.type_args
    }

    /// Declared form, `Ns.Box<T>`. Independent of the instantiation.
    pub fn display_name(&self) -> String {
        render_generic(&self.decl.name, &self.decl.type_params)
    }

    /// Instantiated form, `Ns.Box<int>`
    pub fn instantiated_name(&self) -> String {
        render_generic(&self.decl.name, &self.type_args)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.decl.name == other.decl.name && self.decl.arity() == other.decl.arity()
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instantiated_name())
    }
}

pub(crate) fn render_generic(name: &str, args: &[Arc<str>]) -> String {
    if args.is_empty() {
        return name.to_string();
    }
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    format!("{}<{}>", name, args.join(", "))
}

// ============================================================================
// CANDIDATES & SYMBOLS
// ============================================================================

/// Source position of a candidate reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}

/// Raw request found by the syntax scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateReference {
    /// `item.Events()` style invocation
    Instance {
        /// Type declaring the invoked method
        container: String,
        method: String,
        type_args: Vec<String>,
        location: Location,
    },
    /// `[GenerateStaticEventObservables(typeof(X))]` style attribute
    Static {
        attribute: String,
        argument: Option<String>,
        location: Location,
    },
}

impl CandidateReference {
    pub fn location(&self) -> &Location {
        match self {
            Self::Instance { location, .. } | Self::Static { location, .. } => location,
        }
    }
}

/// What a candidate reference resolves to
#[derive(Debug, Clone)]
pub enum Symbol {
    Method {
        container: TypeDescriptor,
        name: String,
        /// One slot per written type argument; `None` when it did not resolve
        type_args: Vec<Option<TypeDescriptor>>,
    },
    Attribute {
        attribute: TypeDescriptor,
        argument: Option<TypeDescriptor>,
    },
}

// ============================================================================
// RESOLUTION CAPABILITY
// ============================================================================

/// Semantic queries answered by the host compilation
///
/// Implementations must be total and side-effect free.
pub trait Resolver {
    fn resolve(&self, reference: &CandidateReference) -> Option<Symbol>;

    /// Base types of `ty`, nearest first
    fn ancestors(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor>;

    fn declares_event_directly(&self, ty: &TypeDescriptor) -> bool {
        ty.decl().has_events()
    }

    /// Look up a type by metadata name (`Ns.Name` or `Ns.Name`1`)
    fn find_type(&self, metadata_name: &str) -> Option<TypeDescriptor>;
}
