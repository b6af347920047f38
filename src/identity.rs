//! Type identity for dedup
//!
//! Two descriptors denote the same type when they share a qualified name and
//! a generic arity. The type arguments of a particular instantiation are
//! noise here: `Box<int>` and `Box<string>` are one node of the traversal
//! graph.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::symbols::TypeDescriptor;

/// Dedup key: qualified name + arity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    name: Arc<str>,
    arity: usize,
}

impl TypeKey {
    pub fn new(name: impl Into<Arc<str>>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// Metadata-style rendering (`Ns.Box`1`)
impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arity == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}`{}", self.name, self.arity)
        }
    }
}

/// Types already visited during one pass
///
/// Scoped to a single pass (instance or static). A key goes in at most once
/// and is never removed.
#[derive(Debug, Default)]
pub(crate) struct ProcessedSet {
    seen: HashSet<TypeKey>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ty` as processed. Returns `false` if it was already there.
    pub fn insert(&mut self, ty: &TypeDescriptor) -> bool {
        self.seen.insert(ty.key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Every root requested within one worklist
#[derive(Debug, Default)]
pub(crate) struct RootSet {
    roots: HashSet<TypeKey>,
}

impl RootSet {
    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a TypeDescriptor>) -> Self {
        Self {
            roots: types.into_iter().map(TypeDescriptor::key).collect(),
        }
    }

    pub fn contains(&self, ty: &TypeDescriptor) -> bool {
        self.roots.contains(&ty.key())
    }
}
