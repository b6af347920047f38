//! Candidate classification
//!
//! Splits raw candidate references into the instance and static worklists.
//! Anything that does not resolve cleanly is dropped without a diagnostic:
//! most scanned references have nothing to do with this generator.

use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::ObsgenError;
use crate::symbols::{CandidateReference, Resolver, Symbol, TypeDescriptor};

/// A root request that survived classification
#[derive(Debug, Clone)]
pub struct ClassifiedTarget {
    pub reference: CandidateReference,
    pub symbol: Symbol,
    pub ty: TypeDescriptor,
}

/// Ordered roots for both passes
#[derive(Debug, Default)]
pub struct Worklists {
    pub instance: Vec<ClassifiedTarget>,
    pub statics: Vec<ClassifiedTarget>,
}

impl Worklists {
    pub fn len(&self) -> usize {
        self.instance.len() + self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instance.is_empty() && self.statics.is_empty()
    }
}

/// Types the classifier matches candidate symbols against
#[derive(Debug, Clone)]
pub struct WellKnownTypes {
    pub extension_type: TypeDescriptor,
    /// Static-style candidates are unusable without it, but its absence is
    /// not fatal
    pub static_attribute: Option<TypeDescriptor>,
}

impl WellKnownTypes {
    /// Locate the well-known types; a missing extension type aborts the run
    pub fn locate(resolver: &dyn Resolver, config: &GeneratorConfig) -> Result<Self, ObsgenError> {
        let extension_type = resolver.find_type(&config.extension_type).ok_or_else(|| {
            ObsgenError::MissingWellKnownType {
                name: config.extension_type.clone(),
            }
        })?;
        let static_attribute = resolver.find_type(&config.static_attribute);
        if static_attribute.is_none() {
            debug!(
                attribute = %config.static_attribute,
                "static attribute not found, static candidates will be ignored"
            );
        }
        Ok(Self {
            extension_type,
            static_attribute,
        })
    }
}

pub fn classify(
    candidates: &[CandidateReference],
    resolver: &dyn Resolver,
    well_known: &WellKnownTypes,
) -> Worklists {
    let mut worklists = Worklists::default();

    for reference in candidates {
        let Some(symbol) = resolver.resolve(reference) else {
            trace!(location = %reference.location(), "candidate did not resolve");
            continue;
        };

        match (reference, &symbol) {
            (
                CandidateReference::Instance { .. },
                Symbol::Method {
                    container,
                    type_args,
                    ..
                },
            ) => {
                if *container != well_known.extension_type {
                    trace!(container = %container, "method on unrelated type");
                    continue;
                }
                let [Some(ty)] = type_args.as_slice() else {
                    trace!(location = %reference.location(), "expected exactly one resolved type argument");
                    continue;
                };
                let ty = ty.clone();
                let target = ClassifiedTarget {
                    reference: reference.clone(),
                    symbol: symbol.clone(),
                    ty,
                };
                if target.ty.is_static() {
                    worklists.statics.push(target);
                } else {
                    worklists.instance.push(target);
                }
            }
            (
                CandidateReference::Static { .. },
                Symbol::Attribute {
                    attribute,
                    argument,
                },
            ) => {
                if well_known.static_attribute.as_ref() != Some(attribute) {
                    trace!(attribute = %attribute, "unrelated attribute");
                    continue;
                }
                let Some(ty) = argument.clone() else {
                    trace!(location = %reference.location(), "attribute argument is not a type");
                    continue;
                };
                worklists.statics.push(ClassifiedTarget {
                    reference: reference.clone(),
                    symbol: symbol.clone(),
                    ty,
                });
            }
            _ => trace!(location = %reference.location(), "symbol kind does not match candidate"),
        }
    }

    debug!(
        instance = worklists.instance.len(),
        statics = worklists.statics.len(),
        "classified candidates"
    );
    worklists
}
