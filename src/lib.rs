//! obsgen - observable wrappers for every event in a type hierarchy
//!
//! Given a resolved compilation snapshot and the candidate references a
//! scanner found, obsgen walks each requested type and its ancestors and
//! emits one wrapper artifact per event-bearing type, plus a combined
//! extension unit exposing the wrappers.

pub mod assembler;
pub mod classifier;
pub mod compilation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod identity;
pub mod pipeline;
pub mod registry;
pub mod sink;
pub mod symbols;
pub mod walker;

pub use assembler::{artifact_name, Artifact};
pub use classifier::{classify, ClassifiedTarget, WellKnownTypes, Worklists};
pub use compilation::Compilation;
pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use error::{FixSuggestion, ObsgenError};
pub use generator::{
    DeclarationFragment, EventGenerator, InstanceEventGenerator, Role, StaticEventGenerator,
};
pub use identity::TypeKey;
pub use pipeline::{Pipeline, RunReport};
pub use registry::ExtensionRegistry;
pub use sink::{DirectorySink, EmissionSink, MemorySink};
pub use symbols::{CandidateReference, Location, Resolver, Symbol, TypeDescriptor};
pub use walker::{HierarchyWalker, RootOutcome};
