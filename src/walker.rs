//! Hierarchy walker
//!
//! Visits each root and its event-bearing ancestors depth-first with an
//! explicit stack. Every type is generated at most once per pass no matter
//! how many roots reach it; the pass state lives in a `PassContext` that is
//! created fresh for each worklist.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::assembler::{artifact_name, assemble, AssemblyOptions};
use crate::classifier::ClassifiedTarget;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::ObsgenError;
use crate::generator::{EventGenerator, Role};
use crate::identity::{ProcessedSet, RootSet, TypeKey};
use crate::registry::ExtensionRegistry;
use crate::sink::EmissionSink;
use crate::symbols::{Location, Resolver, TypeDescriptor};

/// Mutable state of one pass. Never shared between passes.
#[derive(Debug)]
pub(crate) struct PassContext {
    processed: ProcessedSet,
    roots: RootSet,
    /// Types that produced a fragment during this pass
    generated: HashSet<TypeKey>,
}

impl PassContext {
    pub fn new(targets: &[ClassifiedTarget]) -> Self {
        Self {
            processed: ProcessedSet::new(),
            roots: RootSet::from_types(targets.iter().map(|t| &t.ty)),
            generated: HashSet::new(),
        }
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }
}

/// Per-root result, used for the "no events" diagnostic and run reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootOutcome {
    pub display_name: String,
    pub role: Role,
    pub had_events: bool,
    pub location: Location,
}

pub struct HierarchyWalker<'a> {
    resolver: &'a dyn Resolver,
    generator: &'a dyn EventGenerator,
    options: AssemblyOptions,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        generator: &'a dyn EventGenerator,
        options: AssemblyOptions,
    ) -> Self {
        Self {
            resolver,
            generator,
            options,
        }
    }

    /// Walk every root of one worklist
    #[instrument(skip_all, fields(role = %self.generator.role(), roots = targets.len()))]
    pub fn walk(
        &self,
        targets: &[ClassifiedTarget],
        registry: &mut ExtensionRegistry,
        sink: &mut dyn EmissionSink,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<Vec<RootOutcome>, ObsgenError> {
        let mut pass = PassContext::new(targets);
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let had_events = self.walk_root(&target.ty, &mut pass, registry, sink)?;
            let display_name = target.ty.instantiated_name();

            if !had_events {
                debug!(root = %display_name, "no events in hierarchy");
                diagnostics.report(Diagnostic::no_events_found(
                    &display_name,
                    target.reference.location(),
                ));
            }

            outcomes.push(RootOutcome {
                display_name,
                role: self.generator.role(),
                had_events,
                location: target.reference.location().clone(),
            });
        }

        debug!(processed = pass.processed().len(), "pass complete");
        Ok(outcomes)
    }

    fn walk_root(
        &self,
        root: &TypeDescriptor,
        pass: &mut PassContext,
        registry: &mut ExtensionRegistry,
        sink: &mut dyn EmissionSink,
    ) -> Result<bool, ObsgenError> {
        let mut stack = vec![root.clone()];
        let mut had_events = false;

        while let Some(item) = stack.pop() {
            if !pass.processed.insert(&item) {
                // Visited by an earlier root: its outcome still counts here
                if !had_events && self.chain_generated(&item, pass) {
                    had_events = true;
                }
                trace!(ty = %item, "already processed");
                continue;
            }

            let bases_with_events = self.bases_with_events(&item);
            let always_generate = pass.roots.contains(&item)
                && (!bases_with_events.is_empty() || self.resolver.declares_event_directly(&item));

            let fragment = self.generator.generate(&item, always_generate);

            // Reversed so the nearest ancestor is popped next
            stack.extend(bases_with_events.into_iter().rev());

            let Some(fragment) = fragment else {
                continue;
            };
            had_events = true;
            pass.generated.insert(fragment.key.clone());

            let name = artifact_name(&fragment.display_name, fragment.role);
            if let Some(text) = assemble(&[fragment.declaration.as_str()], &self.options) {
                debug!(artifact = %name, always_generate, "generated");
                sink.emit(&name, &text)?;
            }
            registry.register(&fragment);
        }

        Ok(had_events)
    }

    /// Ancestors that declare at least one event themselves
    fn bases_with_events(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        self.resolver
            .ancestors(ty)
            .into_iter()
            .filter(|a| self.resolver.declares_event_directly(a))
            .collect()
    }

    fn chain_generated(&self, ty: &TypeDescriptor, pass: &PassContext) -> bool {
        pass.generated.contains(&ty.key())
            || self
                .bases_with_events(ty)
                .iter()
                .any(|b| pass.generated.contains(&b.key()))
    }
}
