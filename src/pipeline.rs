//! Run orchestration
//!
//! preamble -> well-known types -> classify -> instance pass -> static pass
//! -> combined extension unit. Single threaded; nothing outlives the run.

use serde::Serialize;
use tracing::{info, instrument};

use crate::assembler::{assemble, AssemblyOptions, EXTENSIONS_ARTIFACT, PREAMBLE_ARTIFACT};
use crate::classifier::{classify, WellKnownTypes};
use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Recorder, Severity};
use crate::error::ObsgenError;
use crate::generator::{preamble, InstanceEventGenerator, StaticEventGenerator};
use crate::registry::{EntrySummary, ExtensionRegistry};
use crate::sink::{ArtifactGuard, EmissionSink};
use crate::symbols::{CandidateReference, Resolver};
use crate::walker::{HierarchyWalker, RootOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub bytes: usize,
}

/// Everything a run produced, in emission order
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub artifacts: Vec<ArtifactSummary>,
    pub roots: Vec<RootOutcome>,
    pub extensions: Vec<EntrySummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

pub struct Pipeline<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn run(
        &self,
        resolver: &dyn Resolver,
        candidates: &[CandidateReference],
        sink: &mut dyn EmissionSink,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<RunReport, ObsgenError> {
        let options = AssemblyOptions::from(self.config);
        let mut guard = ArtifactGuard::new(sink);

        if let Some(text) = assemble(&[preamble(self.config)], &options) {
            guard.emit(PREAMBLE_ARTIFACT, &text)?;
        }

        let well_known = WellKnownTypes::locate(resolver, self.config)?;
        let worklists = classify(candidates, resolver, &well_known);

        let mut registry = ExtensionRegistry::new();
        let mut recorder = Recorder::new(diagnostics);
        let mut roots = Vec::with_capacity(worklists.len());

        // Each walk builds its own pass state
        let instance_generator = InstanceEventGenerator::new(resolver);
        let instance_walker = HierarchyWalker::new(resolver, &instance_generator, options);
        roots.extend(instance_walker.walk(
            &worklists.instance,
            &mut registry,
            &mut guard,
            &mut recorder,
        )?);

        let static_generator = StaticEventGenerator::new(resolver);
        let static_walker = HierarchyWalker::new(resolver, &static_generator, options);
        roots.extend(static_walker.walk(
            &worklists.statics,
            &mut registry,
            &mut guard,
            &mut recorder,
        )?);

        if let Some(text) = registry.assemble(self.config) {
            guard.emit(EXTENSIONS_ARTIFACT, &text)?;
        }

        let artifacts: Vec<ArtifactSummary> = guard
            .emitted()
            .iter()
            .map(|(name, bytes)| ArtifactSummary {
                name: name.clone(),
                bytes: *bytes,
            })
            .collect();

        info!(
            artifacts = artifacts.len(),
            roots = roots.len(),
            warnings = recorder.recorded().len(),
            "generation finished"
        );

        Ok(RunReport {
            artifacts,
            roots,
            extensions: registry.summaries(),
            diagnostics: recorder.into_recorded(),
        })
    }
}
