//! Emission sinks
//!
//! The pipeline hands every finalized unit to an [`EmissionSink`]. Sinks are
//! wrapped in an [`ArtifactGuard`] so an artifact name can be emitted once
//! per run at most.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::assembler::Artifact;
use crate::error::ObsgenError;

pub trait EmissionSink {
    fn emit(&mut self, name: &str, text: &str) -> Result<(), ObsgenError>;
}

/// Keeps artifacts in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

impl EmissionSink for MemorySink {
    fn emit(&mut self, name: &str, text: &str) -> Result<(), ObsgenError> {
        self.artifacts.push(Artifact {
            name: name.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Writes each artifact to `<dir>/<name>`
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create the output directory if needed
    pub fn create(dir: &Path) -> Result<Self, ObsgenError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

impl EmissionSink for DirectorySink {
    fn emit(&mut self, name: &str, text: &str) -> Result<(), ObsgenError> {
        let path = self.dir.join(name);
        debug!(path = %path.display(), bytes = text.len(), "writing artifact");
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Refuses a second emission under an already used name
pub struct ArtifactGuard<'a> {
    inner: &'a mut dyn EmissionSink,
    emitted: HashSet<String>,
    order: Vec<(String, usize)>,
}

impl<'a> ArtifactGuard<'a> {
    pub fn new(inner: &'a mut dyn EmissionSink) -> Self {
        Self {
            inner,
            emitted: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// `(name, bytes)` of every artifact emitted so far, in order
    pub fn emitted(&self) -> &[(String, usize)] {
        &self.order
    }
}

impl EmissionSink for ArtifactGuard<'_> {
    fn emit(&mut self, name: &str, text: &str) -> Result<(), ObsgenError> {
        if !self.emitted.insert(name.to_string()) {
            return Err(ObsgenError::DuplicateArtifact {
                name: name.to_string(),
            });
        }
        self.inner.emit(name, text)?;
        self.order.push((name.to_string(), text.len()));
        Ok(())
    }
}
