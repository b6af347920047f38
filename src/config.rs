//! Generator configuration (obsgen.yaml)

use std::path::Path;

use serde::Deserialize;

use crate::error::ObsgenError;

/// Metadata name of the extension entry-point type declared by the preamble
pub const DEFAULT_EXTENSION_TYPE: &str = "ReactiveMarbles.ObservableEvents.ObservableEventsExtensions";

/// Metadata name of the attribute requesting static event wrappers
pub const DEFAULT_STATIC_ATTRIBUTE: &str =
    "ReactiveMarbles.ObservableEvents.GenerateStaticEventObservablesAttribute";

/// File looked up next to a snapshot when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "obsgen.yaml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Type every instance-style candidate must be invoked on
    pub extension_type: String,

    /// Attribute type every static-style candidate must carry
    pub static_attribute: String,

    /// Emit `#nullable enable` after the auto-generated marker
    pub nullable_context: bool,

    /// Treat warning diagnostics as a failed run (CLI exit code)
    pub warnings_as_errors: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            extension_type: DEFAULT_EXTENSION_TYPE.to_string(),
            static_attribute: DEFAULT_STATIC_ATTRIBUTE.to_string(),
            nullable_context: true,
            warnings_as_errors: false,
        }
    }
}

impl GeneratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ObsgenError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ObsgenError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load `obsgen.yaml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self, ObsgenError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading generator config");
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}
