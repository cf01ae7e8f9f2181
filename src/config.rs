//! Dispatcher configuration.
//!
//! Every field has a default, so an empty document (or no document) yields
//! the full pipeline.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which pipeline stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Check descriptors' authorization requirements.
    pub use_authorization: bool,
    /// Run registered validators.
    pub use_validation: bool,
    /// Redact responses for the caller's roles.
    pub use_role_redaction: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_authorization: true,
            use_validation: true,
            use_role_redaction: true,
        }
    }
}

/// Top-level dispatcher configuration.
///
/// ```toml
/// generate_request_ids = true
///
/// [pipeline]
/// use_validation = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Stage toggles.
    pub pipeline: PipelineConfig,
    /// Assign a fresh UUID v4 when the transport supplies no request id.
    pub generate_request_ids: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            generate_request_ids: true,
        }
    }
}

impl DispatcherConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
