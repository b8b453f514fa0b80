//! Serializable run configuration.
//!
//! A run config is a TOML file with two optional tables, `[simulation]` and
//! `[indicators]`. Every field falls back to the production default, so an
//! empty file (or a file overriding a single knob) is valid.

use std::path::Path;

use crosslab_core::engine::SimConfig;
use crosslab_core::indicators::IndicatorParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse run config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything a run needs: engine tunables plus indicator periods.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulation: SimConfig,
    pub indicators: IndicatorParams,
}

impl RunConfig {
    /// Built-in hedge-companion profile.
    pub fn hedged() -> Self {
        Self {
            simulation: SimConfig::hedged(),
            ..Self::default()
        }
    }

    /// Load a run config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a run config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
