//! TOML run configuration.
//!
//! A run config file carries `[strategy]` and `[session]` tables; both
//! are optional and missing fields fall back to the engine defaults:
//!
//! ```toml
//! [strategy]
//! threshold = 6.0
//! lookback_bars = 120
//! sell_only = true
//!
//! [session]
//! enabled = true
//! start = "09:00:00"
//! end = "21:00:00"
//! timezone = "Asia/Tehran"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use swinglab_core::{SessionConfig, StrategyConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Full run configuration as loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub strategy: StrategyConfig,
    pub session: SessionConfig,
}

impl RunConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }
}
