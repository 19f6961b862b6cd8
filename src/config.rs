//! Module that contains the timing knobs of a ring member.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config file {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("critical section rate must be positive, got {0}")]
    InvalidRate(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Longest time spent inside the critical section.
    pub critical_section_ms: u64,
    /// Pause before a PONG leaves, throttling how fast rounds cycle.
    pub pong_delay_ms: u64,
    /// When set, critical section times are exponential samples with this rate (per second).
    pub critical_section_rate: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            critical_section_ms: 1000,
            pong_delay_ms: 500,
            critical_section_rate: None,
            seed: None,
        }
    }
}

impl NodeConfig {
    pub fn critical_section(&self) -> Duration {
        Duration::from_millis(self.critical_section_ms)
    }

    pub fn pong_delay(&self) -> Duration {
        Duration::from_millis(self.pong_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.critical_section_rate {
            Some(rate) if !(rate > 0.0 && rate.is_finite()) => Err(ConfigError::InvalidRate(rate)),
            _ => Ok(()),
        }
    }

    /// Function that parses the config from a JSON formatted `String`.
    pub fn from_json_string(config: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_json_string(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}
