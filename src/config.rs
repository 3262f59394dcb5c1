//! Runner Configuration
//!
//! Optional `webscript.toml` settings. Every field has a default; the CLI
//! overrides whatever the file sets.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::interpreter::types::ExecutionLimits;
use crate::runner::runner::RunnerOptions;

pub const DEFAULT_CONFIG_FILE: &str = "webscript.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum tests running at once.
    pub workers: usize,
    /// Retries per test after a failed attempt.
    pub retries: u32,
    /// Ceiling on call depth inside one script.
    pub max_call_depth: usize,
    /// Ceiling on iterations of any single loop.
    pub max_loop_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        let limits = ExecutionLimits::default();
        Self {
            workers: 4,
            retries: 0,
            max_call_depth: limits.max_call_depth,
            max_loop_iterations: limits.max_loop_iterations,
        }
    }
}

impl Config {
    /// Load from a file. A missing default config file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Path::new(DEFAULT_CONFIG_FILE).to_path_buf(), false),
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) if !required => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            workers: self.workers,
            retries: self.retries,
            limits: ExecutionLimits {
                max_call_depth: self.max_call_depth,
                max_loop_iterations: self.max_loop_iterations,
            },
        }
    }
}
