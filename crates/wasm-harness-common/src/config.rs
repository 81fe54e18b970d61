//! Configuration structures for the wasm-harness.
//!
//! This module defines configuration options for one harness run:
//! - [`HarnessConfig`]: top-level configuration, loadable from a TOML file
//! - [`RunOptions`]: per-lifecycle parameters (stack, heap, iterations)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Top-level harness configuration.
///
/// Can be loaded from a TOML file or built from command-line flags.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarnessConfig {
    /// Per-run execution parameters.
    #[serde(default)]
    pub run: RunOptions,

    /// Capacity in bytes of the preallocated memory pool backing one run.
    #[serde(default = "defaults::pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            run: RunOptions::default(),
            pool_capacity: defaults::pool_capacity(),
        }
    }
}

/// Per-lifecycle execution parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunOptions {
    /// Call stack size in bytes for the instance and execution context.
    #[serde(default = "defaults::stack_size")]
    pub stack_size: u32,

    /// Linear-memory budget in bytes reserved for the instance.
    #[serde(default = "defaults::heap_size")]
    pub heap_size: u32,

    /// Number of times the entry function is invoked. Must be at least 1.
    ///
    /// Only the last iteration's return value is reported; earlier values
    /// are discarded. This is a throughput-benchmarking harness, not a
    /// result aggregator.
    #[serde(default = "defaults::iterations")]
    pub iterations: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            stack_size: defaults::stack_size(),
            heap_size: defaults::heap_size(),
            iterations: defaults::iterations(),
        }
    }
}

impl RunOptions {
    /// Validate preconditions on the run parameters.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.stack_size == 0 {
            return Err(HarnessError::invalid_config("stack_size must be positive"));
        }
        if self.heap_size == 0 {
            return Err(HarnessError::invalid_config("heap_size must be positive"));
        }
        if self.iterations == 0 {
            return Err(HarnessError::invalid_config("iterations must be at least 1"));
        }
        Ok(())
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::invalid_config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, HarnessError> {
        toml::from_str(contents)
            .map_err(|e| HarnessError::invalid_config(format!("Failed to parse config: {e}")))
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn pool_capacity() -> usize {
        512 * 1024
    }

    pub const fn stack_size() -> u32 {
        8092
    }

    pub const fn heap_size() -> u32 {
        128 * 1024
    }

    pub const fn iterations() -> u32 {
        1
    }
}
