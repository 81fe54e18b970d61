//! Runtime environment initialization.
//!
//! One [`Runtime`] is created per lifecycle call and torn down at its end;
//! no runtime state stays resident between calls. The harness is strictly
//! synchronous, so the engine is configured without async support or any
//! interruption mechanism. A call that never returns blocks the harness
//! indefinitely; that is an accepted limitation of this design.

use tracing::debug;
use wasmtime::{Config, Engine, OptLevel};

use wasm_harness_common::{HarnessError, RunOptions};

/// Per-call runtime environment wrapping a Wasmtime [`Engine`].
pub struct Runtime {
    engine: Engine,
}

impl Runtime {
    /// Initialize a fresh runtime environment for one lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Init`] if the engine cannot be created
    /// from the derived configuration.
    pub fn new(options: &RunOptions) -> Result<Self, HarnessError> {
        let mut config = Config::new();

        // Bound guest call depth by the configured stack size.
        config.max_wasm_stack(options.stack_size as usize);

        config.cranelift_opt_level(OptLevel::Speed);

        let engine = Engine::new(&config)
            .map_err(|e| HarnessError::init(format!("Failed to create engine: {e}")))?;

        debug!(stack_size = options.stack_size, "runtime environment initialized");

        Ok(Self { engine })
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}
