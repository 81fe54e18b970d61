//! Program binary loading and validation.
//!
//! [`LoadedModule`] wraps a compiled Wasmtime [`Module`] together with the
//! pool reservation covering its storage. Loading validates the binary
//! header before handing the bytes to the runtime, so truncated or
//! wrong-magic inputs fail with a descriptive message and leave nothing
//! reserved in the pool.

use tracing::{debug, instrument};
use wasmtime::Module;

use crate::arena::{MemoryArena, Reservation};
use crate::engine::Runtime;
use wasm_harness_common::HarnessError;

/// A validated, compiled program binary.
///
/// The storage reservation is released when the module is dropped, which
/// the lifecycle controller does after the instance derived from it.
pub struct LoadedModule {
    module: Module,
    _storage: Reservation,
}

impl LoadedModule {
    /// Load a program binary, drawing its storage from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Load`] when the input is empty, has a bad
    /// header, fails validation, or the pool cannot cover its storage.
    #[instrument(skip(runtime, bytes, arena), fields(bytes_len = bytes.len()))]
    pub fn load(
        runtime: &Runtime,
        bytes: &[u8],
        arena: &MemoryArena,
    ) -> Result<Self, HarnessError> {
        if bytes.is_empty() {
            return Err(HarnessError::load("empty program buffer"));
        }
        Self::validate_wasm_header(bytes)?;

        let storage = arena
            .reserve(bytes.len())
            .map_err(|e| HarnessError::load(e.to_string()))?;

        let module = Module::new(runtime.inner(), bytes)
            .map_err(|e| HarnessError::load(format!("module validation failed: {e}")))?;

        debug!("module loaded");

        Ok(Self {
            module,
            _storage: storage,
        })
    }

    /// Load a module from WAT (WebAssembly Text Format).
    ///
    /// This is primarily for testing purposes.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Load`] if compilation fails or the pool
    /// cannot cover the source storage.
    pub fn from_wat(
        runtime: &Runtime,
        wat: &str,
        arena: &MemoryArena,
    ) -> Result<Self, HarnessError> {
        let storage = arena
            .reserve(wat.len())
            .map_err(|e| HarnessError::load(e.to_string()))?;

        let module = Module::new(runtime.inner(), wat)
            .map_err(|e| HarnessError::load(format!("WAT compilation failed: {e}")))?;

        Ok(Self {
            module,
            _storage: storage,
        })
    }

    /// Validate the 8-byte WebAssembly header (magic number and version).
    fn validate_wasm_header(bytes: &[u8]) -> Result<(), HarnessError> {
        if bytes.len() < 8 {
            return Err(HarnessError::load("program binary too small"));
        }

        // Magic number: \0asm
        if &bytes[0..4] != b"\0asm" {
            return Err(HarnessError::load("bad magic number"));
        }

        Ok(())
    }

    pub(crate) fn inner(&self) -> &Module {
        &self.module
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule").finish_non_exhaustive()
    }
}
