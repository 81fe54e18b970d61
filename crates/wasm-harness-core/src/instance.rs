//! Module instantiation against the memory pool.
//!
//! [`ModuleInstance`] owns the Wasmtime [`Store`] and [`Instance`] for one
//! lifecycle, plus the pool reservations for its call stack and linear
//! memory. Linear-memory growth is bounded by the heap reservation via
//! [`wasmtime::ResourceLimiter`], so a module that needs more memory than
//! the pool granted fails at instantiation rather than growing unchecked.

use tracing::{debug, instrument};
use wasmtime::{Instance, ResourceLimiter, Store};

use crate::arena::{MemoryArena, Reservation};
use crate::engine::Runtime;
use crate::module::LoadedModule;
use wasm_harness_common::HarnessError;

/// Store data for one instance: the lease bounding linear memory.
pub(crate) struct InstanceState {
    memory_lease: Reservation,
}

impl ResourceLimiter for InstanceState {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(desired <= self.memory_lease.len())
    }

    fn table_growing(
        &mut self,
        _current: usize,
        _desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(true)
    }
}

/// Runtime materialization of a loaded module.
///
/// Must be dropped before the [`LoadedModule`] it was derived from; the
/// lifecycle controller's declaration order guarantees this.
pub struct ModuleInstance {
    pub(crate) store: Store<InstanceState>,
    pub(crate) instance: Instance,
    _stack: Reservation,
}

impl ModuleInstance {
    /// Instantiate a loaded module, reserving its call stack and linear
    /// memory budget from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Instantiate`] when the sizes are not
    /// positive, the pool cannot cover `stack_size + heap_size`, the
    /// module has unmet imports, or its initial memory exceeds the heap
    /// budget. On failure no partially constructed instance escapes;
    /// any reservations taken are released before returning.
    #[instrument(skip(runtime, module, arena))]
    pub fn instantiate(
        runtime: &Runtime,
        module: &LoadedModule,
        stack_size: u32,
        heap_size: u32,
        arena: &MemoryArena,
    ) -> Result<Self, HarnessError> {
        if stack_size == 0 || heap_size == 0 {
            return Err(HarnessError::instantiate(
                "stack_size and heap_size must be positive",
            ));
        }

        let stack = arena
            .reserve(stack_size as usize)
            .map_err(|e| HarnessError::instantiate(e.to_string()))?;
        let memory_lease = arena
            .reserve(heap_size as usize)
            .map_err(|e| HarnessError::instantiate(e.to_string()))?;

        let mut store = Store::new(runtime.inner(), InstanceState { memory_lease });
        store.limiter(|state| state);

        // No import binding in this harness: modules must be self-contained.
        let instance = Instance::new(&mut store, module.inner(), &[])
            .map_err(|e| HarnessError::instantiate(e.to_string()))?;

        debug!(stack_size, heap_size, "module instantiated");

        Ok(Self {
            store,
            instance,
            _stack: stack,
        })
    }
}

impl std::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleInstance").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_harness_common::RunOptions;

    fn runtime() -> Runtime {
        Runtime::new(&RunOptions::default()).unwrap()
    }

    #[test]
    fn test_instantiate_reserves_stack_and_heap() {
        let runtime = runtime();
        let arena = MemoryArena::with_capacity(512 * 1024);
        let module = LoadedModule::from_wat(&runtime, "(module)", &arena).unwrap();

        let instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();
        assert_eq!(arena.used(), "(module)".len() + 8092 + 65536);

        drop(instance);
        assert_eq!(arena.used(), "(module)".len());
    }

    #[test]
    fn test_instantiate_pool_too_small() {
        let runtime = runtime();
        let arena = MemoryArena::with_capacity(4096);
        let module = LoadedModule::from_wat(&runtime, "(module)", &arena).unwrap();

        let err =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap_err();
        assert!(matches!(err, HarnessError::Instantiate { .. }));

        // The loaded module survives a failed instantiation.
        assert_eq!(arena.used(), "(module)".len());
        drop(module);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_instantiate_rejects_zero_sizes() {
        let runtime = runtime();
        let arena = MemoryArena::with_capacity(512 * 1024);
        let module = LoadedModule::from_wat(&runtime, "(module)", &arena).unwrap();

        let err = ModuleInstance::instantiate(&runtime, &module, 0, 65536, &arena).unwrap_err();
        assert!(matches!(err, HarnessError::Instantiate { .. }));
    }

    #[test]
    fn test_initial_memory_bounded_by_heap_budget() {
        let runtime = runtime();
        let arena = MemoryArena::with_capacity(512 * 1024);
        // Declares 4 pages (256 KiB) of initial memory.
        let module = LoadedModule::from_wat(&runtime, "(module (memory 4))", &arena).unwrap();

        // Heap budget of 1 page cannot back 4 pages of initial memory.
        let err =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap_err();
        assert!(matches!(err, HarnessError::Instantiate { .. }));

        // A sufficient budget succeeds.
        let ok = ModuleInstance::instantiate(&runtime, &module, 8092, 4 * 65536, &arena);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_unmet_import_fails() {
        let runtime = runtime();
        let arena = MemoryArena::with_capacity(512 * 1024);
        let source = r#"(module (import "env" "f" (func)))"#;
        let module = LoadedModule::from_wat(&runtime, source, &arena).unwrap();

        let err =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap_err();
        assert!(matches!(err, HarnessError::Instantiate { .. }));

        // A failed instantiation leaves only the module storage reserved.
        assert_eq!(arena.used(), source.len());
    }
}
