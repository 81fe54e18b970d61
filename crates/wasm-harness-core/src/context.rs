//! Execution context and entry-point resolution.
//!
//! An [`ExecutionContext`] is the thread of control used to invoke
//! functions within exactly one instance. It borrows the instance
//! mutably, which makes the required teardown order (context before
//! instance) a compile-time property rather than a discipline.

use tracing::debug;
use wasmtime::{Store, Trap, TypedFunc};

use crate::arena::{MemoryArena, Reservation};
use crate::instance::{InstanceState, ModuleInstance};
use wasm_harness_common::HarnessError;

/// Name of the single export this harness invokes.
pub const ENTRY_FUNCTION: &str = "program";

/// A thread of control bound 1:1 to a module instance.
pub struct ExecutionContext<'a> {
    instance: &'a mut ModuleInstance,
    _stack: Reservation,
}

impl<'a> ExecutionContext<'a> {
    /// Bind an execution context to an instance, reserving its call
    /// stack from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Context`] when `stack_size` is zero or
    /// the pool is exhausted. Failure leaves the instance untouched and
    /// independently destroyable.
    pub fn new(
        instance: &'a mut ModuleInstance,
        stack_size: u32,
        arena: &MemoryArena,
    ) -> Result<Self, HarnessError> {
        if stack_size == 0 {
            return Err(HarnessError::context("stack_size must be positive"));
        }

        let stack = arena
            .reserve(stack_size as usize)
            .map_err(|e| HarnessError::context(e.to_string()))?;

        debug!(stack_size, "execution context created");

        Ok(Self {
            instance,
            _stack: stack,
        })
    }

    /// Resolve an exported zero-argument function returning `i64`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::EntryNotFound`] when no export carries
    /// `name`, and [`HarnessError::BadEntrySignature`] when the export
    /// exists with a different type.
    pub fn resolve(&mut self, name: &str) -> Result<EntryFunction, HarnessError> {
        let func = self
            .instance
            .instance
            .get_func(&mut self.instance.store, name)
            .ok_or_else(|| HarnessError::entry_not_found(name))?;

        let typed = func
            .typed::<(), i64>(&self.instance.store)
            .map_err(|e| HarnessError::BadEntrySignature {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!(name, "entry function resolved");

        Ok(EntryFunction { func: typed })
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store<InstanceState> {
        &mut self.instance.store
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext").finish_non_exhaustive()
    }
}

/// Handle to the resolved entry export.
///
/// Valid only while the instance it was resolved from is alive.
#[derive(Clone)]
pub struct EntryFunction {
    func: TypedFunc<(), i64>,
}

impl EntryFunction {
    /// Perform one zero-argument call expecting a 64-bit signed result.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Trap`] carrying the runtime's exception
    /// text when the call traps.
    pub fn call(&self, context: &mut ExecutionContext<'_>) -> Result<i64, HarnessError> {
        self.func
            .call(context.store_mut(), ())
            .map_err(|e| HarnessError::trap(trap_message(&e)))
    }
}

impl std::fmt::Debug for EntryFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFunction").finish_non_exhaustive()
    }
}

/// Extract the runtime's exception text from a call error.
fn trap_message(error: &wasmtime::Error) -> String {
    if error.downcast_ref::<Trap>().is_some() {
        error.root_cause().to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Runtime;
    use crate::module::LoadedModule;
    use wasm_harness_common::RunOptions;

    fn instance_from(wat: &str, arena: &MemoryArena) -> (Runtime, LoadedModule) {
        let runtime = Runtime::new(&RunOptions::default()).unwrap();
        let module = LoadedModule::from_wat(&runtime, wat, arena).unwrap();
        (runtime, module)
    }

    #[test]
    fn test_resolve_missing_export() {
        let arena = MemoryArena::with_capacity(512 * 1024);
        let (runtime, module) = instance_from("(module)", &arena);
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();

        let mut context = ExecutionContext::new(&mut instance, 8092, &arena).unwrap();
        let err = context.resolve(ENTRY_FUNCTION).unwrap_err();

        assert!(err.is_resolution());
        assert_eq!(err.to_string(), "The program function is not found");
    }

    #[test]
    fn test_resolve_wrong_signature() {
        let arena = MemoryArena::with_capacity(512 * 1024);
        let (runtime, module) = instance_from(
            r#"(module (func (export "program") (result i32) i32.const 1))"#,
            &arena,
        );
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();

        let mut context = ExecutionContext::new(&mut instance, 8092, &arena).unwrap();
        let err = context.resolve(ENTRY_FUNCTION).unwrap_err();

        assert!(matches!(err, HarnessError::BadEntrySignature { .. }));
    }

    #[test]
    fn test_context_failure_leaves_instance_usable() {
        let arena = MemoryArena::with_capacity(90 * 1024);
        let (runtime, module) = instance_from(
            r#"(module (func (export "program") (result i64) i64.const 7))"#,
            &arena,
        );
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();

        // Not enough pool left for a second stack of this size.
        let remaining = arena.remaining() as u32;
        let err = ExecutionContext::new(&mut instance, remaining + 1, &arena).unwrap_err();
        assert!(matches!(err, HarnessError::Context { .. }));

        // The instance is still usable with a smaller context stack.
        let mut context = ExecutionContext::new(&mut instance, remaining, &arena).unwrap();
        let entry = context.resolve(ENTRY_FUNCTION).unwrap();
        assert_eq!(entry.call(&mut context).unwrap(), 7);
    }

    #[test]
    fn test_call_returns_value() {
        let arena = MemoryArena::with_capacity(512 * 1024);
        let (runtime, module) = instance_from(
            r#"(module (func (export "program") (result i64) i64.const 42))"#,
            &arena,
        );
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();
        let mut context = ExecutionContext::new(&mut instance, 8092, &arena).unwrap();

        let entry = context.resolve(ENTRY_FUNCTION).unwrap();
        assert_eq!(entry.call(&mut context).unwrap(), 42);
    }

    #[test]
    fn test_entry_handle_is_cloneable() {
        let arena = MemoryArena::with_capacity(512 * 1024);
        let (runtime, module) = instance_from(
            r#"(module (func (export "program") (result i64) i64.const 9))"#,
            &arena,
        );
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();
        let mut context = ExecutionContext::new(&mut instance, 8092, &arena).unwrap();

        let entry = context.resolve(ENTRY_FUNCTION).unwrap();
        let alias = entry.clone();

        // Both handles resolve to the same export.
        assert_eq!(entry.call(&mut context).unwrap(), 9);
        assert_eq!(alias.call(&mut context).unwrap(), 9);
    }

    #[test]
    fn test_call_trap_carries_runtime_message() {
        let arena = MemoryArena::with_capacity(512 * 1024);
        let (runtime, module) = instance_from(
            r#"(module (func (export "program") (result i64) unreachable))"#,
            &arena,
        );
        let mut instance =
            ModuleInstance::instantiate(&runtime, &module, 8092, 65536, &arena).unwrap();
        let mut context = ExecutionContext::new(&mut instance, 8092, &arena).unwrap();

        let entry = context.resolve(ENTRY_FUNCTION).unwrap();
        let err = entry.call(&mut context).unwrap_err();

        assert!(err.is_trap());
        assert!(err.to_string().contains("unreachable"));
    }
}
