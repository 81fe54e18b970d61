//! The lifecycle controller.
//!
//! [`run_program`] drives one complete lifecycle: runtime initialization,
//! module load, instantiation, context creation, entry resolution, and
//! invocation. Any stage failure short-circuits straight to teardown.
//! Resources are released in the exact reverse of acquisition order on
//! every exit path; this falls out of declaration order and the context's
//! mutable borrow of its instance, not manual ordering discipline.
//!
//! A controller invocation is not reusable: it consumes its arena, and a
//! fresh runtime environment is initialized per call.

use std::num::NonZeroU32;
use std::time::Instant;

use tracing::{debug, info};

use crate::arena::MemoryArena;
use crate::context::{ENTRY_FUNCTION, ExecutionContext};
use crate::engine::Runtime;
use crate::instance::ModuleInstance;
use crate::invoke::{InvocationResult, invoke};
use crate::module::LoadedModule;
use wasm_harness_common::{HarnessError, RunOptions, truncate_message};

/// Harness-level result of one lifecycle call.
///
/// Exactly one of the two fields is authoritative: the return value is
/// meaningful only when `error_message` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramReturn {
    /// Return value of the last invocation; zero on failure.
    pub return_value: i64,

    /// Human-readable failure description, at most 128 bytes.
    /// Empty on success.
    pub error_message: String,
}

impl ProgramReturn {
    fn success(return_value: i64) -> Self {
        Self {
            return_value,
            error_message: String::new(),
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            return_value: 0,
            error_message: truncate_message(message),
        }
    }

    /// Returns `true` if the lifecycle completed without error.
    pub fn is_success(&self) -> bool {
        self.error_message.is_empty()
    }
}

/// Run one complete lifecycle: load `wasm`, instantiate it against the
/// pool, resolve the `program` export, and invoke it
/// `options.iterations` times.
///
/// All resources are torn down before this returns, whether the run
/// succeeded or failed at any stage. The arena is consumed; construct a
/// fresh one per call.
pub fn run_program(wasm: &[u8], arena: MemoryArena, options: &RunOptions) -> ProgramReturn {
    let result = match run_lifecycle(wasm, &arena, options) {
        Ok(InvocationResult::Success { value, .. }) => ProgramReturn::success(value),
        Ok(InvocationResult::Trap { message, .. }) => ProgramReturn::failure(&message),
        Err(error) => ProgramReturn::failure(&error.to_string()),
    };
    debug_assert_eq!(arena.used(), 0, "lifecycle leaked pool capacity");
    result
}

/// The forward transitions of the lifecycle, in order. Each `?` jumps
/// straight to teardown; drops run context -> instance -> module ->
/// runtime, the reverse of acquisition.
fn run_lifecycle(
    wasm: &[u8],
    arena: &MemoryArena,
    options: &RunOptions,
) -> Result<InvocationResult, HarnessError> {
    options.validate()?;
    let iterations = NonZeroU32::new(options.iterations)
        .ok_or_else(|| HarnessError::invalid_config("iterations must be at least 1"))?;

    let runtime = Runtime::new(options)?;

    let setup_start = Instant::now();
    let module = LoadedModule::load(&runtime, wasm, arena)?;
    let mut instance = ModuleInstance::instantiate(
        &runtime,
        &module,
        options.stack_size,
        options.heap_size,
        arena,
    )?;
    let mut context = ExecutionContext::new(&mut instance, options.stack_size, arena)?;
    let entry = context.resolve(ENTRY_FUNCTION)?;

    info!(
        elapsed_ns = setup_start.elapsed().as_nanos() as u64,
        "load to lookup complete"
    );
    debug!(pool_used = arena.used(), pool_capacity = arena.capacity());

    Ok(invoke(&mut context, entry, iterations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_return_success() {
        let result = ProgramReturn::success(42);
        assert!(result.is_success());
        assert_eq!(result.return_value, 42);
        assert!(result.error_message.is_empty());
    }

    #[test]
    fn test_program_return_failure_truncates() {
        let result = ProgramReturn::failure(&"e".repeat(300));
        assert!(!result.is_success());
        assert_eq!(result.return_value, 0);
        assert_eq!(
            result.error_message.len(),
            wasm_harness_common::MAX_ERROR_MESSAGE_LEN
        );
    }
}
