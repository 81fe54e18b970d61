//! Repeated entry-function invocation with per-call timing.
//!
//! The invoker performs `iterations` zero-argument calls against one
//! execution context. The first trap halts the loop immediately; on full
//! success only the last iteration's return value is kept. Intermediate
//! values are deliberately discarded: this harness measures throughput,
//! it does not aggregate results.

use std::num::NonZeroU32;
use std::time::Instant;

use tracing::{info, warn};

use crate::context::{EntryFunction, ExecutionContext};

/// Outcome of invoking the entry function.
#[derive(Debug)]
pub enum InvocationResult {
    /// All iterations completed; `value` is from the last call.
    Success {
        /// Return value of the final iteration.
        value: i64,
        /// Number of calls performed (equals the requested iterations).
        calls_completed: u32,
    },

    /// A call trapped; later iterations never ran.
    Trap {
        /// The runtime's exception text.
        message: String,
        /// Calls that completed before the trap.
        calls_completed: u32,
    },
}

impl InvocationResult {
    /// Returns `true` if every iteration completed.
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }

    /// Returns `true` if a call trapped.
    pub fn is_trap(&self) -> bool {
        matches!(self, InvocationResult::Trap { .. })
    }
}

/// Invoke the resolved entry function `iterations` times.
///
/// Timing is a reporting side effect: average per-call wall-clock
/// duration is logged in nanoseconds and never influences the result.
pub fn invoke(
    context: &mut ExecutionContext<'_>,
    entry: EntryFunction,
    iterations: NonZeroU32,
) -> InvocationResult {
    let start = Instant::now();
    let mut last_value = 0i64;

    for completed in 0..iterations.get() {
        match entry.call(context) {
            Ok(value) => last_value = value,
            Err(trap) => {
                warn!(calls_completed = completed, "invocation trapped");
                return InvocationResult::Trap {
                    message: trap.to_string(),
                    calls_completed: completed,
                };
            }
        }
    }

    let elapsed = start.elapsed();
    let avg_call_ns = elapsed.as_nanos() / u128::from(iterations.get());
    info!(
        iterations = iterations.get(),
        avg_call_ns = avg_call_ns as u64,
        "invocation complete"
    );

    InvocationResult::Success {
        value: last_value,
        calls_completed: iterations.get(),
    }
}
