//! Core module-lifecycle harness for wasm-harness.
//!
//! This crate implements the full lifecycle of loading and invoking one
//! WebAssembly program against a fixed-capacity memory pool:
//!
//! ```text
//! initialize runtime -> load module -> instantiate -> create context
//!     -> resolve entry -> invoke (N times) -> tear down in reverse
//! ```
//!
//! - [`MemoryArena`]: fixed-capacity allocation budget for one lifecycle
//! - [`Runtime`]: per-call runtime environment (Wasmtime engine)
//! - [`LoadedModule`]: validated, compiled program binary
//! - [`ModuleInstance`]: runtime materialization of a module
//! - [`ExecutionContext`]: thread of control bound 1:1 to an instance
//! - [`invoke`]: repeated entry-function calls with per-call timing
//! - [`run_program`]: the lifecycle controller tying it all together
//!
//! Teardown order is always the exact reverse of acquisition order, on
//! success and on failure alike; every resource is released through its
//! owner's `Drop`, so partial construction cannot leak pool capacity.

pub mod arena;
pub mod context;
pub mod engine;
pub mod instance;
pub mod invoke;
pub mod lifecycle;
pub mod module;

pub use arena::{MemoryArena, Reservation};
pub use context::{ENTRY_FUNCTION, EntryFunction, ExecutionContext};
pub use engine::Runtime;
pub use instance::ModuleInstance;
pub use invoke::{InvocationResult, invoke};
pub use lifecycle::{ProgramReturn, run_program};
pub use module::LoadedModule;
