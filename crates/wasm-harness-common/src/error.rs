//! Error types for the wasm-harness.
//!
//! This module defines the error hierarchy using `thiserror`:
//! - [`HarnessError`]: one variant per lifecycle stage, so a failure
//!   message alone disambiguates which stage failed
//! - [`ArenaError`]: memory-pool accounting failures, wrapped into the
//!   stage error of whichever component hit exhaustion

use thiserror::Error;

/// Maximum length in bytes of an error message crossing the harness
/// boundary. Longer messages are truncated, not rejected.
pub const MAX_ERROR_MESSAGE_LEN: usize = 128;

/// Errors raised during one harness lifecycle.
///
/// Each variant corresponds to a single lifecycle stage. Failures
/// short-circuit straight to teardown; nothing here is retried.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The runtime environment failed to initialize.
    #[error("Init runtime environment failed: {reason}")]
    Init {
        /// Description of the initialization failure.
        reason: String,
    },

    /// The program binary is malformed or could not be loaded.
    #[error("Load failed: {reason}")]
    Load {
        /// Description of the load failure.
        reason: String,
    },

    /// The loaded module could not be instantiated.
    #[error("Instantiate failed: {reason}")]
    Instantiate {
        /// Description of the instantiation failure.
        reason: String,
    },

    /// The execution context could not be created.
    #[error("Create execution context failed: {reason}")]
    Context {
        /// Description of the context-creation failure.
        reason: String,
    },

    /// The entry function is not exported by the module.
    #[error("The {name} function is not found")]
    EntryNotFound {
        /// Name of the missing export.
        name: String,
    },

    /// The entry export exists but has the wrong signature.
    #[error("The {name} function has an unexpected signature: {reason}")]
    BadEntrySignature {
        /// Name of the export.
        name: String,
        /// Description of the signature mismatch.
        reason: String,
    },

    /// A WebAssembly trap was raised during invocation.
    #[error("{message}")]
    Trap {
        /// The runtime's exception text.
        message: String,
    },

    /// A precondition on the supplied parameters was violated.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

/// Memory-pool accounting errors.
#[derive(Error, Debug)]
pub enum ArenaError {
    /// The pool cannot satisfy the requested reservation.
    #[error("memory pool exhausted: requested {requested} bytes, {remaining} remaining")]
    Exhausted {
        /// Bytes requested.
        requested: usize,
        /// Bytes still available in the pool.
        remaining: usize,
    },

    /// A reservation of zero bytes was requested.
    #[error("zero-byte reservation requested")]
    ZeroReservation,
}

impl HarnessError {
    /// Create a new `Init` error.
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
        }
    }

    /// Create a new `Load` error.
    pub fn load(reason: impl Into<String>) -> Self {
        Self::Load {
            reason: reason.into(),
        }
    }

    /// Create a new `Instantiate` error.
    pub fn instantiate(reason: impl Into<String>) -> Self {
        Self::Instantiate {
            reason: reason.into(),
        }
    }

    /// Create a new `Context` error.
    pub fn context(reason: impl Into<String>) -> Self {
        Self::Context {
            reason: reason.into(),
        }
    }

    /// Create a new `EntryNotFound` error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Create a new `Trap` error.
    pub fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error is a WebAssembly trap.
    pub fn is_trap(&self) -> bool {
        matches!(self, Self::Trap { .. })
    }

    /// Returns `true` if the entry point could not be resolved.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::EntryNotFound { .. } | Self::BadEntrySignature { .. }
        )
    }
}

/// Truncate a message to [`MAX_ERROR_MESSAGE_LEN`] bytes on a UTF-8
/// character boundary.
pub fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_string();
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
