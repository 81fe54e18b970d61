//! Common types, errors, and utilities for wasm-harness.
//!
//! This crate provides shared functionality used across the wasm-harness workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for harness settings
//! - The bounded error-message policy applied at the harness boundary

pub mod config;
pub mod error;

pub use config::{HarnessConfig, RunOptions};
pub use error::{ArenaError, HarnessError, MAX_ERROR_MESSAGE_LEN, truncate_message};
