//! Fixed-capacity memory pool backing one lifecycle.
//!
//! Every component of the harness draws its memory budget from a single
//! [`MemoryArena`]: module storage, the instance's linear-memory segment,
//! and the call stacks of the instance and execution context. The pool
//! never grows; when a reservation cannot be satisfied, the requesting
//! stage fails cleanly instead of falling back to another allocator.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use wasm_harness_common::ArenaError;

/// A fixed-capacity allocation budget for one execution lifecycle.
///
/// Cloning is cheap and shares the same underlying accounting, so the
/// lifecycle controller and store-held leases all debit one budget.
#[derive(Clone)]
pub struct MemoryArena {
    state: Arc<Mutex<ArenaState>>,
}

struct ArenaState {
    capacity: usize,
    used: usize,
}

impl MemoryArena {
    /// Create a pool with the given capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ArenaState { capacity, used: 0 })),
        }
    }

    /// Reserve `bytes` from the pool.
    ///
    /// The returned [`Reservation`] credits the pool back when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Exhausted`] when the pool cannot satisfy the
    /// request and [`ArenaError::ZeroReservation`] for zero-byte requests.
    pub fn reserve(&self, bytes: usize) -> Result<Reservation, ArenaError> {
        if bytes == 0 {
            return Err(ArenaError::ZeroReservation);
        }

        let mut state = self.state.lock();
        let remaining = state.capacity - state.used;
        if bytes > remaining {
            return Err(ArenaError::Exhausted {
                requested: bytes,
                remaining,
            });
        }
        state.used += bytes;
        trace!(bytes, used = state.used, "pool reservation");

        Ok(Reservation {
            arena: self.clone(),
            bytes,
        })
    }

    /// Total pool capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Bytes currently reserved.
    pub fn used(&self) -> usize {
        self.state.lock().used
    }

    /// Bytes still available for reservation.
    pub fn remaining(&self) -> usize {
        let state = self.state.lock();
        state.capacity - state.used
    }

    fn release(&self, bytes: usize) {
        let mut state = self.state.lock();
        debug_assert!(state.used >= bytes);
        state.used = state.used.saturating_sub(bytes);
        trace!(bytes, used = state.used, "pool release");
    }
}

impl std::fmt::Debug for MemoryArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryArena")
            .field("capacity", &state.capacity)
            .field("used", &state.used)
            .finish()
    }
}

/// A slice of pool capacity held by one lifecycle resource.
///
/// Released back to the pool on drop.
pub struct Reservation {
    arena: MemoryArena,
    bytes: usize,
}

impl Reservation {
    /// Size of this reservation in bytes.
    pub fn len(&self) -> usize {
        self.bytes
    }

    /// Returns `true` if the reservation holds no bytes. Reservations
    /// are always created non-empty.
    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.arena.release(self.bytes);
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}
