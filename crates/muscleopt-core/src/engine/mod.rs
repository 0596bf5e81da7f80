//! # Engine Module
//!
//! The stateful layer of the tool: the editable configuration, the filters that drive
//! which names are shown, and the controller that runs the external optimizer.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The tool configuration aggregate, its typed change
//!   events, numeric input validation, snapshots and settings load/save
//! - **Filtering** ([`filter`]) - Pattern and group-membership filters over a selection set
//! - **Execution** ([`execution`]) - Single-flight background runs with cancellation and
//!   transactional publication of the resulting model
//! - **Optimizer Seam** ([`optimizer`]) - The trait the external optimizer is reached through
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - The aggregate engine error type
//!
//! Locks are always taken in the order execution lifecycle, then configuration. Event
//! listeners run while the emitting object is locked and must not call back into it.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod config;
pub mod error;
pub mod execution;
pub mod filter;
pub mod optimizer;
pub mod progress;

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
