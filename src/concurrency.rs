//! Concurrency control.
//!
//! Strict two-phase page-level locking: locks are acquired as pages are
//! touched and released together at transaction completion. The lock
//! manager itself never blocks; waiting and timeout-abort live in the
//! page cache.

pub mod lock;

pub use lock::{LockManager, LockMode};
