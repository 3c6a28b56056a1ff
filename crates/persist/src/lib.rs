//! Persistence: the append-only access log and the keyed lock table.
//!
//! Both stores hold their full state in memory and rewrite their file on
//! every mutation.
//!
//! # Invariants
//! - The access log preserves insertion order and never deduplicates.
//! - At most one lock exists per container key.
//! - A failed write is logged and never rolls back the in-memory change.
//! - A missing or unreadable file yields an empty store, never a startup failure.
//!
//! Neither store locks internally. Callers with concurrent access wrap each
//! store in its own mutex.

mod codec;
mod error;
pub mod lock_store;
pub mod log_store;
mod wire;

pub use error::StoreError;
pub use lock_store::{LockQuota, LockRecord, LockRejected, LockStore};
pub use log_store::AccessLogStore;

/// Default file name of the access log, relative to the data directory.
pub const LOG_FILE_NAME: &str = "chest_logs.dat";
/// Default file name of the lock table, relative to the data directory.
pub const LOCK_FILE_NAME: &str = "chest_locks.dat";
