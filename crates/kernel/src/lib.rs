//! Kernel: container snapshots, net item diffs, and the open/close session flow.
//!
//! # Invariants
//! - Diffs only see the net change between two captures, never intermediate moves.
//! - `AccessLogRecord::from_diff` and `capture_diff` only produce a record when at
//!   least one item was added or removed. `AccessLogRecord::restore` is reserved
//!   for reloading stored entries, which may predate that rule.
//! - Records are fully formed at construction and never mutated afterwards.

pub mod record;
pub mod session;
pub mod snapshot;

pub use record::{AccessLogRecord, capture_diff};
pub use session::SessionTracker;
pub use snapshot::{ItemDelta, Snapshot, SnapshotDiff, diff};
