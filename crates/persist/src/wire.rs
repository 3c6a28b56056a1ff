//! On-disk field layout of log and lock entries.
//!
//! Every field has a default so entries written by older or foreign tools
//! still load; see the per-field `default` attributes.

use crate::lock_store::LockRecord;
use chestward_common::{BlockPos, DEFAULT_DIMENSION, PlayerId, now_millis};
use chestward_kernel::AccessLogRecord;
use serde::{Deserialize, Serialize};

pub(crate) const LOGS_LIST: &str = "Logs";
pub(crate) const LOCKS_LIST: &str = "Locks";

fn default_dimension() -> String {
    DEFAULT_DIMENSION.to_string()
}

fn unknown_owner() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LogEntry {
    #[serde(rename = "PlayerName", default)]
    player_name: String,
    #[serde(rename = "X", default)]
    x: i32,
    #[serde(rename = "Y", default)]
    y: i32,
    #[serde(rename = "Z", default)]
    z: i32,
    #[serde(rename = "Dimension", default = "default_dimension")]
    dimension: String,
    #[serde(rename = "Timestamp", default)]
    timestamp: i64,
    #[serde(rename = "ItemsAdded", default)]
    items_added: Vec<String>,
    #[serde(rename = "ItemsRemoved", default)]
    items_removed: Vec<String>,
}

impl From<&AccessLogRecord> for LogEntry {
    fn from(record: &AccessLogRecord) -> Self {
        let pos = record.pos();
        Self {
            player_name: record.player_name().to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            dimension: record.dimension().to_string(),
            timestamp: record.timestamp_millis(),
            items_added: record.items_added().to_vec(),
            items_removed: record.items_removed().to_vec(),
        }
    }
}

impl From<LogEntry> for AccessLogRecord {
    fn from(entry: LogEntry) -> Self {
        AccessLogRecord::restore(
            entry.player_name,
            BlockPos::new(entry.x, entry.y, entry.z),
            entry.dimension,
            entry.timestamp,
            entry.items_added,
            entry.items_removed,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockEntry {
    #[serde(rename = "OwnerUUID", default)]
    owner_uuid: String,
    #[serde(rename = "OwnerName", default = "unknown_owner")]
    owner_name: String,
    #[serde(rename = "X", default)]
    x: i32,
    #[serde(rename = "Y", default)]
    y: i32,
    #[serde(rename = "Z", default)]
    z: i32,
    #[serde(rename = "Dimension", default = "default_dimension")]
    dimension: String,
    #[serde(rename = "LockTimestamp", default = "now_millis")]
    lock_timestamp: i64,
}

impl From<&LockRecord> for LockEntry {
    fn from(record: &LockRecord) -> Self {
        let pos = record.pos();
        Self {
            owner_uuid: record.owner_id().to_string(),
            owner_name: record.owner_name().to_string(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            dimension: record.dimension().to_string(),
            lock_timestamp: record.locked_at_millis(),
        }
    }
}

impl From<LockEntry> for LockRecord {
    /// An absent or unparseable owner id becomes a fresh random id: the lock
    /// survives but no player owns it, so only an admin can lift it.
    fn from(entry: LockEntry) -> Self {
        let owner_id = entry.owner_uuid.parse().unwrap_or_else(|_| {
            tracing::warn!(
                owner = %entry.owner_name,
                raw = %entry.owner_uuid,
                "lock entry has no usable owner id, assigning an orphan id"
            );
            PlayerId::new()
        });
        LockRecord::new(
            owner_id,
            entry.owner_name,
            BlockPos::new(entry.x, entry.y, entry.z),
            entry.dimension,
            entry.lock_timestamp,
        )
    }
}
