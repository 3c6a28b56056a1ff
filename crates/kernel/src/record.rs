use crate::snapshot::{Snapshot, SnapshotDiff, diff};
use chestward_common::{BlockPos, ContainerKey, format_millis};
use std::fmt;

/// One audited container access: who, where, when, and what changed.
///
/// Item lists hold `"name xCount"` strings in the order the diff produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogRecord {
    player_name: String,
    pos: BlockPos,
    dimension: String,
    timestamp_millis: i64,
    items_added: Vec<String>,
    items_removed: Vec<String>,
}

impl AccessLogRecord {
    /// Build a record from a diff. Returns `None` if the diff is empty.
    pub fn from_diff(
        player_name: impl Into<String>,
        pos: BlockPos,
        dimension: impl Into<String>,
        timestamp_millis: i64,
        delta: &SnapshotDiff,
    ) -> Option<Self> {
        if delta.is_empty() {
            return None;
        }
        Some(Self {
            player_name: player_name.into(),
            pos,
            dimension: dimension.into(),
            timestamp_millis,
            items_added: delta.added.iter().map(ToString::to_string).collect(),
            items_removed: delta.removed.iter().map(ToString::to_string).collect(),
        })
    }

    /// Rebuild a record exactly as it was persisted.
    ///
    /// Reserved for the persistence layer reloading stored entries. Unlike
    /// [`AccessLogRecord::from_diff`] this accepts empty item lists, since a
    /// stored entry with missing fields is still kept. New accesses must go
    /// through `from_diff` or [`capture_diff`].
    #[doc(hidden)]
    pub fn restore(
        player_name: String,
        pos: BlockPos,
        dimension: String,
        timestamp_millis: i64,
        items_added: Vec<String>,
        items_removed: Vec<String>,
    ) -> Self {
        Self {
            player_name,
            pos,
            dimension,
            timestamp_millis,
            items_added,
            items_removed,
        }
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn key(&self) -> ContainerKey {
        ContainerKey::new(self.pos, self.dimension.clone())
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    pub fn items_added(&self) -> &[String] {
        &self.items_added
    }

    pub fn items_removed(&self) -> &[String] {
        &self.items_removed
    }
}

impl fmt::Display for AccessLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} @ {} ({})",
            format_millis(self.timestamp_millis),
            self.player_name,
            self.pos,
            self.dimension
        )?;
        if !self.items_added.is_empty() {
            write!(f, "\n  +: {}", self.items_added.join(", "))?;
        }
        if !self.items_removed.is_empty() {
            write!(f, "\n  -: {}", self.items_removed.join(", "))?;
        }
        Ok(())
    }
}

/// Diff a pending open capture against the closing capture.
///
/// The record is placed at the pending snapshot's position; the closing
/// capture only contributes contents.
pub fn capture_diff(
    pending: &Snapshot,
    current: &Snapshot,
    player_name: &str,
    timestamp_millis: i64,
) -> Option<AccessLogRecord> {
    if pending.key() != current.key() {
        tracing::warn!(
            pending = %pending.key(),
            current = %current.key(),
            "closing capture belongs to a different container"
        );
    }

    let delta = diff(pending, current);
    tracing::debug!(
        player = player_name,
        container = %pending.key(),
        added = delta.added.len(),
        removed = delta.removed.len(),
        "container diff computed"
    );

    AccessLogRecord::from_diff(
        player_name,
        pending.pos(),
        pending.dimension(),
        timestamp_millis,
        &delta,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERWORLD: &str = "minecraft:overworld";

    fn snap_at(pos: BlockPos, items: &[(&str, u32)]) -> Snapshot {
        Snapshot::capture(pos, OVERWORLD, items.iter().map(|(n, c)| (*n, *c)))
    }

    #[test]
    fn changed_contents_produce_record() {
        let pos = BlockPos::new(10, 64, 20);
        let before = snap_at(pos, &[("stone", 5)]);
        let after = snap_at(pos, &[("stone", 3), ("torch", 2)]);

        let record = capture_diff(&before, &after, "Alex", 1_000).unwrap();
        assert_eq!(record.player_name(), "Alex");
        assert_eq!(record.pos(), pos);
        assert_eq!(record.dimension(), OVERWORLD);
        assert_eq!(record.timestamp_millis(), 1_000);
        assert_eq!(record.items_added(), ["torch x2"]);
        assert_eq!(record.items_removed(), ["stone x2"]);
    }

    #[test]
    fn unchanged_contents_produce_nothing() {
        let pos = BlockPos::new(0, 0, 0);
        let before = snap_at(pos, &[("stone", 5)]);
        let after = snap_at(pos, &[("stone", 3), ("stone", 2)]);
        assert!(capture_diff(&before, &after, "Alex", 1).is_none());
    }

    #[test]
    fn empty_diff_builds_no_record() {
        let delta = SnapshotDiff::default();
        assert!(AccessLogRecord::from_diff("Alex", BlockPos::default(), OVERWORLD, 1, &delta).is_none());
    }

    #[test]
    fn record_uses_pending_position() {
        let before = snap_at(BlockPos::new(1, 2, 3), &[]);
        let after = snap_at(BlockPos::new(9, 9, 9), &[("torch", 1)]);
        let record = capture_diff(&before, &after, "Alex", 1).unwrap();
        assert_eq!(record.pos(), BlockPos::new(1, 2, 3));
    }

    #[test]
    fn display_lists_both_sides() {
        let record = AccessLogRecord::restore(
            "Alex".into(),
            BlockPos::new(1, 2, 3),
            OVERWORLD.into(),
            0,
            vec!["torch x2".into()],
            vec!["stone x2".into(), "dirt x1".into()],
        );
        let text = record.to_string();
        assert!(text.contains(" - Alex @ X: 1, Y: 2, Z: 3 (minecraft:overworld)"));
        assert!(text.ends_with("\n  +: torch x2\n  -: stone x2, dirt x1"));
    }

    #[test]
    fn display_omits_empty_sides() {
        let record = AccessLogRecord::restore(
            "Alex".into(),
            BlockPos::default(),
            OVERWORLD.into(),
            0,
            Vec::new(),
            vec!["stone x1".into()],
        );
        let text = record.to_string();
        assert!(!text.contains("+:"));
        assert!(text.contains("-: stone x1"));
    }
}
