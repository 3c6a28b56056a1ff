use chestward_common::{BlockPos, ContainerKey};
use std::collections::BTreeMap;
use std::fmt;

/// Contents of a container at the moment it was captured.
///
/// Item names map to the summed count across all slots. Counts of zero are
/// never stored, so "absent" and "zero" compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pos: BlockPos,
    dimension: String,
    contents: BTreeMap<String, u32>,
}

impl Snapshot {
    /// Create a snapshot from already-aggregated contents.
    pub fn new(
        pos: BlockPos,
        dimension: impl Into<String>,
        mut contents: BTreeMap<String, u32>,
    ) -> Self {
        contents.retain(|_, count| *count > 0);
        Self {
            pos,
            dimension: dimension.into(),
            contents,
        }
    }

    /// Capture from raw slot stacks, merging stacks of the same item.
    pub fn capture<I, S>(pos: BlockPos, dimension: impl Into<String>, stacks: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut contents: BTreeMap<String, u32> = BTreeMap::new();
        for (item, count) in stacks {
            if count == 0 {
                continue;
            }
            let total = contents.entry(item.into()).or_insert(0);
            *total = total.saturating_add(count);
        }
        Self {
            pos,
            dimension: dimension.into(),
            contents,
        }
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

    pub fn contents(&self) -> &BTreeMap<String, u32> {
        &self.contents
    }

    /// Count held for `item`, zero when absent.
    pub fn count_of(&self, item: &str) -> u32 {
        self.contents.get(item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Net change of one item between two snapshots. `count` is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDelta {
    pub item: String,
    pub count: u32,
}

impl ItemDelta {
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}

impl fmt::Display for ItemDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.item, self.count)
    }
}

/// Added and removed items between two captures, each sorted by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<ItemDelta>,
    pub removed: Vec<ItemDelta>,
}

impl SnapshotDiff {
    /// True when nothing changed; callers treat this as "no event".
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute the net delta from `previous` to `current`.
///
/// Additions are items whose count grew, removals those whose count shrank.
/// Positions are not compared; pairing the right captures is the caller's job.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    SnapshotDiff {
        added: gains(&previous.contents, &current.contents),
        removed: gains(&current.contents, &previous.contents),
    }
}

/// Items in `to` whose count exceeds that in `from`.
fn gains(from: &BTreeMap<String, u32>, to: &BTreeMap<String, u32>) -> Vec<ItemDelta> {
    to.iter()
        .filter_map(|(item, &now)| {
            let before = from.get(item).copied().unwrap_or(0);
            (now > before).then(|| ItemDelta::new(item.clone(), now - before))
        })
        .collect()
}
