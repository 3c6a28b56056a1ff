use crate::codec::{read_list, write_list};
use crate::error::StoreError;
use crate::wire::{LOGS_LIST, LogEntry};
use chestward_common::{BlockPos, ContainerKey};
use chestward_kernel::AccessLogRecord;
use std::path::{Path, PathBuf};

/// Append-only, insertion-ordered access log mirrored to a single file.
///
/// Every mutation rewrites the whole file synchronously. Write failures are
/// logged and the in-memory log stays authoritative until the next write.
#[derive(Debug)]
pub struct AccessLogStore {
    path: PathBuf,
    records: Vec<AccessLogRecord>,
}

impl AccessLogStore {
    /// Open the log at `path`, starting empty if the file is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = load(&path);
        Self { path, records }
    }

    /// Append a record. Identical records are all kept.
    pub fn append(&mut self, record: AccessLogRecord) {
        tracing::debug!(
            player = record.player_name(),
            container = %record.key(),
            "appending access record"
        );
        self.records.push(record);
        self.persist();
    }

    /// Records whose player name matches `name`, ignoring case.
    pub fn query_by_player(&self, name: &str) -> Vec<&AccessLogRecord> {
        let wanted = name.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.player_name().to_lowercase() == wanted)
            .collect()
    }

    /// Records for exactly this container.
    pub fn query_by_position(&self, key: &ContainerKey) -> Vec<&AccessLogRecord> {
        self.records
            .iter()
            .filter(|r| r.pos() == key.pos && r.dimension() == key.dimension)
            .collect()
    }

    /// Look for a logged container around someone standing at `feet`.
    ///
    /// Probes the block below, the block itself, then north, south, east and
    /// west. Returns the first position that has records.
    pub fn query_around(
        &self,
        feet: BlockPos,
        dimension: &str,
    ) -> Option<(BlockPos, Vec<&AccessLogRecord>)> {
        [
            feet.below(),
            feet,
            feet.north(),
            feet.south(),
            feet.east(),
            feet.west(),
        ]
        .into_iter()
        .find_map(|pos| {
            let found = self.query_by_position(&ContainerKey::new(pos, dimension));
            (!found.is_empty()).then_some((pos, found))
        })
    }

    /// The `count` most recent records, oldest first.
    pub fn query_recent(&self, count: usize) -> &[AccessLogRecord] {
        let start = self.records.len().saturating_sub(count);
        &self.records[start..]
    }

    /// Drop every record with a timestamp before `cutoff_millis`.
    ///
    /// Returns how many were removed. The file is rewritten either way.
    pub fn prune_older_than(&mut self, cutoff_millis: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.timestamp_millis() >= cutoff_millis);
        let removed = before - self.records.len();
        self.persist();
        tracing::info!(cutoff_millis, removed, "pruned old access records");
        removed
    }

    /// Remove every record, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.persist();
        tracing::info!(removed, "cleared all access records");
        removed
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record in insertion order.
    pub fn all(&self) -> &[AccessLogRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state now, surfacing any failure.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let _span = tracing::debug_span!("save_access_log", records = self.records.len()).entered();
        let entries: Vec<LogEntry> = self.records.iter().map(LogEntry::from).collect();
        write_list(&self.path, LOGS_LIST, &entries)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save access log");
        }
    }
}

fn load(path: &Path) -> Vec<AccessLogRecord> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no access log found, starting fresh");
        return Vec::new();
    }
    match read_list::<LogEntry>(path, LOGS_LIST) {
        Ok(read) => {
            let records: Vec<AccessLogRecord> =
                read.entries.into_iter().map(AccessLogRecord::from).collect();
            tracing::info!(
                path = %path.display(),
                loaded = records.len(),
                skipped = read.skipped,
                "loaded access log"
            );
            records
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load access log, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chestward_kernel::{Snapshot, capture_diff};

    const OVERWORLD: &str = "minecraft:overworld";

    fn record(player: &str, pos: BlockPos, timestamp: i64) -> AccessLogRecord {
        AccessLogRecord::restore(
            player.into(),
            pos,
            OVERWORLD.into(),
            timestamp,
            vec![format!("stone x{timestamp}")],
            Vec::new(),
        )
    }

    fn store_with(dir: &Path, records: &[AccessLogRecord]) -> AccessLogStore {
        let mut store = AccessLogStore::open(dir.join("chest_logs.dat"));
        for r in records {
            store.append(r.clone());
        }
        store
    }

    #[test]
    fn open_missing_file_starts_empty_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccessLogStore::open(tmp.path().join("chest_logs.dat"));
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn append_keeps_duplicates_and_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let r = record("Alex", BlockPos::new(1, 2, 3), 10);
        let store = store_with(tmp.path(), &[r.clone(), r.clone()]);
        assert_eq!(store.count(), 2);
        assert!(store.path().exists());
    }

    #[test]
    fn query_by_player_ignores_case_and_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let pos = BlockPos::new(0, 0, 0);
        let store = store_with(
            tmp.path(),
            &[
                record("Alex", pos, 1),
                record("Sam", pos, 2),
                record("ALEX", pos, 3),
                record("Alexander", pos, 4),
            ],
        );
        let found: Vec<i64> = store
            .query_by_player("alex")
            .iter()
            .map(|r| r.timestamp_millis())
            .collect();
        assert_eq!(found, vec![1, 3]);
        assert!(store.query_by_player("nobody").is_empty());
    }

    #[test]
    fn query_by_position_matches_dimension_too() {
        let tmp = tempfile::tempdir().unwrap();
        let pos = BlockPos::new(10, 64, 20);
        let nether = AccessLogRecord::restore(
            "Alex".into(),
            pos,
            "minecraft:the_nether".into(),
            5,
            vec!["torch x1".into()],
            Vec::new(),
        );
        let store = store_with(
            tmp.path(),
            &[record("Alex", pos, 1), nether, record("Alex", BlockPos::new(10, 64, 21), 2)],
        );
        let found = store.query_by_position(&ContainerKey::new(pos, OVERWORLD));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].timestamp_millis(), 1);
    }

    #[test]
    fn query_around_prefers_block_below() {
        let tmp = tempfile::tempdir().unwrap();
        let feet = BlockPos::new(5, 65, 5);
        let store = store_with(
            tmp.path(),
            &[record("Alex", feet.east(), 1), record("Sam", feet.below(), 2)],
        );
        let (pos, found) = store.query_around(feet, OVERWORLD).unwrap();
        assert_eq!(pos, feet.below());
        assert_eq!(found[0].player_name(), "Sam");

        let (pos, found) = store.query_around(feet.east().east(), OVERWORLD).unwrap();
        assert_eq!(pos, feet.east());
        assert_eq!(found[0].player_name(), "Alex");
        assert!(store.query_around(BlockPos::new(100, 0, 100), OVERWORLD).is_none());
    }

    #[test]
    fn query_recent_returns_tail_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let pos = BlockPos::default();
        let records: Vec<_> = (1..=5).map(|t| record("Alex", pos, t)).collect();
        let store = store_with(tmp.path(), &records);

        let stamps = |rs: &[AccessLogRecord]| rs.iter().map(|r| r.timestamp_millis()).collect::<Vec<_>>();
        assert_eq!(stamps(store.query_recent(2)), vec![4, 5]);
        assert_eq!(stamps(store.query_recent(50)), vec![1, 2, 3, 4, 5]);
        assert!(store.query_recent(0).is_empty());
    }

    #[test]
    fn prune_removes_only_older_records() {
        let tmp = tempfile::tempdir().unwrap();
        let pos = BlockPos::default();
        let records: Vec<_> = [5, 1, 9, 3, 7].map(|t| record("Alex", pos, t)).to_vec();
        let mut store = store_with(tmp.path(), &records);

        assert_eq!(store.prune_older_than(5), 2);
        let left: Vec<i64> = store.all().iter().map(|r| r.timestamp_millis()).collect();
        assert_eq!(left, vec![5, 9, 7]);

        let reopened = AccessLogStore::open(store.path());
        assert_eq!(reopened.count(), 3);
    }

    #[test]
    fn clear_empties_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_with(tmp.path(), &[record("Alex", BlockPos::default(), 1)]);
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
        assert!(AccessLogStore::open(store.path()).is_empty());
    }

    #[test]
    fn reload_is_element_wise_equal() {
        let tmp = tempfile::tempdir().unwrap();
        let pos = BlockPos::new(-4, 12, 99);
        let before = Snapshot::capture(pos, OVERWORLD, [("stone", 5)]);
        let after = Snapshot::capture(pos, OVERWORLD, [("stone", 3), ("torch", 2)]);
        let diffed = capture_diff(&before, &after, "Alex", 1_700_000_000_000).unwrap();

        let records = vec![diffed, record("Sam", pos, 2), record("Alex", pos, 3)];
        let store = store_with(tmp.path(), &records);

        let reopened = AccessLogStore::open(store.path());
        assert_eq!(reopened.all(), records.as_slice());
    }

    #[test]
    fn corrupt_file_loads_empty_and_recovers_on_write() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chest_logs.dat");
        std::fs::write(&path, b"garbage").unwrap();

        let mut store = AccessLogStore::open(&path);
        assert!(store.is_empty());
        store.append(record("Alex", BlockPos::default(), 1));
        assert_eq!(AccessLogStore::open(&path).count(), 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        use ciborium::Value;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chest_logs.dat");
        let sparse = Value::Map(vec![(
            Value::Text("ItemsAdded".into()),
            Value::Array(vec![Value::Text("torch x1".into())]),
        )]);
        write_list(&path, LOGS_LIST, &[sparse]).unwrap();

        let store = AccessLogStore::open(&path);
        let r = &store.all()[0];
        assert_eq!(r.player_name(), "");
        assert_eq!(r.pos(), BlockPos::new(0, 0, 0));
        assert_eq!(r.dimension(), OVERWORLD);
        assert_eq!(r.timestamp_millis(), 0);
        assert_eq!(r.items_added(), ["torch x1"]);
        assert!(r.items_removed().is_empty());
    }

    #[test]
    fn write_failure_keeps_memory_state() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = tmp.path().join("chest_logs.dat");
        std::fs::create_dir(&path).unwrap();

        let mut store = AccessLogStore::open(&path);
        store.append(record("Alex", BlockPos::default(), 1));
        assert_eq!(store.count(), 1);
        assert!(store.flush().is_err());
    }
}
