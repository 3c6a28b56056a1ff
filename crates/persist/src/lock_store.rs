use crate::codec::{read_list, write_list};
use crate::error::StoreError;
use crate::wire::{LOCKS_LIST, LockEntry};
use chestward_common::{BlockPos, ContainerKey, PlayerId, format_millis, now_millis};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Exclusive ownership of one container.
///
/// `owner_name` is for display only; ownership is decided by `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    owner_id: PlayerId,
    owner_name: String,
    pos: BlockPos,
    dimension: String,
    locked_at_millis: i64,
}

impl LockRecord {
    pub fn new(
        owner_id: PlayerId,
        owner_name: impl Into<String>,
        pos: BlockPos,
        dimension: impl Into<String>,
        locked_at_millis: i64,
    ) -> Self {
        Self {
            owner_id,
            owner_name: owner_name.into(),
            pos,
            dimension: dimension.into(),
            locked_at_millis,
        }
    }

    pub fn owner_id(&self) -> PlayerId {
        self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn locked_at_millis(&self) -> i64 {
        self.locked_at_millis
    }

    pub fn key(&self) -> ContainerKey {
        ContainerKey::new(self.pos, self.dimension.clone())
    }

    pub fn is_owner(&self, player: PlayerId) -> bool {
        self.owner_id == player
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}), locked {}",
            self.owner_name,
            self.pos,
            self.dimension,
            format_millis(self.locked_at_millis)
        )
    }
}

/// How many locks one owner may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockQuota {
    #[default]
    Unlimited,
    Max(usize),
}

impl LockQuota {
    /// Negative limits mean unlimited; zero forbids any new lock.
    pub fn from_limit(limit: i32) -> Self {
        usize::try_from(limit).map_or(Self::Unlimited, Self::Max)
    }
}

/// Why a lock was not granted. These are outcomes to show the player, not failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockRejected {
    #[error("This container is already locked")]
    AlreadyLocked,
    #[error("You have reached the maximum number of locks ({limit})")]
    QuotaExceeded { limit: usize },
    /// Returned by callers enforcing server settings; the store never yields it.
    #[error("Chest locking is disabled")]
    Disabled,
}

/// Container key to lock table, mirrored to a single file.
///
/// The store is policy-agnostic: it enforces the one-lock-per-key invariant
/// and the quota it is handed, nothing about permissions.
#[derive(Debug)]
pub struct LockStore {
    path: PathBuf,
    locks: BTreeMap<ContainerKey, LockRecord>,
}

impl LockStore {
    /// Open the table at `path`, starting empty if the file is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let locks = load(&path);
        Self { path, locks }
    }

    /// Lock `key` for `owner`, stamped with the current time.
    pub fn lock(
        &mut self,
        owner: PlayerId,
        owner_name: impl Into<String>,
        key: ContainerKey,
        quota: LockQuota,
    ) -> Result<&LockRecord, LockRejected> {
        if self.locks.contains_key(&key) {
            return Err(LockRejected::AlreadyLocked);
        }
        if let LockQuota::Max(limit) = quota {
            if self.count_of(owner) >= limit {
                return Err(LockRejected::QuotaExceeded { limit });
            }
        }

        let record = LockRecord::new(
            owner,
            owner_name,
            key.pos,
            key.dimension.clone(),
            now_millis(),
        );
        tracing::info!(owner = record.owner_name(), container = %key, "container locked");
        self.insert_new(key.clone(), record);
        self.persist();
        Ok(&self.locks[&key])
    }

    /// Remove the lock on `key`, returning it if there was one.
    pub fn unlock(&mut self, key: &ContainerKey) -> Option<LockRecord> {
        let removed = self.locks.remove(key)?;
        self.persist();
        tracing::info!(owner = removed.owner_name(), container = %key, "container unlocked");
        Some(removed)
    }

    pub fn is_locked(&self, key: &ContainerKey) -> bool {
        self.locks.contains_key(key)
    }

    pub fn lock_of(&self, key: &ContainerKey) -> Option<&LockRecord> {
        self.locks.get(key)
    }

    /// Admins always pass; otherwise the container must be unlocked or owned by `requester`.
    pub fn can_access(&self, requester: PlayerId, is_admin: bool, key: &ContainerKey) -> bool {
        is_admin
            || self
                .locks
                .get(key)
                .is_none_or(|lock| lock.is_owner(requester))
    }

    /// Locks held by `owner`, ordered by container key.
    pub fn locks_of(&self, owner: PlayerId) -> Vec<&LockRecord> {
        self.locks.values().filter(|l| l.is_owner(owner)).collect()
    }

    pub fn count_of(&self, owner: PlayerId) -> usize {
        self.locks.values().filter(|l| l.is_owner(owner)).count()
    }

    /// Every lock, ordered by container key.
    pub fn all_locks(&self) -> Vec<&LockRecord> {
        self.locks.values().collect()
    }

    pub fn count(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state now, surfacing any failure.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.save()
    }

    fn insert_new(&mut self, key: ContainerKey, record: LockRecord) {
        assert!(
            !self.locks.contains_key(&key),
            "lock table already holds {key}; inserts must go through lock()"
        );
        self.locks.insert(key, record);
    }

    fn save(&self) -> Result<(), StoreError> {
        let _span = tracing::debug_span!("save_lock_table", locks = self.locks.len()).entered();
        let entries: Vec<LockEntry> = self.locks.values().map(LockEntry::from).collect();
        write_list(&self.path, LOCKS_LIST, &entries)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save lock table");
        }
    }
}

fn load(path: &Path) -> BTreeMap<ContainerKey, LockRecord> {
    let mut locks = BTreeMap::new();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no lock table found, starting fresh");
        return locks;
    }
    match read_list::<LockEntry>(path, LOCKS_LIST) {
        Ok(read) => {
            for record in read.entries.into_iter().map(LockRecord::from) {
                let key = record.key();
                if let Some(replaced) = locks.insert(key.clone(), record) {
                    tracing::warn!(
                        container = %key,
                        dropped_owner = replaced.owner_name(),
                        "duplicate lock entry in file, keeping the later one"
                    );
                }
            }
            tracing::info!(
                path = %path.display(),
                loaded = locks.len(),
                skipped = read.skipped,
                "loaded lock table"
            );
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load lock table, starting empty");
        }
    }
    locks
}
