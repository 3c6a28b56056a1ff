use crate::config::GuardConfig;
use chestward_common::{ContainerKey, PlayerId};
use chestward_persist::{LockRecord, LockRejected, LockStore};
use std::fmt;

/// Whether a player may open or use a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionVerdict {
    Allowed,
    Denied { owner_name: String },
}

impl InteractionVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for InteractionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "Access allowed"),
            Self::Denied { .. } => write!(f, "This container is locked!"),
        }
    }
}

/// Outcome of a player breaking a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalVerdict {
    /// No lock involved.
    Allowed,
    /// Someone else's lock; the break must be cancelled.
    Denied { owner_name: String },
    /// The owner broke their own container and the lock went with it.
    ReleasedByOwner,
    /// An admin broke a locked container and the lock went with it.
    ReleasedByAdmin { owner_name: String },
}

impl RemovalVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied { .. })
    }

    /// Message to show the breaking player, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::Denied { .. } => {
                Some("This container is locked and you cannot break it!".to_string())
            }
            Self::ReleasedByOwner => {
                Some("You broke your locked container. The lock has been removed.".to_string())
            }
            Self::ReleasedByAdmin { owner_name } => Some(format!(
                "Admin: Broke locked container owned by {owner_name}"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnlockRejected {
    #[error("This container is not locked")]
    NotLocked,
    #[error("You don't own this lock")]
    NotOwner { owner_name: String },
}

/// Decide whether `requester` may use the container at `key`.
pub fn check_interaction(
    store: &LockStore,
    config: &GuardConfig,
    requester: PlayerId,
    is_admin: bool,
    key: &ContainerKey,
) -> InteractionVerdict {
    if !config.enable_locking || store.can_access(requester, is_admin, key) {
        return InteractionVerdict::Allowed;
    }
    let owner_name = store
        .lock_of(key)
        .map(|lock| lock.owner_name().to_string())
        .unwrap_or_default();
    tracing::debug!(%requester, container = %key, owner = %owner_name, "interaction denied by lock");
    InteractionVerdict::Denied { owner_name }
}

/// Decide whether `requester` may break the container at `key`.
///
/// Allowed breaks of a locked container remove the lock, since the container
/// it protected is gone.
pub fn check_removal(
    store: &mut LockStore,
    config: &GuardConfig,
    requester: PlayerId,
    is_admin: bool,
    key: &ContainerKey,
) -> RemovalVerdict {
    if !config.enable_locking {
        return RemovalVerdict::Allowed;
    }
    let Some(lock) = store.lock_of(key) else {
        return RemovalVerdict::Allowed;
    };
    let owner_name = lock.owner_name().to_string();

    if !store.can_access(requester, is_admin, key) {
        tracing::debug!(%requester, container = %key, owner = %owner_name, "removal denied by lock");
        return RemovalVerdict::Denied { owner_name };
    }

    store.unlock(key);
    if is_admin {
        RemovalVerdict::ReleasedByAdmin { owner_name }
    } else {
        RemovalVerdict::ReleasedByOwner
    }
}

/// Lock `key` for `owner` under the configured switch and quota.
pub fn request_lock<'s>(
    store: &'s mut LockStore,
    config: &GuardConfig,
    owner: PlayerId,
    owner_name: &str,
    key: ContainerKey,
) -> Result<&'s LockRecord, LockRejected> {
    if !config.enable_locking {
        return Err(LockRejected::Disabled);
    }
    store.lock(owner, owner_name, key, config.lock_quota())
}

/// Lift the lock on `key` if `requester` owns it or is an admin.
pub fn request_unlock(
    store: &mut LockStore,
    requester: PlayerId,
    is_admin: bool,
    key: &ContainerKey,
) -> Result<LockRecord, UnlockRejected> {
    let lock = store.lock_of(key).ok_or(UnlockRejected::NotLocked)?;
    if !is_admin && !lock.is_owner(requester) {
        return Err(UnlockRejected::NotOwner {
            owner_name: lock.owner_name().to_string(),
        });
    }
    store.unlock(key).ok_or(UnlockRejected::NotLocked)
}
