use crate::record::{AccessLogRecord, capture_diff};
use crate::snapshot::Snapshot;
use chestward_common::PlayerId;
use std::collections::HashMap;

#[derive(Debug)]
struct PendingOpen {
    player_name: String,
    snapshot: Snapshot,
}

/// Pairs each container open with its close, per player.
///
/// A player has at most one container open at a time; opening another
/// replaces the pending capture.
#[derive(Debug, Default)]
pub struct SessionTracker {
    open: HashMap<PlayerId, PendingOpen>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `snapshot` as the pending state for `player`.
    ///
    /// Returns the capture it replaced, if the previous open never closed.
    pub fn open(
        &mut self,
        player: PlayerId,
        player_name: impl Into<String>,
        snapshot: Snapshot,
    ) -> Option<Snapshot> {
        let player_name = player_name.into();
        tracing::debug!(
            player = %player_name,
            container = %snapshot.key(),
            items = snapshot.contents().len(),
            "container opened"
        );
        self.open
            .insert(
                player,
                PendingOpen {
                    player_name,
                    snapshot,
                },
            )
            .map(|prev| prev.snapshot)
    }

    /// Close the player's pending container with the contents seen on close.
    ///
    /// Returns a record ready to append, or `None` when nothing was pending
    /// or nothing changed.
    pub fn close<I, S>(
        &mut self,
        player: PlayerId,
        stacks: I,
        timestamp_millis: i64,
    ) -> Option<AccessLogRecord>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let Some(pending) = self.open.remove(&player) else {
            tracing::debug!(%player, "container closed without a pending open");
            return None;
        };
        let current = Snapshot::capture(
            pending.snapshot.pos(),
            pending.snapshot.dimension(),
            stacks,
        );
        capture_diff(
            &pending.snapshot,
            &current,
            &pending.player_name,
            timestamp_millis,
        )
    }

    /// Forget a pending open without logging, e.g. on disconnect.
    pub fn abandon(&mut self, player: PlayerId) -> bool {
        self.open.remove(&player).is_some()
    }

    pub fn is_open(&self, player: PlayerId) -> bool {
        self.open.contains_key(&player)
    }

    pub fn pending(&self, player: PlayerId) -> Option<&Snapshot> {
        self.open.get(&player).map(|p| &p.snapshot)
    }

    pub fn pending_count(&self) -> usize {
        self.open.len()
    }
}
