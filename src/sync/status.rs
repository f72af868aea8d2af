//! SyncStatus: the user-facing state machine driven by the sync tick.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    Offline,
    OfflinePendingPush,
    WaitingToSync,
    Pulling,
    Pushing,
    OnlineButSyncFailed,
    OnlineAndSynced,
}

/// Publishes the current status to whoever is watching (a CLI status line,
/// a future UI). `watch` fits better than `broadcast` here: subscribers
/// only ever care about the latest value, not every transition.
pub struct StatusPublisher {
    tx: watch::Sender<SyncStatus>,
}

impl StatusPublisher {
    pub fn new(initial: SyncStatus) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn publish(&self, status: SyncStatus) {
        let _ = self.tx.send(status);
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SyncStatus {
        *self.tx.borrow()
    }
}
