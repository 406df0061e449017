//! Publication of the current dashboard snapshot.

use pulse_core::types::DashboardSnapshot;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub type SnapshotReceiver = watch::Receiver<Option<Arc<DashboardSnapshot>>>;

/// Holds the one authoritative snapshot.
///
/// Snapshots are immutable; publishing swaps the whole reference, so a
/// reader sees either the previous snapshot or the new one. `None` until
/// the first successful cycle.
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Arc<DashboardSnapshot>>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: DashboardSnapshot) -> Arc<DashboardSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(Some(Arc::clone(&snapshot)));
        debug!(
            cycle = snapshot.cycle(),
            symbols = snapshot.len(),
            subscribers = self.tx.receiver_count(),
            "snapshot published"
        );
        snapshot
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Option<Arc<DashboardSnapshot>> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn snapshot(cycle: u64) -> DashboardSnapshot {
        DashboardSnapshot::new(cycle, Utc::now(), BTreeMap::new(), Vec::new())
    }

    #[test]
    fn test_empty_until_first_publish() {
        let publisher = SnapshotPublisher::new();
        assert!(publisher.current().is_none());

        publisher.publish(snapshot(1));
        assert_eq!(publisher.current().unwrap().cycle(), 1);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let publisher = SnapshotPublisher::new();
        publisher.publish(snapshot(1));
        let held = publisher.current().unwrap();

        publisher.publish(snapshot(2));

        assert_eq!(held.cycle(), 1);
        assert_eq!(publisher.current().unwrap().cycle(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let publisher = SnapshotPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish(snapshot(7));
        rx.changed().await.unwrap();

        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.cycle(), 7);
    }
}
