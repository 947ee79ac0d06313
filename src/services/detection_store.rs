//! Trait and handle types for a source of location readings.

use crate::detection::{Detection, LocationReading};
use crate::services::locations::Location;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Abstraction over the realtime store holding `locations/<key>/latest` and
/// `locations/<key>/detections`.
#[async_trait::async_trait]
pub trait DetectionStore: Send + Sync {
    /// Child keys under `locations/`.
    async fn location_keys(&self) -> Result<Vec<String>>;

    /// The location's `latest` node, if present.
    async fn latest(&self, location: Location) -> Result<Option<LocationReading>>;

    /// At most `limit` most-recent detections, newest first.
    async fn detections(&self, location: Location, limit: usize) -> Result<Vec<Detection>>;

    /// Starts delivering the `latest` node on every change.
    async fn subscribe_latest(&self, location: Location) -> Result<Subscription>;
}

/// Live feed of a location's `latest` node.
///
/// Each update is `Some(reading)`, or `None` when the node is absent or the
/// upstream listener failed. The listener stops when the handle is dropped
/// or [`unsubscribe`](Subscription::unsubscribe) is called.
pub struct Subscription {
    updates: mpsc::Receiver<Option<LocationReading>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(updates: mpsc::Receiver<Option<LocationReading>>, task: Option<JoinHandle<()>>) -> Self {
        Self { updates, task }
    }

    /// A subscription that never delivers anything.
    pub fn closed() -> Self {
        let (_tx, rx) = mpsc::channel(1);
        Self::new(rx, None)
    }

    /// Waits for the next update; `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Option<LocationReading>> {
        self.updates.recv().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_subscription_ends_immediately() {
        let mut sub = Subscription::closed();
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_aborts_listener() {
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(async move {
            loop {
                if tx.send(None).await.is_err() {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        });
        let abort = task.abort_handle();

        let mut sub = Subscription::new(rx, Some(task));
        assert_eq!(sub.next().await, Some(None));
        sub.unsubscribe();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(abort.is_finished());
    }
}
