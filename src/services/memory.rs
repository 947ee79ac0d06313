//! In-process [`DetectionStore`] backed by a Realtime Database JSON export.
//!
//! Used for offline runs against a snapshot file and as the store behind
//! service tests.

use crate::detection::{Detection, LocationReading, detections_from_node};
use crate::services::detection_store::{DetectionStore, Subscription};
use crate::services::locations::Location;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
struct LocationNode {
    #[serde(default)]
    latest: Option<LocationReading>,
    #[serde(default)]
    detections: BTreeMap<String, serde_json::Value>,
}

pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, LocationNode>>,
    updates: broadcast::Sender<(String, Option<LocationReading>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_nodes(BTreeMap::new())
    }

    fn with_nodes(nodes: BTreeMap<String, LocationNode>) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            nodes: RwLock::new(nodes),
            updates,
        }
    }

    /// Parses an export of either the whole database (`{"locations": {...}}`)
    /// or of the `locations` node itself.
    pub fn from_export(json: &str) -> Result<Self> {
        let mut root: serde_json::Value = serde_json::from_str(json)?;
        let locations = if root.get("locations").is_some() {
            root["locations"].take()
        } else {
            root
        };
        let nodes: BTreeMap<String, LocationNode> = if locations.is_null() {
            BTreeMap::new()
        } else {
            serde_json::from_value(locations).context("export is not a map of locations")?
        };
        Ok(Self::with_nodes(nodes))
    }

    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read snapshot {path}"))?;
        Self::from_export(&content).with_context(|| format!("cannot parse snapshot {path}"))
    }

    /// Writes a detection and makes it the location's `latest`, the way the
    /// ingestion pipeline does.
    pub async fn record(&self, store_key: &str, timestamp_key: &str, reading: LocationReading) {
        let mut nodes = self.nodes.write().await;
        let node = nodes.entry(store_key.to_string()).or_default();
        match serde_json::to_value(&reading) {
            Ok(value) => {
                node.detections.insert(timestamp_key.to_string(), value);
            }
            Err(e) => warn!(error = %e, "Failed to encode detection"),
        }
        node.latest = Some(reading.clone());
        drop(nodes);

        let _ = self.updates.send((store_key.to_string(), Some(reading)));
    }

    /// Replaces (or with `None`, removes) the location's `latest` node.
    pub async fn set_latest(&self, store_key: &str, reading: Option<LocationReading>) {
        self.nodes
            .write()
            .await
            .entry(store_key.to_string())
            .or_default()
            .latest = reading.clone();
        let _ = self.updates.send((store_key.to_string(), reading));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DetectionStore for MemoryStore {
    async fn location_keys(&self) -> Result<Vec<String>> {
        Ok(self.nodes.read().await.keys().cloned().collect())
    }

    async fn latest(&self, location: Location) -> Result<Option<LocationReading>> {
        Ok(self
            .nodes
            .read()
            .await
            .get(location.store_key())
            .and_then(|n| n.latest.clone()))
    }

    async fn detections(&self, location: Location, limit: usize) -> Result<Vec<Detection>> {
        let nodes = self.nodes.read().await;
        let Some(node) = nodes.get(location.store_key()) else {
            return Ok(Vec::new());
        };
        Ok(detections_from_node(node.detections.clone(), limit))
    }

    async fn subscribe_latest(&self, location: Location) -> Result<Subscription> {
        let key = location.store_key().to_string();
        // subscribe before reading so no change slips between the two
        let mut changes = self.updates.subscribe();
        let initial = self.latest(location).await?;
        let (tx, rx) = mpsc::channel(16);

        let task = tokio::spawn(async move {
            if tx.send(initial).await.is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok((changed, reading)) if changed == key => {
                        if tx.send(reading).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(location = %key, skipped, "Subscriber lagged behind updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(rx, Some(task)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "locations": {
            "Canmore Alberta": {
                "latest": {"cars": 3, "people": 1, "traffic_level": "LOW", "pedestrian_level": "LOW"},
                "detections": {
                    "20240101_080000": {"cars": 10, "people": 2},
                    "20240101_090000": {"cars": 20, "people": 4}
                }
            },
            "Bangkok Thailand": {}
        }
    }"#;

    #[tokio::test]
    async fn test_from_export_reads_nodes() {
        let store = MemoryStore::from_export(EXPORT).unwrap();

        let keys = store.location_keys().await.unwrap();
        assert_eq!(keys, vec!["Bangkok Thailand", "Canmore Alberta"]);

        let latest = store.latest(Location::Canmore).await.unwrap().unwrap();
        assert_eq!(latest.cars, 3);

        let detections = store.detections(Location::Canmore, 10).await.unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].timestamp_key, "20240101_090000");

        assert!(store.detections(Location::KohSamui, 10).await.unwrap().is_empty());
        assert!(store.latest(Location::Bangkok).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_export_accepts_locations_node() {
        let store = MemoryStore::from_export(r#"{"4 Corners Downtown": {"detections": {}}}"#).unwrap();
        assert_eq!(store.location_keys().await.unwrap(), vec!["4 Corners Downtown"]);
    }

    #[tokio::test]
    async fn test_subscription_gets_initial_then_changes() {
        let store = MemoryStore::new();
        let first = LocationReading {
            cars: 1,
            ..Default::default()
        };
        store.set_latest("Canmore Alberta", Some(first.clone())).await;

        let mut sub = store.subscribe_latest(Location::Canmore).await.unwrap();
        assert_eq!(sub.next().await, Some(Some(first)));

        let second = LocationReading {
            cars: 9,
            ..Default::default()
        };
        store.record("Bangkok Thailand", "20240101_080000", LocationReading::default()).await;
        store.record("Canmore Alberta", "20240101_080000", second.clone()).await;
        assert_eq!(sub.next().await, Some(Some(second)));

        store.set_latest("Canmore Alberta", None).await;
        assert_eq!(sub.next().await, Some(None));
    }
}
