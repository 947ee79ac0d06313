//! Read side of the realtime store as the dashboard consumes it.
//!
//! Unknown locations and store failures never escape this layer: they are
//! logged and turned into empty results, so callers cannot tell "no data"
//! from "store unreachable".

use crate::analyzers::levels::{TrafficStatus, traffic_status};
use crate::detection::{Detection, LocationReading};
use crate::services::detection_store::{DetectionStore, Subscription};
use crate::services::locations::{Location, LocationInfo};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn DetectionStore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn DetectionStore>) -> Self {
        Self { store }
    }

    fn resolve(name: &str) -> Option<Location> {
        let location = Location::resolve(name);
        if location.is_none() {
            warn!(location = %name, "Location not found in catalog");
        }
        location
    }

    /// Location keys present in the store, or the catalog names when the
    /// store is unreachable or empty.
    #[tracing::instrument(skip(self))]
    pub async fn available_locations(&self) -> Vec<String> {
        match self.store.location_keys().await {
            Ok(keys) if !keys.is_empty() => keys,
            Ok(_) => Location::names(),
            Err(e) => {
                error!(error = %e, "Failed to list locations, using catalog");
                Location::names()
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn latest(&self, name: &str) -> Option<LocationReading> {
        let location = Self::resolve(name)?;
        match self.store.latest(location).await {
            Ok(reading) => reading,
            Err(e) => {
                error!(location = %location, error = %e, "Failed to fetch latest reading");
                None
            }
        }
    }

    /// Subscribes to the location's `latest` node. An unknown location gets a
    /// feed that ends immediately; a store failure delivers one `None`.
    #[tracing::instrument(skip(self))]
    pub async fn subscribe(&self, name: &str) -> Subscription {
        let Some(location) = Self::resolve(name) else {
            return Subscription::closed();
        };
        match self.store.subscribe_latest(location).await {
            Ok(sub) => sub,
            Err(e) => {
                error!(location = %location, error = %e, "Failed to subscribe to latest reading");
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.try_send(None);
                Subscription::new(rx, None)
            }
        }
    }

    /// Up to `limit` most-recent detections, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn detections(&self, name: &str, limit: usize) -> Vec<Detection> {
        let Some(location) = Self::resolve(name) else {
            return Vec::new();
        };
        match self.store.detections(location, limit).await {
            Ok(detections) => detections,
            Err(e) => {
                error!(location = %location, error = %e, "Failed to fetch detections");
                Vec::new()
            }
        }
    }

    pub fn config(name: &str) -> Option<&'static LocationInfo> {
        Location::resolve(name).map(Location::info)
    }

    pub fn traffic_status(vehicles: u32) -> TrafficStatus {
        traffic_status(vehicles)
    }
}
