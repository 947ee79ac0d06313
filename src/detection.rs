//! Detection records as the ingestion pipeline writes them to the store.

use crate::analyzers::levels::{PedestrianLevel, TrafficLevel};
use crate::parser::parse_timestamp_key;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-class vehicle counts for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleBreakdown {
    pub cars: u32,
    pub motorcycles: u32,
    pub buses: u32,
    pub trucks: u32,
    pub bicycles: u32,
}

/// One sensor reading, stored both as a `detections/<key>` child and as the
/// location's `latest` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationReading {
    #[serde(default)]
    pub cars: u32,
    #[serde(default)]
    pub people: u32,
    /// ISO-8601 write time; informational only.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub traffic_level: TrafficLevel,
    #[serde(default)]
    pub pedestrian_level: PedestrianLevel,
    #[serde(default)]
    pub vehicle_breakdown: VehicleBreakdown,
}

/// A reading paired with its `YYYYMMDD_HHMMSS` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub timestamp_key: String,
    pub data: LocationReading,
}

impl Detection {
    pub fn new(timestamp_key: impl Into<String>, data: LocationReading) -> Self {
        Self {
            timestamp_key: timestamp_key.into(),
            data,
        }
    }

    /// Decoded key, or `None` when the key is malformed.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        match parse_timestamp_key(&self.timestamp_key) {
            Ok(at) => Some(at),
            Err(e) => {
                debug!(key = %self.timestamp_key, error = %e, "Dropping detection with bad key");
                None
            }
        }
    }
}

/// Turns a `detections` node into at most `limit` records, newest first.
///
/// Children whose body does not deserialize as a [`LocationReading`] are
/// skipped. Keys are ordered lexicographically, which for well-formed keys
/// is chronological.
pub fn detections_from_node(
    node: BTreeMap<String, serde_json::Value>,
    limit: usize,
) -> Vec<Detection> {
    node.into_iter()
        .rev()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(data) => Some(Detection::new(key, data)),
            Err(e) => {
                debug!(key = %key, error = %e, "Skipping undecodable detection body");
                None
            }
        })
        .take(limit)
        .collect()
}
