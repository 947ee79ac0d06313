use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Live traffic figures for one location. `status` is `Heavy`, `Moderate`
/// or `Smooth`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficReading {
    pub status: String,
    pub congestion_level: f64,
    pub vehicle_count: f64,
    pub average_speed: f64,
    pub incident_count: f64,
    pub timestamp: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQuality {
    pub aqi: f64,
    pub category: String,
    pub pm2_5: f64,
    pub pm10: f64,
    pub timestamp: String,
    pub source: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdReading {
    pub density: f64,
    pub change_rate: f64,
    pub capacity_utilization: f64,
    pub timestamp: String,
    pub source: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseReading {
    /// Decibels.
    pub level: f64,
    pub source: String,
    pub timestamp: String,
    pub source_type: String,
    pub confidence: f64,
}

/// Minutes per emergency service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTimes {
    pub medical: f64,
    pub fire: f64,
    pub police: f64,
    pub traffic: f64,
    pub rescue: f64,
    pub timestamp: String,
    pub source: String,
    pub incidents_this_hour: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentCounts {
    pub medical: u32,
    pub fire: u32,
    pub traffic: u32,
    pub natural: u32,
    pub total: u32,
    pub timestamp: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardMetrics {
    pub traffic_score: f64,
    pub air_quality_score: f64,
    pub crowd_safety_score: f64,
}

/// Everything the service knows about one location at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayDashboard {
    pub location: String,
    pub overall_score: f64,
    pub last_updated: String,
    pub traffic: TrafficReading,
    pub aqi: AirQuality,
    pub crowd: CrowdReading,
    pub noise: NoiseReading,
    pub response_times: ResponseTimes,
    pub incidents: IncidentCounts,
    pub metrics: DashboardMetrics,
}

/// Dashboards for every location the pipeline currently tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedStream {
    pub timestamp: String,
    pub source: String,
    pub pipeline_status: String,
    pub unified_sources_count: u32,
    pub locations_count: u32,
    pub data: BTreeMap<String, PathwayDashboard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayAnalytics {
    pub timestamp: String,
    pub source: String,
    pub analytics: Map<String, Value>,
    pub data_sources_health: Map<String, Value>,
    /// Buffered history length per stream.
    pub stream_history_length: BTreeMap<String, u64>,
}
