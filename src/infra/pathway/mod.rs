//! Client for the Pathway live-data service that fuses the per-zone feeds
//! (traffic, air quality, crowd, noise, emergency response) into one
//! dashboard record.

mod client;
mod types;

pub use client::{DEFAULT_POLL_INTERVAL, HEALTH_TIMEOUT, PathwayClient};
pub use types::{
    AirQuality, CrowdReading, DashboardMetrics, IncidentCounts, NoiseReading, PathwayAnalytics,
    PathwayDashboard, ResponseTimes, TrafficReading, UnifiedStream,
};
