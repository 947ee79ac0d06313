//! Categorical traffic and pedestrian levels.
//!
//! The ingestion pipeline classifies raw counts into these bands before
//! writing a detection; the same thresholds are used here for live counts.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficLevel {
    Empty,
    Low,
    Medium,
    High,
    Congested,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PedestrianLevel {
    Empty,
    Low,
    Moderate,
    Busy,
    Crowded,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Converts a vehicle count into a traffic level.
///
/// | Vehicles | Level     |
/// |----------|-----------|
/// | 0        | EMPTY     |
/// | 1–3      | LOW       |
/// | 4–8      | MEDIUM    |
/// | 9–15     | HIGH      |
/// | > 15     | CONGESTED |
pub fn traffic_level(vehicles: u32) -> TrafficLevel {
    match vehicles {
        0 => TrafficLevel::Empty,
        v if v <= 3 => TrafficLevel::Low,
        v if v <= 8 => TrafficLevel::Medium,
        v if v <= 15 => TrafficLevel::High,
        _ => TrafficLevel::Congested,
    }
}

/// Converts a person count into a pedestrian level.
///
/// | People | Level    |
/// |--------|----------|
/// | 0      | EMPTY    |
/// | 1–5    | LOW      |
/// | 6–15   | MODERATE |
/// | 16–25  | BUSY     |
/// | > 25   | CROWDED  |
pub fn pedestrian_level(people: u32) -> PedestrianLevel {
    match people {
        0 => PedestrianLevel::Empty,
        p if p <= 5 => PedestrianLevel::Low,
        p if p <= 15 => PedestrianLevel::Moderate,
        p if p <= 25 => PedestrianLevel::Busy,
        _ => PedestrianLevel::Crowded,
    }
}

/// Dashboard badge for a live vehicle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrafficStatus {
    Empty,
    Smooth,
    Moderate,
    Heavy,
    Congested,
}

pub fn traffic_status(vehicles: u32) -> TrafficStatus {
    match vehicles {
        0 => TrafficStatus::Empty,
        v if v <= 3 => TrafficStatus::Smooth,
        v if v <= 8 => TrafficStatus::Moderate,
        v if v <= 15 => TrafficStatus::Heavy,
        _ => TrafficStatus::Congested,
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrafficLevel::Empty => "EMPTY",
            TrafficLevel::Low => "LOW",
            TrafficLevel::Medium => "MEDIUM",
            TrafficLevel::High => "HIGH",
            TrafficLevel::Congested => "CONGESTED",
            TrafficLevel::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PedestrianLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PedestrianLevel::Empty => "EMPTY",
            PedestrianLevel::Low => "LOW",
            PedestrianLevel::Moderate => "MODERATE",
            PedestrianLevel::Busy => "BUSY",
            PedestrianLevel::Crowded => "CROWDED",
            PedestrianLevel::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl fmt::Display for TrafficStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
