//! Query inputs and chart-ready results of the aggregation pipeline.

use crate::analyzers::levels::{PedestrianLevel, TrafficLevel};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Which detections to keep: a location, an inclusive day range and an
/// optional hour of day (0–23).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hour: Option<u32>,
}

impl DateFilter {
    pub fn new(location: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            start_date,
            end_date,
            hour: None,
        }
    }

    pub fn with_hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    /// Whether a decoded detection time falls inside the window.
    pub fn matches(&self, at: &NaiveDateTime) -> bool {
        use chrono::Timelike;

        let day = at.date();
        let in_range = day >= self.start_date && day <= self.end_date;
        match self.hour {
            Some(hour) => in_range && at.hour() == hour,
            None => in_range,
        }
    }
}

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Statistics for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedDay {
    /// `YYYY-MM-DD`
    pub timestamp: String,
    pub average_cars: u32,
    pub average_people: u32,
    pub max_cars: u32,
    pub max_people: u32,
    pub min_cars: u32,
    pub min_people: u32,
    pub traffic_level: TrafficLevel,
    pub pedestrian_level: PedestrianLevel,
    pub data_points: usize,
}

/// Statistics for one hour of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyData {
    pub hour: u32,
    pub hour_label: String,
    pub average_cars: u32,
    pub average_people: u32,
    pub traffic_level: TrafficLevel,
    pub data_points: usize,
}

/// What history is on hand for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableDateRange {
    pub location: String,
    pub earliest_date: Option<NaiveDateTime>,
    pub latest_date: Option<NaiveDateTime>,
    pub total_detections: usize,
    /// Distinct hours of day with at least one detection, ascending.
    pub available_hours: Vec<u32>,
}

impl AvailableDateRange {
    pub fn empty(location: &str) -> Self {
        Self {
            location: location.to_string(),
            earliest_date: None,
            latest_date: None,
            total_detections: 0,
            available_hours: Vec::new(),
        }
    }
}

/// Peak and quiet hours over a filtered window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total_detections: usize,
    /// Rounded mean of `cars` over every filtered detection.
    pub average_cars: u32,
    pub average_people: u32,
    pub peak_traffic_hour: String,
    pub peak_traffic_count: u64,
    pub quietest_hour: String,
    pub quietest_count: u64,
}

impl SummaryStats {
    pub fn empty() -> Self {
        Self {
            total_detections: 0,
            average_cars: 0,
            average_people: 0,
            peak_traffic_hour: "N/A".to_string(),
            peak_traffic_count: 0,
            quietest_hour: "N/A".to_string(),
            quietest_count: 0,
        }
    }
}

/// Two independently aggregated ranges, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub range1: Vec<AggregatedDay>,
    pub range2: Vec<AggregatedDay>,
}
