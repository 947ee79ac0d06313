//! Date-filtered history queries for a location.
//!
//! Every query fetches the bounded detection window through
//! [`LocationService`] and aggregates it in memory. Nothing is cached.

use crate::analyzers::aggregate::{
    aggregate_by_day, aggregate_by_hour, available_range, filter_detections, summarize,
};
use crate::analyzers::types::{
    AggregatedDay, AvailableDateRange, Comparison, DateFilter, DateRange, HourlyData, SummaryStats,
};
use crate::detection::Detection;
use crate::services::location_service::LocationService;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub const DEFAULT_FETCH_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct DateFilterService {
    locations: LocationService,
    fetch_limit: usize,
}

impl DateFilterService {
    pub fn new(locations: LocationService, fetch_limit: usize) -> Self {
        Self {
            locations,
            fetch_limit,
        }
    }

    /// Earliest/latest detection and covered hours within the fetch window.
    #[tracing::instrument(skip(self))]
    pub async fn available_date_range(&self, location: &str) -> AvailableDateRange {
        let detections = self.locations.detections(location, self.fetch_limit).await;
        let range = available_range(location, &detections);
        info!(
            total = range.total_detections,
            hours = range.available_hours.len(),
            "Available range computed"
        );
        range
    }

    /// Detections inside `filter`'s day range (and hour, if set).
    #[tracing::instrument(skip(self), fields(location = %filter.location))]
    pub async fn filtered_detections(&self, filter: &DateFilter) -> Vec<Detection> {
        if filter.start_date > filter.end_date {
            warn!(
                start = %filter.start_date,
                end = %filter.end_date,
                "Start date is after end date"
            );
            return Vec::new();
        }

        let fetched = self
            .locations
            .detections(&filter.location, self.fetch_limit)
            .await;
        let fetched_count = fetched.len();
        let filtered = filter_detections(fetched, filter);
        debug!(fetched = fetched_count, kept = filtered.len(), "Detections filtered");
        filtered
    }

    pub async fn aggregated_by_day(&self, filter: &DateFilter) -> Vec<AggregatedDay> {
        let detections = self.filtered_detections(filter).await;
        aggregate_by_day(&detections)
    }

    /// Always 24 entries, one per hour of `date`.
    pub async fn aggregated_by_hour(&self, location: &str, date: NaiveDate) -> Vec<HourlyData> {
        let filter = DateFilter::new(location, date, date);
        let detections = self.filtered_detections(&filter).await;
        aggregate_by_hour(&detections)
    }

    /// Day aggregates for two ranges, fetched concurrently.
    pub async fn comparison(
        &self,
        location: &str,
        range1: DateRange,
        range2: DateRange,
    ) -> Comparison {
        let first = DateFilter::new(location, range1.start, range1.end);
        let second = DateFilter::new(location, range2.start, range2.end);

        let (range1, range2) = tokio::join!(
            self.aggregated_by_day(&first),
            self.aggregated_by_day(&second)
        );
        Comparison { range1, range2 }
    }

    pub async fn summary_stats(&self, filter: &DateFilter) -> SummaryStats {
        let detections = self.filtered_detections(filter).await;
        summarize(&detections)
    }
}
