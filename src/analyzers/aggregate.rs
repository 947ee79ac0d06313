use crate::analyzers::levels::{PedestrianLevel, TrafficLevel};
use crate::analyzers::types::{
    AggregatedDay, AvailableDateRange, DateFilter, HourlyData, SummaryStats,
};
use crate::analyzers::utility::{format_hour, most_common, rounded_mean};
use crate::detection::{Detection, LocationReading};
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, BTreeSet};

/// Keeps the detections whose decoded key falls inside `filter`.
///
/// Detections with malformed keys are dropped.
pub fn filter_detections(detections: Vec<Detection>, filter: &DateFilter) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.recorded_at().is_some_and(|at| filter.matches(&at)))
        .collect()
}

/// Groups detections by calendar day, ascending. Days without detections
/// are absent.
pub fn aggregate_by_day(detections: &[Detection]) -> Vec<AggregatedDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&LocationReading>> = BTreeMap::new();

    for detection in detections {
        let Some(at) = detection.recorded_at() else {
            continue;
        };
        by_day.entry(at.date()).or_default().push(&detection.data);
    }

    by_day
        .into_iter()
        .map(|(day, readings)| {
            let cars: Vec<u32> = readings.iter().map(|r| r.cars).collect();
            let people: Vec<u32> = readings.iter().map(|r| r.people).collect();

            AggregatedDay {
                timestamp: day.format("%Y-%m-%d").to_string(),
                average_cars: rounded_mean(&cars),
                average_people: rounded_mean(&people),
                max_cars: cars.iter().copied().max().unwrap_or(0),
                max_people: people.iter().copied().max().unwrap_or(0),
                min_cars: cars.iter().copied().min().unwrap_or(0),
                min_people: people.iter().copied().min().unwrap_or(0),
                traffic_level: most_common(
                    readings.iter().map(|r| r.traffic_level),
                    TrafficLevel::Unknown,
                ),
                pedestrian_level: most_common(
                    readings.iter().map(|r| r.pedestrian_level),
                    PedestrianLevel::Unknown,
                ),
                data_points: readings.len(),
            }
        })
        .collect()
}

/// Groups detections by hour of day into exactly 24 slots, ascending.
///
/// Hours without detections carry zero counts and [`TrafficLevel::Empty`].
/// Callers pass detections for a single day.
pub fn aggregate_by_hour(detections: &[Detection]) -> Vec<HourlyData> {
    let mut by_hour: [Vec<&LocationReading>; 24] = std::array::from_fn(|_| Vec::new());

    for detection in detections {
        let Some(at) = detection.recorded_at() else {
            continue;
        };
        by_hour[at.hour() as usize].push(&detection.data);
    }

    by_hour
        .iter()
        .zip(0u32..)
        .map(|(readings, hour)| {
            if readings.is_empty() {
                return HourlyData {
                    hour,
                    hour_label: format_hour(hour),
                    average_cars: 0,
                    average_people: 0,
                    traffic_level: TrafficLevel::Empty,
                    data_points: 0,
                };
            }

            let cars: Vec<u32> = readings.iter().map(|r| r.cars).collect();
            let people: Vec<u32> = readings.iter().map(|r| r.people).collect();

            HourlyData {
                hour,
                hour_label: format_hour(hour),
                average_cars: rounded_mean(&cars),
                average_people: rounded_mean(&people),
                traffic_level: most_common(
                    readings.iter().map(|r| r.traffic_level),
                    TrafficLevel::Unknown,
                ),
                data_points: readings.len(),
            }
        })
        .collect()
}

/// Finds the busiest and quietest hour of day by summed `cars`.
///
/// Hours are compared in the order they first appear in `detections`; the
/// first hour to reach the extreme wins.
pub fn summarize(detections: &[Detection]) -> SummaryStats {
    if detections.is_empty() {
        return SummaryStats::empty();
    }

    let mut hourly_totals: Vec<(u32, u64)> = Vec::new();
    for detection in detections {
        let Some(at) = detection.recorded_at() else {
            continue;
        };
        let cars = u64::from(detection.data.cars);
        match hourly_totals.iter_mut().find(|(h, _)| *h == at.hour()) {
            Some((_, total)) => *total += cars,
            None => hourly_totals.push((at.hour(), cars)),
        }
    }

    let (mut peak_hour, mut peak_count) = (0, 0);
    let mut quietest: Option<(u32, u64)> = None;
    for &(hour, total) in &hourly_totals {
        if total > peak_count {
            peak_hour = hour;
            peak_count = total;
        }
        if quietest.is_none_or(|(_, q)| total < q) {
            quietest = Some((hour, total));
        }
    }
    let (quietest_hour, quietest_count) = quietest.unwrap_or((0, 0));

    let cars: Vec<u32> = detections.iter().map(|d| d.data.cars).collect();
    let people: Vec<u32> = detections.iter().map(|d| d.data.people).collect();

    SummaryStats {
        total_detections: detections.len(),
        average_cars: rounded_mean(&cars),
        average_people: rounded_mean(&people),
        peak_traffic_hour: format_hour(peak_hour),
        peak_traffic_count: peak_count,
        quietest_hour: format_hour(quietest_hour),
        quietest_count,
    }
}

/// Earliest and latest decodable detection plus the hours of day covered.
///
/// Only decodable detections are counted; when none decode the range is
/// empty.
pub fn available_range(location: &str, detections: &[Detection]) -> AvailableDateRange {
    if detections.is_empty() {
        return AvailableDateRange::empty(location);
    }

    let times: Vec<_> = detections.iter().filter_map(Detection::recorded_at).collect();
    let hours: BTreeSet<u32> = times.iter().map(|t| t.hour()).collect();

    AvailableDateRange {
        location: location.to_string(),
        earliest_date: times.iter().min().copied(),
        latest_date: times.iter().max().copied(),
        total_detections: detections.len(),
        available_hours: hours.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::levels::{pedestrian_level, traffic_level};

    fn detection(key: &str, cars: u32, people: u32) -> Detection {
        Detection::new(
            key,
            LocationReading {
                cars,
                people,
                traffic_level: traffic_level(cars),
                pedestrian_level: pedestrian_level(people),
                ..Default::default()
            },
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_aggregate_two_detections() {
        let detections = vec![
            detection("20240101_080000", 10, 4),
            detection("20240101_090000", 20, 8),
        ];

        let days = aggregate_by_day(&detections);

        assert_eq!(days.len(), 1);
        let d = &days[0];
        assert_eq!(d.timestamp, "2024-01-01");
        assert_eq!(d.average_cars, 15);
        assert_eq!(d.max_cars, 20);
        assert_eq!(d.min_cars, 10);
        assert_eq!(d.average_people, 6);
        assert_eq!(d.data_points, 2);
    }

    #[test]
    fn test_day_aggregate_sorted_and_sparse() {
        let detections = vec![
            detection("20240105_080000", 1, 1),
            detection("20240101_080000", 2, 2),
            detection("20240103_080000", 3, 3),
            detection("garbage", 99, 99),
        ];

        let days = aggregate_by_day(&detections);

        let keys: Vec<_> = days.iter().map(|d| d.timestamp.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-03", "2024-01-05"]);
        assert!(days.iter().all(|d| d.data_points > 0));
    }

    #[test]
    fn test_day_aggregate_mode_of_levels() {
        let mut detections = vec![
            detection("20240101_080000", 10, 0),
            detection("20240101_081000", 2, 0),
            detection("20240101_082000", 12, 0),
        ];
        detections[1].data.pedestrian_level = PedestrianLevel::Busy;

        let days = aggregate_by_day(&detections);

        assert_eq!(days[0].traffic_level, TrafficLevel::High);
        assert_eq!(days[0].pedestrian_level, PedestrianLevel::Empty);
    }

    #[test]
    fn test_hour_aggregate_always_24_slots() {
        let empty = aggregate_by_hour(&[]);
        assert_eq!(empty.len(), 24);
        assert!(empty.iter().all(|h| h.data_points == 0 && h.traffic_level == TrafficLevel::Empty));

        let detections = vec![
            detection("20240101_083000", 4, 2),
            detection("20240101_081500", 6, 2),
            detection("20240101_230000", 1, 0),
        ];
        let hours = aggregate_by_hour(&detections);

        assert_eq!(hours.len(), 24);
        assert!(hours.iter().zip(0u32..).all(|(h, i)| h.hour == i));
        assert_eq!(hours[8].average_cars, 5);
        assert_eq!(hours[8].data_points, 2);
        assert_eq!(hours[8].traffic_level, TrafficLevel::Medium);
        assert_eq!(hours[8].hour_label, "8:00 AM");
        assert_eq!(hours[23].data_points, 1);
        assert_eq!(hours[12].average_people, 0);
        assert_eq!(hours[12].traffic_level, TrafficLevel::Empty);
    }

    #[test]
    fn test_filter_by_range_and_hour() {
        let detections = vec![
            detection("20231231_235959", 1, 0),
            detection("20240101_000000", 2, 0),
            detection("20240102_080000", 3, 0),
            detection("20240102_235959", 4, 0),
            detection("20240103_000000", 5, 0),
            detection("2024010_080000", 6, 0),
        ];

        let filter = DateFilter::new("Canmore Alberta", day(2024, 1, 1), day(2024, 1, 2));
        let kept = filter_detections(detections.clone(), &filter);
        let cars: Vec<_> = kept.iter().map(|d| d.data.cars).collect();
        assert_eq!(cars, vec![2, 3, 4]);

        let kept = filter_detections(detections, &filter.with_hour(8));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].data.cars, 3);
    }

    #[test]
    fn test_summary_peak_and_quietest() {
        let detections = vec![
            detection("20240101_090000", 5, 1),
            detection("20240101_091500", 5, 1),
            detection("20240101_170000", 30, 3),
            detection("20240101_030000", 1, 0),
        ];

        let summary = summarize(&detections);

        assert_eq!(summary.total_detections, 4);
        assert_eq!(summary.peak_traffic_hour, "5:00 PM");
        assert_eq!(summary.peak_traffic_count, 30);
        assert_eq!(summary.quietest_hour, "3:00 AM");
        assert_eq!(summary.quietest_count, 1);
        assert_eq!(summary.average_cars, 10);
        assert_eq!(summary.average_people, 1);
    }

    #[test]
    fn test_summary_empty_is_na() {
        let summary = summarize(&[]);
        assert_eq!(summary, SummaryStats::empty());
        assert_eq!(summary.peak_traffic_hour, "N/A");
        assert_eq!(summary.quietest_hour, "N/A");
    }

    #[test]
    fn test_summary_tie_keeps_first_seen_hour() {
        let detections = vec![
            detection("20240101_140000", 7, 0),
            detection("20240101_100000", 7, 0),
        ];

        let summary = summarize(&detections);
        assert_eq!(summary.peak_traffic_hour, "2:00 PM");
        assert_eq!(summary.quietest_hour, "2:00 PM");
    }

    #[test]
    fn test_available_range() {
        let detections = vec![
            detection("20240103_170000", 1, 0),
            detection("20240101_080000", 1, 0),
            detection("20240102_080500", 1, 0),
            detection("bogus", 1, 0),
        ];

        let range = available_range("Bangkok Thailand", &detections);

        assert_eq!(range.location, "Bangkok Thailand");
        assert_eq!(
            range.earliest_date,
            Some(day(2024, 1, 1).and_hms_opt(8, 0, 0).unwrap())
        );
        assert_eq!(
            range.latest_date,
            Some(day(2024, 1, 3).and_hms_opt(17, 0, 0).unwrap())
        );
        assert_eq!(range.total_detections, 4);
        assert_eq!(range.available_hours, vec![8, 17]);
    }

    #[test]
    fn test_available_range_empty() {
        let range = available_range("Bangkok Thailand", &[]);
        assert_eq!(range.earliest_date, None);
        assert_eq!(range.latest_date, None);
        assert_eq!(range.total_detections, 0);
        assert!(range.available_hours.is_empty());

    }

    #[test]
    fn test_available_range_counts_every_fetched_record() {
        let detections = vec![
            detection("20240105_063000", 2, 1),
            detection("20240105_0630", 2, 1),
            detection("2024O105_063000", 2, 1),
        ];

        let range = available_range("Bangkok Thailand", &detections);
        assert_eq!(range.total_detections, detections.len());
        assert_eq!(range.available_hours, vec![6]);
        assert_eq!(range.earliest_date, range.latest_date);

        let undecodable = available_range("Bangkok Thailand", &[detection("x", 1, 1)]);
        assert_eq!(undecodable.total_detections, 1);
        assert_eq!(undecodable.earliest_date, None);
        assert!(undecodable.available_hours.is_empty());
    }
}
