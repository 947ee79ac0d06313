//! Reference profiles for the city zones shown on the dashboard charts.
//!
//! Each zone maps to a fixed record of air quality, crowd, noise, emergency
//! response and incident figures. Names outside the catalog resolve to
//! [`CityZone::FALLBACK`].

use crate::analyzers::levels::TrafficStatus;
use crate::analyzers::utility::rounded_mean;
use crate::services::locations::Coordinates;
use serde::Serialize;
use std::fmt;

/// Hours of day sampled by the AQI, crowd and noise series.
pub const SERIES_HOURS: [u32; 13] = [0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 23];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CityZone {
    MadhyaMarg,
    DakshinMarg,
    ShantiPath,
    JanMarg,
    VikasMarg,
    Sector17MarketRoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmergencyService {
    Fire,
    Police,
    Ambulance,
    Traffic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncidentKind {
    Traffic,
    Medical,
    Fire,
    Crime,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneProfile {
    pub name: &'static str,
    pub traffic_status: TrafficStatus,
    pub coords: Coordinates,
    pub aqi: [u32; 13],
    pub crowd: [u32; 13],
    /// Decibels.
    pub noise: [u32; 13],
    /// Minutes.
    pub response_times: [(EmergencyService, f64); 4],
    /// Counts over the last 24 hours.
    pub incidents: [(IncidentKind, u32); 5],
}

/// Headline figures derived from a [`ZoneProfile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneInsights {
    pub average_aqi: u32,
    pub aqi_band: &'static str,
    pub peak_crowd: u32,
    pub average_noise: u32,
    pub total_incidents: u32,
    pub average_response_minutes: f64,
}

impl CityZone {
    pub const ALL: [CityZone; 6] = [
        CityZone::MadhyaMarg,
        CityZone::DakshinMarg,
        CityZone::ShantiPath,
        CityZone::JanMarg,
        CityZone::VikasMarg,
        CityZone::Sector17MarketRoad,
    ];

    pub const FALLBACK: CityZone = CityZone::MadhyaMarg;

    /// Looks a zone up by name, falling back to [`CityZone::FALLBACK`].
    pub fn resolve(name: &str) -> CityZone {
        let name = name.trim();
        CityZone::ALL
            .into_iter()
            .find(|z| z.profile().name.eq_ignore_ascii_case(name))
            .unwrap_or(CityZone::FALLBACK)
    }

    pub fn profile(self) -> ZoneProfile {
        use EmergencyService as S;
        use IncidentKind as I;

        match self {
            CityZone::MadhyaMarg => ZoneProfile {
                name: "Madhya Marg",
                traffic_status: TrafficStatus::Heavy,
                coords: Coordinates { lat: 30.7333, lng: 76.7794 },
                aqi: [125, 118, 130, 142, 165, 155, 148, 152, 168, 175, 158, 135, 128],
                crowd: [45, 32, 28, 89, 156, 198, 245, 289, 356, 412, 298, 156, 89],
                noise: [45, 38, 42, 65, 78, 72, 75, 82, 85, 88, 72, 58, 48],
                response_times: [(S::Fire, 8.5), (S::Police, 6.2), (S::Ambulance, 12.3), (S::Traffic, 4.8)],
                incidents: [(I::Traffic, 45), (I::Medical, 23), (I::Fire, 8), (I::Crime, 12), (I::Other, 15)],
            },
            CityZone::DakshinMarg => ZoneProfile {
                name: "Dakshin Marg",
                traffic_status: TrafficStatus::Moderate,
                coords: Coordinates { lat: 30.7209, lng: 76.7665 },
                aqi: [95, 88, 92, 108, 125, 118, 112, 115, 128, 135, 118, 105, 98],
                crowd: [35, 25, 22, 68, 125, 168, 195, 225, 285, 325, 245, 125, 78],
                noise: [38, 32, 35, 55, 68, 62, 65, 72, 75, 78, 62, 48, 42],
                response_times: [(S::Fire, 7.2), (S::Police, 5.8), (S::Ambulance, 10.5), (S::Traffic, 4.2)],
                incidents: [(I::Traffic, 32), (I::Medical, 18), (I::Fire, 5), (I::Crime, 8), (I::Other, 12)],
            },
            CityZone::ShantiPath => ZoneProfile {
                name: "Shanti Path",
                traffic_status: TrafficStatus::Smooth,
                coords: Coordinates { lat: 30.7387, lng: 76.7900 },
                aqi: [65, 58, 62, 72, 85, 78, 75, 82, 88, 92, 78, 68, 62],
                crowd: [15, 12, 8, 28, 65, 95, 125, 155, 185, 225, 165, 85, 45],
                noise: [25, 22, 20, 35, 45, 42, 48, 52, 55, 58, 45, 32, 28],
                response_times: [(S::Fire, 5.8), (S::Police, 4.5), (S::Ambulance, 8.2), (S::Traffic, 3.1)],
                incidents: [(I::Traffic, 18), (I::Medical, 12), (I::Fire, 3), (I::Crime, 4), (I::Other, 8)],
            },
            CityZone::JanMarg => ZoneProfile {
                name: "Jan Marg",
                traffic_status: TrafficStatus::Moderate,
                coords: Coordinates { lat: 30.7286, lng: 76.7731 },
                aqi: [105, 98, 110, 122, 145, 138, 132, 135, 148, 155, 138, 115, 108],
                crowd: [38, 28, 25, 75, 135, 175, 215, 255, 315, 365, 275, 145, 85],
                noise: [42, 35, 38, 58, 72, 68, 72, 78, 82, 85, 68, 52, 45],
                response_times: [(S::Fire, 7.8), (S::Police, 5.9), (S::Ambulance, 11.2), (S::Traffic, 4.5)],
                incidents: [(I::Traffic, 38), (I::Medical, 20), (I::Fire, 6), (I::Crime, 9), (I::Other, 13)],
            },
            CityZone::VikasMarg => ZoneProfile {
                name: "Vikas Marg",
                traffic_status: TrafficStatus::Heavy,
                coords: Coordinates { lat: 30.7445, lng: 76.7850 },
                aqi: [135, 128, 140, 152, 175, 168, 158, 162, 178, 185, 168, 145, 138],
                crowd: [48, 35, 32, 95, 165, 215, 265, 315, 385, 445, 325, 185, 115],
                noise: [48, 42, 45, 68, 82, 78, 82, 88, 92, 95, 78, 62, 52],
                response_times: [(S::Fire, 9.2), (S::Police, 6.8), (S::Ambulance, 13.5), (S::Traffic, 5.2)],
                incidents: [(I::Traffic, 52), (I::Medical, 28), (I::Fire, 12), (I::Crime, 15), (I::Other, 18)],
            },
            CityZone::Sector17MarketRoad => ZoneProfile {
                name: "Sector 17 Market Road",
                traffic_status: TrafficStatus::Smooth,
                coords: Coordinates { lat: 30.7419, lng: 76.7686 },
                aqi: [55, 48, 52, 62, 75, 68, 65, 72, 78, 82, 68, 58, 52],
                crowd: [12, 8, 5, 22, 45, 75, 95, 125, 155, 185, 135, 65, 35],
                noise: [22, 18, 15, 28, 38, 35, 42, 45, 48, 52, 38, 28, 25],
                response_times: [(S::Fire, 4.8), (S::Police, 3.9), (S::Ambulance, 7.2), (S::Traffic, 2.8)],
                incidents: [(I::Traffic, 15), (I::Medical, 8), (I::Fire, 2), (I::Crime, 3), (I::Other, 6)],
            },
        }
    }
}

impl ZoneProfile {
    /// Pairs a 13-point series with its `H:00` time labels.
    pub fn labelled(series: &[u32; 13]) -> Vec<(String, u32)> {
        SERIES_HOURS
            .iter()
            .zip(series)
            .map(|(hour, value)| (format!("{hour}:00"), *value))
            .collect()
    }

    pub fn insights(&self) -> ZoneInsights {
        let average_aqi = rounded_mean(&self.aqi);
        let aqi_band = match average_aqi {
            a if a > 150 => "Unhealthy",
            a if a > 100 => "Moderate",
            _ => "Good",
        };

        let response_sum: f64 = self.response_times.iter().map(|(_, t)| t).sum();
        let average_response = response_sum / self.response_times.len() as f64;

        ZoneInsights {
            average_aqi,
            aqi_band,
            peak_crowd: self.crowd.iter().copied().max().unwrap_or(0),
            average_noise: rounded_mean(&self.noise),
            total_incidents: self.incidents.iter().map(|(_, n)| n).sum(),
            average_response_minutes: (average_response * 10.0).round() / 10.0,
        }
    }
}

impl fmt::Display for CityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_fallback() {
        assert_eq!(CityZone::resolve("Jan Marg"), CityZone::JanMarg);
        assert_eq!(CityZone::resolve("sector 17 market road"), CityZone::Sector17MarketRoad);
        assert_eq!(CityZone::resolve("Nowhere Street"), CityZone::MadhyaMarg);
    }

    #[test]
    fn test_madhya_marg_insights() {
        let insights = CityZone::MadhyaMarg.profile().insights();

        assert_eq!(insights.average_aqi, 146);
        assert_eq!(insights.aqi_band, "Moderate");
        assert_eq!(insights.peak_crowd, 412);
        assert_eq!(insights.average_noise, 65);
        assert_eq!(insights.total_incidents, 103);
        assert_eq!(insights.average_response_minutes, 8.0);
    }

    #[test]
    fn test_aqi_bands() {
        assert_eq!(CityZone::VikasMarg.profile().insights().aqi_band, "Unhealthy");
        assert_eq!(CityZone::ShantiPath.profile().insights().aqi_band, "Good");
    }

    #[test]
    fn test_labelled_series() {
        let profile = CityZone::ShantiPath.profile();
        let series = ZoneProfile::labelled(&profile.aqi);

        assert_eq!(series.len(), 13);
        assert_eq!(series[0], ("0:00".to_string(), 65));
        assert_eq!(series[12], ("23:00".to_string(), 62));
    }
}
