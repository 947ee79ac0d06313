//! Catalog of monitored camera locations.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Static metadata for a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationInfo {
    /// Child key under `locations/` in the store.
    pub store_key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub stream_id: &'static str,
    pub coords: Coordinates,
}

/// A location the ingestion pipeline writes detections for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Location {
    Canmore,
    KohSamui,
    Bangkok,
    FourCornersDowntown,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Canmore,
        Location::KohSamui,
        Location::Bangkok,
        Location::FourCornersDowntown,
    ];

    pub fn info(self) -> &'static LocationInfo {
        match self {
            Location::Canmore => &CANMORE,
            Location::KohSamui => &KOH_SAMUI,
            Location::Bangkok => &BANGKOK,
            Location::FourCornersDowntown => &FOUR_CORNERS,
        }
    }

    pub fn store_key(self) -> &'static str {
        self.info().store_key
    }

    /// Resolves a display name or store key; `None` for names outside the
    /// catalog.
    pub fn resolve(name: &str) -> Option<Location> {
        let name = name.trim();
        Location::ALL.into_iter().find(|loc| {
            let info = loc.info();
            info.store_key.eq_ignore_ascii_case(name) || info.display_name.eq_ignore_ascii_case(name)
        })
    }

    pub fn names() -> Vec<String> {
        Location::ALL
            .iter()
            .map(|l| l.info().display_name.to_string())
            .collect()
    }
}

static CANMORE: LocationInfo = LocationInfo {
    store_key: "Canmore Alberta",
    display_name: "Canmore Alberta",
    description: "Main Street Livecam, Canmore, Alberta",
    stream_id: "_0wPODlF9wU",
    coords: Coordinates { lat: 51.0892, lng: -115.3576 },
};

static KOH_SAMUI: LocationInfo = LocationInfo {
    store_key: "Koh Samui Thailand",
    display_name: "Koh Samui Thailand",
    description: "Bondi Aussie Bar & Grill | Chaweng",
    stream_id: "VR-x3HdhKLQ",
    coords: Coordinates { lat: 9.5125, lng: 100.0147 },
};

static BANGKOK: LocationInfo = LocationInfo {
    store_key: "Bangkok Thailand",
    display_name: "Bangkok Thailand",
    description: "El Gaucho | Soi 11 | Sukhumvit Road",
    stream_id: "UemFRPrl1hk",
    coords: Coordinates { lat: 13.7563, lng: 100.5018 },
};

static FOUR_CORNERS: LocationInfo = LocationInfo {
    store_key: "4 Corners Downtown",
    display_name: "4 Corners Downtown",
    description: "4 Corners Camera Downtown",
    stream_id: "ByED80IKdIU",
    coords: Coordinates { lat: 40.7128, lng: -74.0060 },
};

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().display_name)
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::resolve(s).ok_or_else(|| anyhow::anyhow!("unknown location '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        assert_eq!(Location::resolve("Canmore Alberta"), Some(Location::Canmore));
        assert_eq!(Location::resolve(" bangkok thailand "), Some(Location::Bangkok));
        assert_eq!(
            "4 Corners Downtown".parse::<Location>().unwrap(),
            Location::FourCornersDowntown
        );
    }

    #[test]
    fn test_resolve_unknown_name() {
        assert_eq!(Location::resolve("Atlantis"), None);
        assert!("".parse::<Location>().is_err());
    }

    #[test]
    fn test_names_cover_catalog() {
        let names = Location::names();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"Koh Samui Thailand".to_string()));
        assert_eq!(Location::KohSamui.to_string(), "Koh Samui Thailand");
    }
}
