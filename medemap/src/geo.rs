//! Joining countries to coordinates and ISO codes. Lookups are by literal country name; there is
//! no fuzzy matching.

use std::collections::HashMap;

use geo::Point;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transform::parse_numeric;

/// One row of the coordinate reference table. Latitude and longitude arrive as numbers or as
/// numeric strings depending on the database driver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoCoordinate {
    pub country: String,
    #[serde(default, alias = "capitol")]
    pub capital: Option<String>,
    #[serde(default)]
    pub latitude: Value,
    #[serde(default)]
    pub longitude: Value,
}

impl GeoCoordinate {
    /// The capital location as a point (x = longitude, y = latitude), if both coordinates parse.
    pub fn point(&self) -> Option<Point<f64>> {
        let latitude = parse_numeric(Some(&self.latitude))?;
        let longitude = parse_numeric(Some(&self.longitude))?;
        Some(Point::new(longitude, latitude))
    }
}

/// Country name to location lookup built from the coordinate reference table.
#[derive(Debug, Clone, Default)]
pub struct CoordinateIndex {
    points: HashMap<String, Point<f64>>,
}

impl CoordinateIndex {
    pub fn new(coordinates: &[GeoCoordinate]) -> Self {
        let mut points = HashMap::with_capacity(coordinates.len());
        for coordinate in coordinates {
            match coordinate.point() {
                Some(point) => {
                    // The first row for a country wins.
                    points.entry(coordinate.country.clone()).or_insert(point);
                }
                None => debug!("Unusable coordinates for country: {}", coordinate.country),
            }
        }
        Self { points }
    }

    pub fn lookup(&self, country: &str) -> Option<Point<f64>> {
        let point = self.points.get(country).copied();
        if point.is_none() {
            warn!("Coordinates not found for country: {country}");
        }
        point
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

const COUNTRY_ISO3: [(&str, &str); 30] = [
    ("Austria", "AUT"),
    ("Belgium", "BEL"),
    ("Bulgaria", "BGR"),
    ("Croatia", "HRV"),
    ("Cyprus", "CYP"),
    ("Czech Republic", "CZE"),
    ("Denmark", "DNK"),
    ("Estonia", "EST"),
    ("Finland", "FIN"),
    ("France", "FRA"),
    ("Germany", "DEU"),
    ("Greece", "GRC"),
    ("Hungary", "HUN"),
    ("Ireland", "IRL"),
    ("Italy", "ITA"),
    ("Latvia", "LVA"),
    ("Lithuania", "LTU"),
    ("Luxembourg", "LUX"),
    ("Malta", "MLT"),
    ("Netherlands", "NLD"),
    ("Poland", "POL"),
    ("Portugal", "PRT"),
    ("Romania", "ROU"),
    ("Slovakia", "SVK"),
    ("Slovenia", "SVN"),
    ("Spain", "ESP"),
    ("Sweden", "SWE"),
    ("Russia", "RUS"),
    ("Belarus", "BLR"),
    ("Ukraine", "UKR"),
];

/// Countries always drawn blank on top of the choropleth.
pub const BLANK_OVERLAY: [&str; 3] = ["RUS", "BLR", "UKR"];

/// Countries coloured by the polygon view.
pub const EUROPEAN_COUNTRIES: [&str; 29] = [
    "Austria",
    "Belgium",
    "Bulgaria",
    "Croatia",
    "Czech Republic",
    "Denmark",
    "Estonia",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Iceland",
    "Ireland",
    "Italy",
    "Latvia",
    "Liechtenstein",
    "Lithuania",
    "Luxembourg",
    "Malta",
    "Monaco",
    "Netherlands",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Slovenia",
    "Spain",
    "Sweden",
];

/// ISO 3166-1 alpha-3 code for a country name.
pub fn country_iso3(country: &str) -> Option<&'static str> {
    COUNTRY_ISO3
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, iso3)| *iso3)
}

/// Key used to join countries against polygon names.
pub fn normalize_country_name(name: &str) -> String {
    name.trim().to_lowercase()
}
