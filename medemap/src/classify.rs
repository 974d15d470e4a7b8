//! Threshold classification of indicator values into low/medium/high categories.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Category of a value against the thresholds of its column. The discriminant is the numeric
/// code used by choropleth z-values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Unavailable = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Category {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn color(self, palette: Palette) -> &'static str {
        match (self, palette) {
            (Category::Unavailable, _) => "gray",
            (Category::Low, _) => "red",
            (Category::Medium, Palette::TrafficLight) => "orange",
            (Category::High, Palette::TrafficLight) => "green",
            (Category::Medium, Palette::RedGreenBlue) => "green",
            (Category::High, Palette::RedGreenBlue) => "blue",
        }
    }
}

/// Colour scheme used to render categories.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum Palette {
    /// gray / red / orange / green
    #[default]
    TrafficLight,
    /// gray / red / green / blue
    RedGreenBlue,
}

/// Which pair of threshold fields a view classifies against.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// `low_threshold` / `medium_threshold`
    LowMediumHigh,
    /// `medium_low_threshold` / `high_medium_threshold`
    #[default]
    MediumLowHighMedium,
}

/// Pair of inclusive upper bounds for the low and medium categories.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind")]
pub enum ThresholdPolicy {
    LowMediumHigh {
        low: Option<f64>,
        medium: Option<f64>,
    },
    MediumLowHighMedium {
        medium_low: Option<f64>,
        high_medium: Option<f64>,
    },
}

impl ThresholdPolicy {
    /// The (low, medium) upper bounds when both are present.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            ThresholdPolicy::LowMediumHigh { low, medium } => low.zip(medium),
            ThresholdPolicy::MediumLowHighMedium {
                medium_low,
                high_medium,
            } => medium_low.zip(high_medium),
        }
    }
}

/// Classify `value` against `policy`. Values equal to a bound fall into the lower category.
pub fn classify(value: f64, policy: Option<&ThresholdPolicy>) -> Category {
    let Some((low, medium)) = policy.and_then(ThresholdPolicy::bounds) else {
        return Category::Unavailable;
    };
    if value <= low {
        Category::Low
    } else if value <= medium {
        Category::Medium
    } else {
        Category::High
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn policy(low: f64, high: f64) -> ThresholdPolicy {
        ThresholdPolicy::MediumLowHighMedium {
            medium_low: Some(low),
            high_medium: Some(high),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let p = policy(20.0, 80.0);
        assert_eq!(classify(20.0, Some(&p)), Category::Low);
        assert_eq!(classify(20.000001, Some(&p)), Category::Medium);
        assert_eq!(classify(80.0, Some(&p)), Category::Medium);
        assert_eq!(classify(80.5, Some(&p)), Category::High);
        assert_eq!(classify(-5.0, Some(&p)), Category::Low);
    }

    #[test]
    fn austria_population_is_medium() {
        let p = policy(20.0, 80.0);
        let category = classify(50.0, Some(&p));
        assert_eq!(category, Category::Medium);
        assert_eq!(category.code(), 2);
        assert_eq!(category.color(Palette::TrafficLight), "orange");
    }

    #[test]
    fn missing_bounds_are_unavailable() {
        assert_eq!(classify(10.0, None), Category::Unavailable);
        let partial = ThresholdPolicy::LowMediumHigh {
            low: Some(1.0),
            medium: None,
        };
        assert_eq!(classify(10.0, Some(&partial)), Category::Unavailable);
        assert_eq!(Category::Unavailable.color(Palette::RedGreenBlue), "gray");
    }

    #[test]
    fn zero_threshold_is_a_real_bound() {
        let p = ThresholdPolicy::LowMediumHigh {
            low: Some(0.0),
            medium: Some(0.0),
        };
        assert_eq!(classify(0.0, Some(&p)), Category::Low);
        assert_eq!(classify(0.1, Some(&p)), Category::High);
    }

    #[test]
    fn classification_is_total() {
        let p = policy(-1.0, 1.0);
        for value in [f64::MIN, -1.0, 0.0, 1.0, f64::MAX] {
            let c = classify(value, Some(&p));
            assert!(matches!(c, Category::Low | Category::Medium | Category::High));
        }
    }

    #[test]
    fn palettes_differ_for_upper_categories() {
        assert_eq!(Category::Medium.color(Palette::RedGreenBlue), "green");
        assert_eq!(Category::High.color(Palette::RedGreenBlue), "blue");
        assert_eq!(Category::High.color(Palette::TrafficLight), "green");
        assert_eq!(Palette::from_str("redgreenblue").unwrap(), Palette::RedGreenBlue);
    }

    #[test]
    fn policy_serializes_with_kind_tag() {
        let value = serde_json::to_value(policy(1.0, 2.0)).unwrap();
        assert_eq!(value["kind"], "MediumLowHighMedium");
        assert_eq!(value["medium_low"], 1.0);
    }
}
