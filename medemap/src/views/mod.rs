//! Per-view derivations. Every view is a pure function of the cached data, the selection and the
//! view parameters; nothing here touches the store or the network.

use enum_dispatch::enum_dispatch;
use log::error;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    data::{CountryRow, IndicatorData},
    error::{MedemapError, MedemapResult},
    geo::GeoCoordinate,
    metadata::{ColumnOption, Thresholds},
    selection::Selection,
    stats::IndicatorSeries,
    transform::{column_values, indicator_columns},
};

pub mod charts;
pub mod choropleth;
pub mod correlation;
pub mod globe;
pub mod histogram;
pub mod mesh;
pub mod pca;
pub mod polygons;
pub mod stacked_bar;
pub mod table;

pub use charts::ChartsOutput;
pub use choropleth::ChoroplethOutput;
pub use correlation::CorrelationOutput;
pub use globe::GlobeOutput;
pub use histogram::{HistogramColorMode, HistogramOutput};
pub use mesh::MeshOutput;
pub use pca::PcaOutput;
pub use polygons::PolygonsOutput;
pub use stacked_bar::StackedBarOutput;
pub use table::TableOutput;

pub const MIN_BIN_COUNT: usize = 5;
pub const MAX_BIN_COUNT: usize = 30;

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Globe,
    Polygons,
    Choropleth,
    Charts,
    Histogram,
    Mesh,
    StackedBar,
    Correlation,
    Pca,
    Table,
}

impl ViewKind {
    /// Whether the view joins countries against locations.
    pub fn is_spatial(self) -> bool {
        matches!(self, ViewKind::Globe | ViewKind::Polygons | ViewKind::Choropleth)
    }

    /// Whether the view needs the coordinate reference table.
    pub fn needs_coordinates(self) -> bool {
        self == ViewKind::Globe
    }
}

/// Tunable parameters of the views. Each view reads only the fields it cares about.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewParams {
    /// Globe bar offset from the capital, in degrees.
    pub bar_spacing: f64,
    /// Number of histogram bins.
    pub bin_count: usize,
    pub color_mode: HistogramColorMode,
    /// Lightness range in percent used by the hue colour mode.
    pub color_range: (f64, f64),
    /// Hue in degrees used by the hue colour mode.
    pub color_hue: f64,
    /// Stacked bar: show only the series with this indicator name.
    pub indicator_filter: Option<String>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            bar_spacing: 0.4,
            bin_count: 10,
            color_mode: HistogramColorMode::Hue,
            color_range: (30.0, 70.0),
            color_hue: 210.0,
            indicator_filter: None,
        }
    }
}

impl ViewParams {
    pub fn validate(&self) -> MedemapResult<()> {
        if !(MIN_BIN_COUNT..=MAX_BIN_COUNT).contains(&self.bin_count) {
            return Err(MedemapError::InvalidParameter(format!(
                "bin count must be between {MIN_BIN_COUNT} and {MAX_BIN_COUNT}, got {}",
                self.bin_count
            )));
        }
        let (low, high) = self.color_range;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low > high {
            return Err(MedemapError::InvalidParameter(format!(
                "colour range must be an increasing pair within 0..=100, got {low}..{high}"
            )));
        }
        if !self.bar_spacing.is_finite() || !self.color_hue.is_finite() {
            return Err(MedemapError::InvalidParameter(
                "bar spacing and hue must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Everything a view derivation reads.
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub data: &'a IndicatorData,
    pub selection: &'a Selection,
    pub coordinates: Option<&'a [GeoCoordinate]>,
    pub params: &'a ViewParams,
}

/// A flat record with an optional location, the common shape the output formatters write.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct FeatureRecord {
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub geometry: Option<geo::Point<f64>>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    pub fn at(mut self, point: geo::Point<f64>) -> Self {
        self.geometry = Some(point);
        self
    }
}

/// Flattening of a view output into feature records.
#[enum_dispatch]
pub trait ToRecords {
    fn records(&self) -> Vec<FeatureRecord>;
}

#[enum_dispatch(ToRecords)]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewOutput {
    Globe(GlobeOutput),
    Polygons(PolygonsOutput),
    Choropleth(ChoroplethOutput),
    Charts(ChartsOutput),
    Histogram(HistogramOutput),
    Mesh(MeshOutput),
    StackedBar(StackedBarOutput),
    Correlation(CorrelationOutput),
    Pca(PcaOutput),
    Table(TableOutput),
}

/// Derive the plot-ready output of one view.
pub fn derive(kind: ViewKind, inputs: &ViewInputs) -> MedemapResult<ViewOutput> {
    inputs.params.validate()?;
    Ok(match kind {
        ViewKind::Globe => globe::derive(inputs)?.into(),
        ViewKind::Polygons => polygons::derive(inputs).into(),
        ViewKind::Choropleth => choropleth::derive(inputs).into(),
        ViewKind::Charts => charts::derive(inputs).into(),
        ViewKind::Histogram => histogram::derive(inputs).into(),
        ViewKind::Mesh => mesh::derive(inputs).into(),
        ViewKind::StackedBar => stacked_bar::derive(inputs)?.into(),
        ViewKind::Correlation => correlation::derive(inputs).into(),
        ViewKind::Pca => pca::derive(inputs)?.into(),
        ViewKind::Table => table::derive(inputs).into(),
    })
}

/// Rows of a selected table. A table missing from the data is logged and skipped by the view.
fn selected_rows<'a>(data: &'a IndicatorData, table: &str) -> Option<&'a [CountryRow]> {
    match data.table(table) {
        Ok(rows) => Some(rows),
        Err(err) => {
            error!("{err}");
            None
        }
    }
}

/// Thresholds of a selected column: the fetched column options win over whatever was persisted
/// with the selection.
fn thresholds_for<'a>(
    data: &'a IndicatorData,
    table: &str,
    option: &'a ColumnOption,
) -> Option<&'a Thresholds> {
    data.thresholds(table, &option.value)
        .or(option.thresholds.as_ref())
}

/// Display name of a selected column.
fn selected_name(data: &IndicatorData, table: &str, option: &ColumnOption) -> String {
    data.option(table, &option.value)
        .unwrap_or(option)
        .display_name()
        .to_owned()
}

/// Display name of any column of a table.
fn column_name(data: &IndicatorData, table: &str, column: &str) -> String {
    data.option(table, column)
        .map(|o| o.display_name().to_owned())
        .unwrap_or_else(|| column.to_owned())
}

/// Every indicator column of every table accepted by `keep`, as named series.
/// Values stay in row order within each table; series from different tables are not
/// re-aligned by country.
fn all_series(data: &IndicatorData, keep: fn(&str) -> bool) -> Vec<IndicatorSeries> {
    let mut series = Vec::new();
    for table in data.table_names() {
        let Ok(rows) = data.table(table) else {
            continue;
        };
        for column in indicator_columns(rows, keep) {
            series.push(IndicatorSeries::new(
                column_name(data, table, &column),
                column_values(rows, &column),
            ));
        }
    }
    series
}


#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::{test_inputs::*, *};

    #[test]
    fn view_kinds_parse_case_insensitively() {
        assert_eq!(ViewKind::from_str("stacked_bar").unwrap(), ViewKind::StackedBar);
        assert_eq!(ViewKind::from_str("PCA").unwrap(), ViewKind::Pca);
        assert_eq!(ViewKind::iter().count(), 10);
        assert!(ViewKind::from_str("pie").is_err());
    }

    #[test]
    fn bin_count_is_validated() {
        let params = ViewParams {
            bin_count: 31,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MedemapError::InvalidParameter(_))
        ));
        assert!(ViewParams::default().validate().is_ok());
    }

    #[test]
    fn every_view_derives_from_sample_data() {
        let data = data();
        let selection = selection();
        let params = ViewParams::default();
        let coordinates = vec![GeoCoordinate {
            country: "Austria".into(),
            capital: None,
            latitude: serde_json::json!(48.2),
            longitude: serde_json::json!(16.4),
        }];
        let inputs = ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: Some(&coordinates),
            params: &params,
        };
        for kind in ViewKind::iter() {
            let output = derive(kind, &inputs);
            assert!(output.is_ok(), "{kind} should derive: {output:?}");
            let output = output.unwrap();
            let json = serde_json::to_value(&output).unwrap();
            assert_eq!(json["view"], kind.to_string());
        }
    }

    #[test]
    fn derivation_is_idempotent() {
        let data = data();
        let selection = selection();
        let params = ViewParams::default();
        let inputs = ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        };
        for kind in [ViewKind::Charts, ViewKind::Histogram, ViewKind::Correlation] {
            assert_eq!(derive(kind, &inputs).unwrap(), derive(kind, &inputs).unwrap());
        }
    }
}
