use std::f64::consts::PI;

use log::warn;
use serde::Serialize;

use super::{selected_name, selected_rows, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    error::{MedemapError, MedemapResult},
    geo::CoordinateIndex,
    transform::{column_values, max_abs, normalize},
};

/// Height in metres of a bar at the column maximum.
pub const MAX_BAR_HEIGHT: f64 = 500_000.0;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GlobeBar {
    pub country: String,
    pub table: String,
    pub column: String,
    pub indicator: String,
    pub value: f64,
    pub normalized: f64,
    /// Bar height in metres.
    pub height: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Hue in `[0, 1)`, one per selected column.
    pub hue: f64,
    pub label: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct GlobeOutput {
    pub total_columns: usize,
    pub bars: Vec<GlobeBar>,
    /// Countries dropped because they have no usable coordinates.
    pub missing_countries: Vec<String>,
}

pub(super) fn derive(inputs: &ViewInputs) -> MedemapResult<GlobeOutput> {
    let Some(coordinates) = inputs.coordinates else {
        return Err(MedemapError::CannotCompute(
            "the globe view needs the coordinate reference table".into(),
        ));
    };
    let index = CoordinateIndex::new(coordinates);
    let total_columns = inputs.selection.total();
    let mut output = GlobeOutput {
        total_columns,
        ..Default::default()
    };
    if total_columns == 0 {
        return Ok(output);
    }
    let angle_step = 2.0 * PI / total_columns as f64;
    let spacing = inputs.params.bar_spacing;

    let mut column_index = 0;
    for (table, columns) in inputs.selection.tables() {
        let first_index = column_index;
        column_index += columns.len();
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        let maxima: Vec<f64> = columns
            .iter()
            .map(|c| max_abs(&column_values(rows, &c.value)))
            .collect();
        let names: Vec<String> = columns
            .iter()
            .map(|c| selected_name(inputs.data, table, c))
            .collect();

        for row in rows {
            let country = row.country();
            let Some(point) = index.lookup(country) else {
                if !output.missing_countries.iter().any(|c| c == country) {
                    output.missing_countries.push(country.to_owned());
                }
                continue;
            };
            for (offset, column) in columns.iter().enumerate() {
                let position = first_index + offset;
                let value = row.numeric(&column.value);
                let normalized = normalize(value, maxima[offset]);
                let angle = position as f64 * angle_step;
                output.bars.push(GlobeBar {
                    country: country.to_owned(),
                    table: table.to_owned(),
                    column: column.value.clone(),
                    indicator: names[offset].clone(),
                    value,
                    normalized,
                    height: normalized * MAX_BAR_HEIGHT,
                    longitude: point.x() + angle.cos() * spacing,
                    latitude: point.y() + angle.sin() * spacing,
                    hue: position as f64 / total_columns as f64,
                    label: format!("{}", value.ceil()),
                });
            }
        }
    }
    if !output.missing_countries.is_empty() {
        warn!(
            "Globe view dropped {} countries without coordinates",
            output.missing_countries.len()
        );
    }
    Ok(output)
}

impl ToRecords for GlobeOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.bars
            .iter()
            .map(|bar| {
                FeatureRecord::new()
                    .with("country", bar.country.as_str())
                    .with("table", bar.table.as_str())
                    .with("column", bar.column.as_str())
                    .with("indicator", bar.indicator.as_str())
                    .with("value", bar.value)
                    .with("normalized", bar.normalized)
                    .with("height", bar.height)
                    .with("hue", bar.hue)
                    .with("label", bar.label.as_str())
                    .at(geo::Point::new(bar.longitude, bar.latitude))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        geo::GeoCoordinate,
        views::{test_inputs, ViewParams},
    };

    fn coordinates() -> Vec<GeoCoordinate> {
        ["Austria", "Belgium"]
            .iter()
            .map(|country| GeoCoordinate {
                country: country.to_string(),
                capital: None,
                latitude: json!("10.0"),
                longitude: json!(20.0),
            })
            .collect()
    }

    #[test]
    fn bars_are_placed_around_the_capital() {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams {
            bar_spacing: 1.0,
            ..Default::default()
        };
        let coordinates = coordinates();
        let output = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: Some(&coordinates),
            params: &params,
        })
        .unwrap();

        assert_eq!(output.total_columns, 2);
        // Atlantis has no coordinates and is dropped from both tables.
        assert_eq!(output.missing_countries, vec!["Atlantis".to_string()]);
        assert_eq!(output.bars.len(), 4);

        let austria_population = &output.bars[0];
        assert_eq!(austria_population.column, "population");
        assert_eq!(austria_population.indicator, "Population");
        assert_eq!(austria_population.normalized, 1.0);
        assert_eq!(austria_population.height, MAX_BAR_HEIGHT);
        assert!((austria_population.longitude - 21.0).abs() < 1e-12);
        assert!((austria_population.latitude - 10.0).abs() < 1e-12);
        assert_eq!(austria_population.hue, 0.0);
        assert_eq!(austria_population.label, "50");

        let belgium_population = &output.bars[1];
        assert_eq!(belgium_population.value, 0.0, "N/A parses to zero");
        assert_eq!(belgium_population.height, 0.0);

        let austria_trust = &output.bars[2];
        assert_eq!(austria_trust.hue, 0.5);
        assert!((austria_trust.longitude - 19.0).abs() < 1e-12);
        assert!(output.bars.iter().all(|b| (0.0..=1.0).contains(&b.normalized)));
    }

    #[test]
    fn globe_needs_coordinates() {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams::default();
        let result = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        });
        assert!(matches!(result, Err(MedemapError::CannotCompute(_))));
    }
}
