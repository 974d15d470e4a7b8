use log::debug;
use serde::Serialize;

use super::{selected_name, selected_rows, thresholds_for, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    classify::{classify, Category, Palette, PolicyKind},
    geo::{normalize_country_name, EUROPEAN_COUNTRIES},
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PolygonRecord {
    pub country: String,
    /// Lowercased, trimmed country name used to match polygon names.
    pub key: String,
    pub value: f64,
    pub category: Category,
    pub color: &'static str,
}

/// Colouring of the country polygons by the first selected column of one table.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PolygonLayer {
    pub table: String,
    pub column: String,
    pub indicator: String,
    pub records: Vec<PolygonRecord>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct PolygonsOutput {
    pub layers: Vec<PolygonLayer>,
}

pub(super) fn derive(inputs: &ViewInputs) -> PolygonsOutput {
    let polygon_keys: Vec<String> = EUROPEAN_COUNTRIES
        .iter()
        .map(|c| normalize_country_name(c))
        .collect();
    let mut layers = Vec::new();
    for (table, columns) in inputs.selection.tables() {
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        let Some(column) = columns.first() else {
            continue;
        };
        let policy = thresholds_for(inputs.data, table, column)
            .map(|t| t.policy(PolicyKind::LowMediumHigh));
        let records = rows
            .iter()
            .filter_map(|row| {
                let key = normalize_country_name(row.country());
                if !polygon_keys.contains(&key) {
                    debug!("No polygon for country: {}", row.country());
                    return None;
                }
                let value = row.numeric(&column.value);
                let category = classify(value, policy.as_ref());
                Some(PolygonRecord {
                    country: row.country().to_owned(),
                    key,
                    value,
                    category,
                    color: category.color(Palette::RedGreenBlue),
                })
            })
            .collect();
        layers.push(PolygonLayer {
            table: table.to_owned(),
            column: column.value.clone(),
            indicator: selected_name(inputs.data, table, column),
            records,
        });
    }
    PolygonsOutput { layers }
}

impl ToRecords for PolygonsOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.layers
            .iter()
            .flat_map(|layer| {
                layer.records.iter().map(|record| {
                    FeatureRecord::new()
                        .with("table", layer.table.as_str())
                        .with("indicator", layer.indicator.as_str())
                        .with("country", record.country.as_str())
                        .with("key", record.key.as_str())
                        .with("value", record.value)
                        .with("category", record.category.code())
                        .with("color", record.color)
                })
            })
            .collect()
    }
}
