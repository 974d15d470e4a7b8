use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use super::{selected_name, selected_rows, thresholds_for, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    classify::{classify, Category, PolicyKind},
    geo::{country_iso3, BLANK_OVERLAY},
    COL,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChoroplethRecord {
    pub country: String,
    pub iso3: &'static str,
    pub values: BTreeMap<String, f64>,
    pub categories: BTreeMap<String, Category>,
    /// Category code of the first selected column, the colour of the map.
    pub z: u8,
}

/// Legend bounds taken from the first selected column.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ChoroplethLegend {
    pub medium_low: f64,
    pub high_medium: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChoroplethMap {
    pub table: String,
    pub title: String,
    pub columns: Vec<String>,
    pub records: Vec<ChoroplethRecord>,
    pub legend: Option<ChoroplethLegend>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ChoroplethOutput {
    pub maps: Vec<ChoroplethMap>,
    /// ISO3 codes drawn blank over every map.
    pub overlay: Vec<&'static str>,
}

pub(super) fn derive(inputs: &ViewInputs) -> ChoroplethOutput {
    let mut maps = Vec::new();
    for (table, columns) in inputs.selection.tables() {
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        let policies: Vec<_> = columns
            .iter()
            .map(|c| {
                thresholds_for(inputs.data, table, c)
                    .map(|t| t.policy(PolicyKind::MediumLowHighMedium))
            })
            .collect();

        let records = rows
            .iter()
            .filter_map(|row| {
                let Some(iso3) = country_iso3(row.country()) else {
                    warn!("ISO3 code not found for country: {}", row.country());
                    return None;
                };
                let mut values = BTreeMap::new();
                let mut categories = BTreeMap::new();
                let mut z = Category::Unavailable.code();
                for (index, column) in columns.iter().enumerate() {
                    let value = row.numeric(&column.value);
                    let category = classify(value, policies[index].as_ref());
                    if index == 0 {
                        z = category.code();
                    }
                    values.insert(column.value.clone(), value);
                    categories.insert(column.value.clone(), category);
                }
                Some(ChoroplethRecord {
                    country: row.country().to_owned(),
                    iso3,
                    values,
                    categories,
                    z,
                })
            })
            .collect();

        let legend = policies
            .first()
            .and_then(|p| p.as_ref())
            .and_then(|p| p.bounds())
            .map(|(medium_low, high_medium)| ChoroplethLegend {
                medium_low,
                high_medium,
            });
        let names: Vec<String> = columns
            .iter()
            .map(|c| selected_name(inputs.data, table, c))
            .collect();
        maps.push(ChoroplethMap {
            table: table.to_owned(),
            title: format!("{} : {}", COL::table_title(table), names.join(" | ")),
            columns: columns.iter().map(|c| c.value.clone()).collect(),
            records,
            legend,
        });
    }
    ChoroplethOutput {
        maps,
        overlay: BLANK_OVERLAY.to_vec(),
    }
}

impl ToRecords for ChoroplethOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.maps
            .iter()
            .flat_map(|map| {
                map.records.iter().map(|record| {
                    let mut feature = FeatureRecord::new()
                        .with("table", map.table.as_str())
                        .with("country", record.country.as_str())
                        .with("iso3", record.iso3)
                        .with("z", record.z);
                    for (column, value) in &record.values {
                        feature = feature.with(column, *value);
                    }
                    feature
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{test_inputs, ViewParams};

    #[test]
    fn countries_without_iso3_are_dropped() {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams::default();
        let output = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        });
        assert_eq!(output.overlay, vec!["RUS", "BLR", "UKR"]);
        assert_eq!(output.maps.len(), 2);

        let basic = &output.maps[0];
        assert_eq!(basic.title, "Basic Data : Population");
        assert_eq!(basic.records.len(), 2, "Atlantis has no ISO3 code");
        let austria = &basic.records[0];
        assert_eq!(austria.iso3, "AUT");
        assert_eq!(austria.z, 2);
        assert_eq!(austria.values["population"], 50.0);
        assert_eq!(
            basic.legend,
            Some(ChoroplethLegend {
                medium_low: 20.0,
                high_medium: 80.0
            })
        );

        let democracy = &output.maps[1];
        assert_eq!(democracy.title, "Democracy & Participation : trust");
        assert_eq!(democracy.legend, None);
        assert!(democracy.records.iter().all(|r| r.z == 0));
    }
}
