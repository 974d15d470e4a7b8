use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{column_name, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    error::{MedemapError, MedemapResult},
    transform::{indicator_columns, is_stacked_indicator},
    COL,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StackedSeries {
    pub table: String,
    pub column: String,
    pub indicator: String,
    /// One value per country, clamped at zero.
    pub values: Vec<f64>,
    pub color: String,
}

/// Circular stacked bars of every indicator outside `basic_data`.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct StackedBarOutput {
    pub countries: Vec<String>,
    pub series: Vec<StackedSeries>,
    /// Per-country sum over every indicator, divided by the largest sum.
    pub normalized_totals: Vec<f64>,
}

pub(super) fn derive(inputs: &ViewInputs) -> MedemapResult<StackedBarOutput> {
    let data = inputs.data;
    let mut countries = BTreeSet::new();
    let mut columns: Vec<(&str, String, BTreeMap<String, f64>)> = Vec::new();
    for table in data.table_names() {
        if table == COL::BASIC_DATA {
            continue;
        }
        let Ok(rows) = data.table(table) else {
            continue;
        };
        for column in indicator_columns(rows, is_stacked_indicator) {
            let mut by_country = BTreeMap::new();
            for row in rows {
                countries.insert(row.country().to_owned());
                by_country.insert(row.country().to_owned(), row.numeric(&column).max(0.0));
            }
            columns.push((table, column, by_country));
        }
    }
    let countries: Vec<String> = countries.into_iter().collect();

    let count = columns.len();
    let mut series: Vec<StackedSeries> = columns
        .into_iter()
        .enumerate()
        .map(|(index, (table, column, by_country))| StackedSeries {
            indicator: column_name(data, table, &column),
            table: table.to_owned(),
            column,
            values: countries
                .iter()
                .map(|c| by_country.get(c).copied().unwrap_or(0.0))
                .collect(),
            color: format!("hsl({}, 70%, 50%)", index as f64 * 360.0 / count as f64),
        })
        .collect();

    let totals: Vec<f64> = (0..countries.len())
        .map(|i| series.iter().map(|s| s.values[i]).sum())
        .collect();
    let max_total = totals.iter().copied().fold(0.0_f64, f64::max);
    let normalized_totals = totals
        .iter()
        .map(|t| if max_total == 0.0 { 0.0 } else { t / max_total })
        .collect();

    // A `table.column` key picks exactly one series; an indicator name keeps every series
    // sharing it.
    if let Some(filter) = &inputs.params.indicator_filter {
        let by_key = series.iter().any(|s| &s.key() == filter);
        if !by_key && !series.iter().any(|s| &s.indicator == filter) {
            return Err(MedemapError::InvalidParameter(format!(
                "unknown indicator: {filter}"
            )));
        }
        series.retain(|s| {
            if by_key {
                &s.key() == filter
            } else {
                &s.indicator == filter
            }
        });
    }

    Ok(StackedBarOutput {
        countries,
        series,
        normalized_totals,
    })
}

impl StackedSeries {
    /// `table.column`, unique across the output.
    pub fn key(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

impl ToRecords for StackedBarOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.countries
            .iter()
            .enumerate()
            .map(|(i, country)| {
                let mut record = FeatureRecord::new()
                    .with("country", country.as_str())
                    .with("normalized_total", self.normalized_totals[i]);
                for series in &self.series {
                    let name = if record.properties.contains_key(&series.indicator) {
                        series.key()
                    } else {
                        series.indicator.clone()
                    };
                    record = record.with(&name, series.values[i]);
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        data::{CountryRow, IndicatorData},
        selection::Selection,
        views::{test_inputs, ViewParams},
    };

    fn derive_with(params: ViewParams) -> MedemapResult<StackedBarOutput> {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        })
    }

    #[test]
    fn stacks_every_non_basic_indicator() {
        let output = derive_with(ViewParams::default()).unwrap();
        assert_eq!(output.countries, vec!["Atlantis", "Austria", "Belgium"]);
        let names: Vec<&str> = output.series.iter().map(|s| s.indicator.as_str()).collect();
        assert_eq!(names, vec!["trust", "participation"], "year and basic_data excluded");
        assert_eq!(output.series[1].color, "hsl(180, 70%, 50%)");
        // Totals 23, 66, 40.
        assert_eq!(output.normalized_totals[1], 1.0);
        assert!((output.normalized_totals[0] - 23.0 / 66.0).abs() < 1e-12);
    }

    #[test]
    fn indicator_filter_isolates_one_series() {
        let output = derive_with(ViewParams {
            indicator_filter: Some("participation".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(output.series.len(), 1);
        assert_eq!(output.series[0].color, "hsl(180, 70%, 50%)");
        assert_eq!(output.series[0].values, vec![3.0, 5.0, 0.0]);

        let unknown = derive_with(ViewParams {
            indicator_filter: Some("nope".into()),
            ..Default::default()
        });
        assert!(matches!(unknown, Err(MedemapError::InvalidParameter(_))));
    }

    #[test]
    fn filter_by_key_separates_tables_sharing_a_name() {
        let rows = |values: [i64; 2]| -> Vec<CountryRow> {
            serde_json::from_value(json!([
                {"country": "Austria", "trust": values[0]},
                {"country": "Belgium", "trust": values[1]}
            ]))
            .unwrap()
        };
        let columns = vec!["country".to_string(), "trust".to_string()];
        let data = IndicatorData::from_raw_tables([
            (COL::DEMOCRACY.to_string(), columns.clone(), rows([1, 2])),
            (COL::SUPPLY_SIDE.to_string(), columns, rows([3, 4])),
        ]);
        let selection = Selection::new();
        let derive_filtered = |filter: &str| {
            let params = ViewParams {
                indicator_filter: Some(filter.into()),
                ..Default::default()
            };
            derive(&ViewInputs {
                data: &data,
                selection: &selection,
                coordinates: None,
                params: &params,
            })
            .unwrap()
        };

        let by_name = derive_filtered("trust");
        assert_eq!(by_name.series.len(), 2);
        let record = &by_name.records()[0];
        assert_eq!(record.properties["trust"], json!(1.0));
        assert_eq!(record.properties["supply_side.trust"], json!(3.0));

        let by_key = derive_filtered("supply_side.trust");
        assert_eq!(by_key.series.len(), 1);
        assert_eq!(by_key.series[0].table, COL::SUPPLY_SIDE);
        assert_eq!(by_key.series[0].values, vec![3.0, 4.0]);
    }
}
