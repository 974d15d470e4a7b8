use std::collections::BTreeSet;

use serde::Serialize;

use super::{selected_name, selected_rows, FeatureRecord, ToRecords, ViewInputs};

/// Surface over countries (x) and selected indicators (y). `z[i][j]` is indicator `i` for
/// country `j`; zero or missing values are gaps.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct MeshOutput {
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub z: Vec<Vec<Option<f64>>>,
}

pub(super) fn derive(inputs: &ViewInputs) -> MeshOutput {
    let countries: Vec<String> = inputs
        .data
        .tables
        .values()
        .flatten()
        .map(|row| row.country().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut indicators = Vec::new();
    let mut z = Vec::new();
    for (table, columns) in inputs.selection.tables() {
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        for column in columns {
            indicators.push(selected_name(inputs.data, table, column));
            let cells = countries
                .iter()
                .map(|country| {
                    rows.iter()
                        .find(|row| row.country() == country)
                        .map(|row| row.numeric(&column.value))
                        .filter(|value| *value != 0.0)
                })
                .collect();
            z.push(cells);
        }
    }
    MeshOutput {
        countries,
        indicators,
        z,
    }
}

impl ToRecords for MeshOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        let mut records = Vec::new();
        for (indicator, cells) in self.indicators.iter().zip(&self.z) {
            for (country, cell) in self.countries.iter().zip(cells) {
                records.push(
                    FeatureRecord::new()
                        .with("indicator", indicator.as_str())
                        .with("country", country.as_str())
                        .with("value", *cell),
                );
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{test_inputs, ViewParams};

    #[test]
    fn zero_and_unparseable_values_are_gaps() {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams::default();
        let output = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        });
        assert_eq!(output.countries, vec!["Atlantis", "Austria", "Belgium"]);
        assert_eq!(output.indicators, vec!["Population", "trust"]);
        assert_eq!(output.z[0], vec![Some(10.0), Some(50.0), None]);
        assert_eq!(output.z[1], vec![Some(20.0), Some(61.0), Some(40.0)]);
    }
}
