use serde::Serialize;

use super::{all_series, FeatureRecord, ToRecords, ViewInputs};
use crate::{stats::correlation_matrix, transform::is_correlation_indicator};

/// Pairwise correlation of every indicator column of every table.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct CorrelationOutput {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
}

pub(super) fn derive(inputs: &ViewInputs) -> CorrelationOutput {
    let series = all_series(inputs.data, is_correlation_indicator);
    CorrelationOutput {
        matrix: correlation_matrix(&series),
        labels: series.into_iter().map(|s| s.label).collect(),
    }
}

impl ToRecords for CorrelationOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.labels
            .iter()
            .zip(&self.matrix)
            .map(|(label, row)| {
                let mut record = FeatureRecord::new().with("indicator", label.as_str());
                for (other, r) in self.labels.iter().zip(row) {
                    record = record.with(other, *r);
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{test_inputs, ViewParams};

    #[test]
    fn matrix_covers_every_indicator() {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams::default();
        let output = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        });
        assert_eq!(
            output.labels,
            vec!["Population", "area", "currency", "trust", "participation"]
        );
        let k = output.labels.len();
        assert_eq!(output.matrix.len(), k);
        for i in 0..k {
            for j in 0..k {
                assert_eq!(output.matrix[i][j], output.matrix[j][i]);
            }
        }
        // Currency never parses, so it correlates with nothing.
        assert!(output.matrix[2].iter().all(|r| *r == 0.0));
        assert!((output.matrix[3][3] - 1.0).abs() < 1e-9);
    }
}
