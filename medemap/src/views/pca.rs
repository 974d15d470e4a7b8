use serde::Serialize;

use super::{all_series, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    error::MedemapResult,
    stats::{pca, Pca},
    transform::is_pca_indicator,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PcaOutput {
    #[serde(flatten)]
    pub pca: Pca,
}

pub(super) fn derive(inputs: &ViewInputs) -> MedemapResult<PcaOutput> {
    let series = all_series(inputs.data, is_pca_indicator);
    Ok(PcaOutput { pca: pca(&series)? })
}

impl ToRecords for PcaOutput {
    /// One record per component with its eigenvalue, explained variance and loadings.
    fn records(&self) -> Vec<FeatureRecord> {
        self.pca
            .loadings
            .iter()
            .enumerate()
            .map(|(k, loadings)| {
                let mut record = FeatureRecord::new()
                    .with("component", format!("PC{}", k + 1))
                    .with("eigenvalue", self.pca.eigenvalues[k])
                    .with("explained_variance", self.pca.explained_variance[k]);
                for (label, loading) in self.pca.labels.iter().zip(loadings) {
                    record = record.with(label, *loading);
                }
                record
            })
            .collect()
    }
}
