//! Statistics over whole indicator columns: Pearson correlation, PCA and a kernel density
//! estimate of the PCA eigenvalue spectrum.

use itertools::Itertools;
use log::{debug, warn};
use nalgebra::{DMatrix, SymmetricEigen};
use nonempty::NonEmpty;
use serde::Serialize;

use crate::error::{MedemapError, MedemapResult};

/// Number of points the spectral density is evaluated at.
pub const SPECTRAL_DENSITY_POINTS: usize = 100;

/// One indicator column over every country of its table.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub label: String,
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// Pearson correlation over the first `min(len x, len y)` values. A zero denominator, including
/// a constant series, gives 0.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y).take(n) {
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_x2 += a * a;
        sum_y2 += b * b;
    }
    let n = n as f64;
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Symmetric matrix of pairwise correlations. The upper triangle is computed and mirrored.
pub fn correlation_matrix(series: &[IndicatorSeries]) -> Vec<Vec<f64>> {
    let k = series.len();
    let mut matrix = vec![vec![0.0; k]; k];
    for (i, j) in (0..k).tuple_combinations() {
        let r = pearson(&series[i].values, &series[j].values);
        matrix[i][j] = r;
        matrix[j][i] = r;
    }
    for (i, s) in series.iter().enumerate() {
        matrix[i][i] = pearson(&s.values, &s.values);
    }
    matrix
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Unbiased sample standard deviation; 0 with fewer than two values.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Density curve sampled at evenly spaced points.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct SpectralDensity {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Epanechnikov kernel density estimate of `data`, evaluated at `points` evenly spaced points
/// from its minimum to its maximum. The bandwidth is a tenth of the range, or 1 when every value
/// is equal.
pub fn epanechnikov_kde(data: &[f64], points: usize) -> SpectralDensity {
    if data.is_empty() || points == 0 {
        return SpectralDensity::default();
    }
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = max - min;
    let bandwidth = if range > 0.0 { range / 10.0 } else { 1.0 };
    let step = if points > 1 {
        range / (points - 1) as f64
    } else {
        0.0
    };
    let x: Vec<f64> = (0..points).map(|i| min + step * i as f64).collect();
    let y = x
        .iter()
        .map(|xv| {
            data.iter()
                .map(|xi| {
                    let u = (xv - xi) / bandwidth;
                    if u.abs() <= 1.0 {
                        0.75 * (1.0 - u * u) / bandwidth
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
                / data.len() as f64
        })
        .collect();
    SpectralDensity { x, y }
}

/// Principal component analysis of standardized indicators.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Pca {
    /// Indicators that took part, in input order.
    pub labels: NonEmpty<String>,
    /// Indicators left out because they have zero variance.
    pub dropped: Vec<String>,
    /// Number of aligned samples used.
    pub samples: usize,
    /// Eigenvalues of the covariance matrix, largest first.
    pub eigenvalues: Vec<f64>,
    /// Share of the total variance per component.
    pub explained_variance: Vec<f64>,
    /// One row per sample, one column per component.
    pub scores: Vec<Vec<f64>>,
    /// One row per component, one column per indicator.
    pub loadings: Vec<Vec<f64>>,
    pub spectral_density: SpectralDensity,
}

pub fn pca(series: &[IndicatorSeries]) -> MedemapResult<Pca> {
    let Some(samples) = series.iter().map(|s| s.values.len()).min() else {
        return Err(MedemapError::CannotCompute("no indicators to analyse".into()));
    };
    if series.iter().any(|s| s.values.len() != samples) {
        debug!("Truncating indicators to {samples} aligned samples");
    }
    if samples < 2 {
        return Err(MedemapError::CannotCompute(format!(
            "PCA needs at least two samples, found {samples}"
        )));
    }

    let mut labels = Vec::new();
    let mut dropped = Vec::new();
    let mut columns: Vec<(Vec<f64>, f64, f64)> = Vec::new();
    for s in series {
        let values = &s.values[..samples];
        let std = standard_deviation(values);
        if std == 0.0 || !std.is_finite() {
            warn!("Dropping zero-variance indicator from PCA: {}", s.label);
            dropped.push(s.label.clone());
        } else {
            labels.push(s.label.clone());
            columns.push((values.to_vec(), mean(values), std));
        }
    }
    let Some(labels) = NonEmpty::from_vec(labels) else {
        return Err(MedemapError::CannotCompute(
            "every indicator has zero variance".into(),
        ));
    };

    let features = columns.len();
    let z = DMatrix::from_fn(samples, features, |i, j| {
        let (values, m, std) = &columns[j];
        (values[i] - m) / std
    });
    let covariance = (z.transpose() * &z) / (samples - 1) as f64;
    let eigen = SymmetricEigen::new(covariance);

    let order: Vec<usize> = (0..features)
        .sorted_by(|a, b| eigen.eigenvalues[*b].total_cmp(&eigen.eigenvalues[*a]))
        .collect();
    let eigenvalues: Vec<f64> = order.iter().map(|k| eigen.eigenvalues[*k]).collect();
    let vectors = DMatrix::from_fn(features, features, |i, k| eigen.eigenvectors[(i, order[k])]);

    let total: f64 = eigenvalues.iter().sum();
    let explained_variance = eigenvalues
        .iter()
        .map(|v| if total == 0.0 { 0.0 } else { v / total })
        .collect();

    let scores = z * &vectors;
    let loadings = vectors.transpose();
    let spectral_density = epanechnikov_kde(&eigenvalues, SPECTRAL_DENSITY_POINTS);

    Ok(Pca {
        labels,
        dropped,
        samples,
        explained_variance,
        scores: rows_of(&scores),
        loadings: rows_of(&loadings),
        eigenvalues,
        spectral_density,
    })
}

fn rows_of(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
