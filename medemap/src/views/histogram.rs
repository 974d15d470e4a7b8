use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::{selected_name, selected_rows, thresholds_for, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    classify::{classify, Palette, PolicyKind},
    transform::column_values,
};

/// How histogram bins are coloured.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum HistogramColorMode {
    /// Lightness of a single hue, darker for higher values.
    Hue,
    /// Category colour of the bin midpoint.
    Thresholds,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
    pub color: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Histogram {
    pub table: String,
    pub column: String,
    pub indicator: String,
    pub bins: Vec<Bin>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct HistogramOutput {
    pub histograms: Vec<Histogram>,
}

/// Count `values` into `bin_count` equal-width bins spanning their range. The maximum falls into
/// the last bin; when every value is equal they all fall into the first.
pub fn bin_values(values: &[f64], bin_count: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bin_count == 0 {
        return Vec::new();
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let width = (max - min) / bin_count as f64;
    let mut counts = vec![0; bin_count];
    for value in values {
        let index = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        counts[index] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            (
                min + i as f64 * width,
                min + (i + 1) as f64 * width,
                count,
            )
        })
        .collect()
}

fn hue_color(value: f64, min: f64, max: f64, hue: f64, (min_l, max_l): (f64, f64)) -> String {
    let ratio = if max > min {
        (value - min) / (max - min)
    } else {
        0.0
    };
    let lightness = max_l - ratio * (max_l - min_l);
    format!("hsl({hue}, 70%, {lightness}%)")
}

pub(super) fn derive(inputs: &ViewInputs) -> HistogramOutput {
    let params = inputs.params;
    let mut histograms = Vec::new();
    for (table, columns) in inputs.selection.tables() {
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        for column in columns {
            let values = column_values(rows, &column.value);
            let policy = thresholds_for(inputs.data, table, column)
                .map(|t| t.policy(PolicyKind::MediumLowHighMedium));
            let (min, max) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(*v), hi.max(*v))
                });
            let bins = bin_values(&values, params.bin_count)
                .into_iter()
                .map(|(start, end, count)| {
                    let midpoint = (start + end) / 2.0;
                    let color = match params.color_mode {
                        HistogramColorMode::Thresholds => classify(midpoint, policy.as_ref())
                            .color(Palette::TrafficLight)
                            .to_owned(),
                        HistogramColorMode::Hue => {
                            hue_color(midpoint, min, max, params.color_hue, params.color_range)
                        }
                    };
                    Bin {
                        start,
                        end,
                        count,
                        color,
                    }
                })
                .collect::<Vec<_>>();
            debug!("Histogram for {table}.{}: {} bins", column.value, bins.len());
            histograms.push(Histogram {
                table: table.to_owned(),
                column: column.value.clone(),
                indicator: selected_name(inputs.data, table, column),
                bins,
            });
        }
    }
    HistogramOutput { histograms }
}

impl ToRecords for HistogramOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.histograms
            .iter()
            .flat_map(|histogram| {
                histogram.bins.iter().map(|bin| {
                    FeatureRecord::new()
                        .with("table", histogram.table.as_str())
                        .with("indicator", histogram.indicator.as_str())
                        .with("bin_start", bin.start)
                        .with("bin_end", bin.end)
                        .with("count", bin.count)
                        .with("color", bin.color.as_str())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::ColumnOption,
        selection::Selection,
        views::{test_inputs, ViewParams},
        COL,
    };

    #[test]
    fn maximum_lands_in_last_bin() {
        let bins = bin_values(&[0.0, 1.0, 2.0, 9.9, 10.0], 5);
        let counts: Vec<usize> = bins.iter().map(|b| b.2).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 2]);
        assert_eq!(bins[0].0, 0.0);
        assert_eq!(bins[4].1, 10.0);
        assert_eq!(counts.iter().sum::<usize>(), 5);
    }

    #[test]
    fn equal_values_fill_the_first_bin() {
        let bins = bin_values(&[3.0, 3.0, 3.0], 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].2, 3);
        assert!(bins[1..].iter().all(|b| b.2 == 0));
        assert!(bin_values(&[], 5).is_empty());
    }

    #[test]
    fn hue_mode_darkens_higher_values() {
        assert_eq!(hue_color(0.0, 0.0, 10.0, 210.0, (30.0, 70.0)), "hsl(210, 70%, 70%)");
        assert_eq!(hue_color(10.0, 0.0, 10.0, 210.0, (30.0, 70.0)), "hsl(210, 70%, 30%)");
        assert_eq!(hue_color(5.0, 5.0, 5.0, 120.0, (30.0, 70.0)), "hsl(120, 70%, 70%)");
    }

    #[test]
    fn threshold_mode_colours_bin_midpoints() {
        let data = test_inputs::data();
        let selection = Selection::new()
            .with_table(COL::BASIC_DATA, vec![ColumnOption::new("population")]);
        let params = ViewParams {
            bin_count: 5,
            color_mode: HistogramColorMode::Thresholds,
            ..Default::default()
        };
        let output = derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        });
        let histogram = &output.histograms[0];
        assert_eq!(histogram.indicator, "Population");
        // Values 0, 10, 50 in bins of width 10: midpoints 5, 15, 25, 35, 45.
        let colors: Vec<&str> = histogram.bins.iter().map(|b| b.color.as_str()).collect();
        assert_eq!(colors, vec!["red", "red", "orange", "orange", "orange"]);
        let counts: Vec<usize> = histogram.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 0, 1]);
    }
}
