use serde::Serialize;

use super::{selected_name, selected_rows, thresholds_for, FeatureRecord, ToRecords, ViewInputs};
use crate::{
    classify::{classify, Category, Palette, PolicyKind},
    COL,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub country: String,
    pub value: f64,
    pub category: Category,
    pub color: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub column: String,
    pub indicator: String,
    pub bars: Vec<ChartBar>,
}

/// One bar chart per table with a series per selected column.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Chart {
    pub table: String,
    pub title: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ChartsOutput {
    pub charts: Vec<Chart>,
}

pub(super) fn derive(inputs: &ViewInputs) -> ChartsOutput {
    let mut charts = Vec::new();
    for (table, columns) in inputs.selection.tables() {
        let Some(rows) = selected_rows(inputs.data, table) else {
            continue;
        };
        let series: Vec<ChartSeries> = columns
            .iter()
            .map(|column| {
                let policy = thresholds_for(inputs.data, table, column)
                    .map(|t| t.policy(PolicyKind::MediumLowHighMedium));
                let bars = rows
                    .iter()
                    .map(|row| {
                        let value = row.numeric(&column.value);
                        let category = classify(value, policy.as_ref());
                        ChartBar {
                            country: row.country().to_owned(),
                            value,
                            category,
                            color: category.color(Palette::TrafficLight),
                        }
                    })
                    .collect();
                ChartSeries {
                    column: column.value.clone(),
                    indicator: selected_name(inputs.data, table, column),
                    bars,
                }
            })
            .collect();
        let names: Vec<&str> = series.iter().map(|s| s.indicator.as_str()).collect();
        charts.push(Chart {
            table: table.to_owned(),
            title: format!("{} : {}", COL::table_title(table), names.join(" | ")),
            series,
        });
    }
    ChartsOutput { charts }
}

impl ToRecords for ChartsOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        let mut records = Vec::new();
        for chart in &self.charts {
            for series in &chart.series {
                for bar in &series.bars {
                    records.push(
                        FeatureRecord::new()
                            .with("table", chart.table.as_str())
                            .with("indicator", series.indicator.as_str())
                            .with("country", bar.country.as_str())
                            .with("value", bar.value)
                            .with("color", bar.color),
                    );
                }
            }
        }
        records
    }
}
