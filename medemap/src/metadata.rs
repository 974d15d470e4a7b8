//! Per-column metadata: thresholds parsed from the metastat row and the column options built from
//! them.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    classify::{PolicyKind, ThresholdPolicy},
    data::CountryRow,
    COL,
};

/// Metadata attached to one indicator column. Every field is optional since the upstream blobs are
/// hand maintained and frequently incomplete.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Thresholds {
    pub eu_average: Option<f64>,
    pub eu_standard_deviation: Option<f64>,
    pub high_medium_threshold: Option<f64>,
    pub medium_low_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_threshold: Option<f64>,
    pub year_of_validity: Option<f64>,
    pub indicator: Option<String>,
    pub source: Option<String>,
    pub original_name: Option<String>,
}

fn numeric_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    let value = match object.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn text_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

impl Thresholds {
    /// Extract and validate the known fields of a parsed metadata blob. Returns `None` when the
    /// value is not an object or carries none of the known fields.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let thresholds = Self {
            eu_average: numeric_field(object, COL::EU_AVERAGE),
            eu_standard_deviation: numeric_field(object, COL::EU_STANDARD_DEVIATION),
            high_medium_threshold: numeric_field(object, COL::HIGH_MEDIUM_THRESHOLD),
            medium_low_threshold: numeric_field(object, COL::MEDIUM_LOW_THRESHOLD),
            low_threshold: numeric_field(object, COL::LOW_THRESHOLD),
            medium_threshold: numeric_field(object, COL::MEDIUM_THRESHOLD),
            high_threshold: numeric_field(object, COL::HIGH_THRESHOLD),
            year_of_validity: numeric_field(object, COL::YEAR_OF_VALIDITY),
            indicator: text_field(object, COL::INDICATOR),
            source: text_field(object, COL::SOURCE),
            original_name: text_field(object, COL::ORIGINAL_NAME),
        };
        (thresholds != Self::default()).then_some(thresholds)
    }

    /// Build the classification policy of the given kind from these thresholds.
    pub fn policy(&self, kind: PolicyKind) -> ThresholdPolicy {
        match kind {
            PolicyKind::LowMediumHigh => ThresholdPolicy::LowMediumHigh {
                low: self.low_threshold,
                medium: self.medium_threshold,
            },
            PolicyKind::MediumLowHighMedium => ThresholdPolicy::MediumLowHighMedium {
                medium_low: self.medium_low_threshold,
                high_medium: self.high_medium_threshold,
            },
        }
    }
}

/// One selectable indicator column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnOption {
    /// Raw column key in the indicator table.
    pub value: String,
    /// Display fallback when no indicator name is known.
    pub label: String,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

impl ColumnOption {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            label: value.to_owned(),
            thresholds: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// The name shown for this indicator: the metadata indicator name, else the label, else the
    /// raw column key.
    pub fn display_name(&self) -> &str {
        self.thresholds
            .as_ref()
            .and_then(|t| t.indicator.as_deref())
            .filter(|name| !name.is_empty())
            .or_else(|| Some(self.label.as_str()).filter(|label| !label.is_empty()))
            .unwrap_or(&self.value)
    }

    pub fn policy(&self, kind: PolicyKind) -> Option<ThresholdPolicy> {
        self.thresholds.as_ref().map(|t| t.policy(kind))
    }
}

/// Parse one `meta_<column>` cell. Strings are parsed as JSON, objects are used directly; a
/// malformed blob is logged and treated as absent.
fn thresholds_from_cell(meta_column: &str, cell: Option<&Value>) -> Option<Thresholds> {
    match cell? {
        Value::Null => None,
        Value::String(raw) if raw.trim().is_empty() => None,
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => Thresholds::from_value(&value),
            Err(err) => {
                error!("Error parsing JSON for {meta_column}: {err}");
                None
            }
        },
        value @ Value::Object(_) => Thresholds::from_value(value),
        other => {
            warn!("Unexpected metadata for {meta_column}: {other}");
            None
        }
    }
}

/// Build the column options of one table from its column list and its metastat row.
///
/// Columns prefixed with `meta_` are skipped. The result only depends on the inputs, so this can
/// be rerun on every fetch.
pub fn resolve_column_options(columns: &[String], metastat: Option<&CountryRow>) -> Vec<ColumnOption> {
    columns
        .iter()
        .filter(|column| !column.starts_with(COL::META_PREFIX))
        .map(|column| {
            let meta_column = COL::meta_column(column);
            let thresholds =
                metastat.and_then(|row| thresholds_from_cell(&meta_column, row.get(&meta_column)));
            ColumnOption {
                value: column.clone(),
                label: column.clone(),
                thresholds,
            }
        })
        .collect()
}

/// Separate the metastat row from the real country rows. If several metastat rows are present
/// the first one wins.
pub fn split_metastat(rows: Vec<CountryRow>) -> (Vec<CountryRow>, Option<CountryRow>) {
    let mut metastat = None;
    let mut countries = Vec::with_capacity(rows.len());
    for row in rows {
        if row.is_metastat() {
            if metastat.is_none() {
                metastat = Some(row);
            } else {
                warn!("Ignoring duplicate metastat row");
            }
        } else {
            countries.push(row);
        }
    }
    (countries, metastat)
}

/// A table with its metastat row split off and its column options resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub rows: Vec<CountryRow>,
    pub column_options: Vec<ColumnOption>,
}

/// Resolve a raw table, i.e. rows as stored including the metastat row.
pub fn resolve_table(columns: &[String], rows: Vec<CountryRow>) -> ResolvedTable {
    let (rows, metastat) = split_metastat(rows);
    if metastat.is_none() {
        debug!("No metastat row present, thresholds will be unavailable");
    }
    let column_options = resolve_column_options(columns, metastat.as_ref());
    ResolvedTable {
        rows,
        column_options,
    }
}

/// Wire format of a column option as served by the data API, where `meta` is already parsed.
#[derive(Deserialize, Debug, Clone)]
pub struct ApiColumnOption {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub meta: Option<Value>,
}

impl From<ApiColumnOption> for ColumnOption {
    fn from(option: ApiColumnOption) -> Self {
        let meta_column = COL::meta_column(&option.value);
        let thresholds = thresholds_from_cell(&meta_column, option.meta.as_ref());
        Self {
            label: option.label.unwrap_or_else(|| option.value.clone()),
            value: option.value,
            thresholds,
        }
    }
}

/// Options offered for selection in a table: `year` and `country` are never selectable,
/// `basic_data` is restricted to a fixed list, and labels use the indicator name when known.
pub fn selectable_options(table: &str, options: &[ColumnOption]) -> Vec<ColumnOption> {
    options
        .iter()
        .filter(|option| option.value != COL::YEAR && option.value != COL::COUNTRY)
        .filter(|option| {
            table != COL::BASIC_DATA || COL::BASIC_DATA_SELECTABLE.contains(&option.value.as_str())
        })
        .map(|option| ColumnOption {
            label: option.display_name().to_owned(),
            ..option.clone()
        })
        .collect()
}
