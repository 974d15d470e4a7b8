//! This module stores the column names and table names shared by the indicator tables, and the
//! field names of the per-column metadata blobs. Note that this must be synchronised with the
//! schema served by the data API!

pub const COUNTRY: &str = "country";
pub const YEAR: &str = "year";
pub const NO: &str = "no";
pub const ACCESSION: &str = "accession";

/// Sentinel value of the `country` column for the row carrying per-column metadata.
pub const METASTAT: &str = "metastat";
/// Prefix of the columns in the metastat row holding serialized metadata.
pub const META_PREFIX: &str = "meta_";

/// Key of the column options map in the data API response.
pub const COLUMN_OPTIONS: &str = "columnOptions";

pub const EU_AVERAGE: &str = "eu_average";
pub const EU_STANDARD_DEVIATION: &str = "eu_standard_deviation";
pub const HIGH_MEDIUM_THRESHOLD: &str = "high_medium_threshold";
pub const MEDIUM_LOW_THRESHOLD: &str = "medium_low_threshold";
pub const LOW_THRESHOLD: &str = "low_threshold";
pub const MEDIUM_THRESHOLD: &str = "medium_threshold";
pub const HIGH_THRESHOLD: &str = "high_threshold";
pub const YEAR_OF_VALIDITY: &str = "year_of_validity";
pub const INDICATOR: &str = "indicator";
pub const SOURCE: &str = "source";
pub const ORIGINAL_NAME: &str = "original_name";

pub const BASIC_DATA: &str = "basic_data";
pub const DEMOCRACY: &str = "democracy";
pub const LEGAL_FRAMEWORK_HUMAN_DIGNITY: &str = "legal_framework_human_dignity";
pub const LEGAL_FRAMEWORK_FREEDOM: &str = "legal_framework_freedom";
pub const LEGAL_FRAMEWORK_PLURALISM: &str = "legal_framework_pluralism";
pub const LEGAL_FRAMEWORK_EQUALITY: &str = "legal_framework_equality";
pub const LEGAL_FRAMEWORK_RULE_OF_LAW: &str = "legal_framework_rule_of_law";
pub const SUPPLY_SIDE: &str = "supply_side";
pub const DEMAND_SIDE_MEDIA_USE: &str = "demand_side_media_use";
pub const DEMAND_SIDE_TRUST_IN_MEDIA: &str = "demand_side_trust_in_media";

/// The ten indicator tables, in the order they are presented for selection.
pub const TABLE_ORDER: [&str; 10] = [
    BASIC_DATA,
    DEMOCRACY,
    LEGAL_FRAMEWORK_HUMAN_DIGNITY,
    LEGAL_FRAMEWORK_FREEDOM,
    LEGAL_FRAMEWORK_PLURALISM,
    LEGAL_FRAMEWORK_EQUALITY,
    LEGAL_FRAMEWORK_RULE_OF_LAW,
    SUPPLY_SIDE,
    DEMAND_SIDE_MEDIA_USE,
    DEMAND_SIDE_TRUST_IN_MEDIA,
];

/// Columns of `basic_data` that may be selected as indicators.
pub const BASIC_DATA_SELECTABLE: [&str; 7] = [
    "population",
    "area",
    "gdp",
    "gdp_per_capita",
    "meps_2020",
    "meps_2024",
    "hdi_2023_udi",
];

/// Name of the column holding the metadata for `column` in the metastat row.
pub fn meta_column(column: &str) -> String {
    format!("{META_PREFIX}{column}")
}

/// Human readable title for a table. Unknown tables fall back to the table name with underscores
/// replaced by spaces, upper-cased.
pub fn table_title(table: &str) -> String {
    match table {
        BASIC_DATA => "Basic Data".into(),
        DEMOCRACY => "Democracy & Participation".into(),
        LEGAL_FRAMEWORK_HUMAN_DIGNITY => "Legal Framework : Human Dignity".into(),
        LEGAL_FRAMEWORK_FREEDOM => "Legal Framework : Freedom".into(),
        LEGAL_FRAMEWORK_PLURALISM => "Legal Framework : Pluralism".into(),
        LEGAL_FRAMEWORK_EQUALITY => "Legal Framework : Equality".into(),
        LEGAL_FRAMEWORK_RULE_OF_LAW => "Legal Framework : Rule of Law".into(),
        SUPPLY_SIDE => "Supply Side".into(),
        DEMAND_SIDE_MEDIA_USE => "Demand Side : Media Use".into(),
        DEMAND_SIDE_TRUST_IN_MEDIA => "Demand Side : Trust in Media".into(),
        other => other.replace('_', " ").to_uppercase(),
    }
}
