//! Indicator tables as fetched from the data API, and the sources they are fetched from.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    config::Config,
    error::{MedemapError, MedemapResult},
    geo::GeoCoordinate,
    metadata::{resolve_table, ApiColumnOption, ColumnOption, Thresholds},
    transform::parse_numeric_or_zero,
    COL,
};

/// One row of an indicator table keyed by column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct CountryRow(pub Map<String, Value>);

impl CountryRow {
    pub fn country(&self) -> &str {
        self.0
            .get(COL::COUNTRY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Value of `column` parsed permissively, 0 when missing or unparseable.
    pub fn numeric(&self, column: &str) -> f64 {
        parse_numeric_or_zero(self.0.get(column))
    }

    pub fn is_metastat(&self) -> bool {
        self.country() == COL::METASTAT
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for CountryRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// All indicator tables of a session with the column options of each table.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct IndicatorData {
    pub tables: BTreeMap<String, Vec<CountryRow>>,
    pub column_options: BTreeMap<String, Vec<ColumnOption>>,
}

impl IndicatorData {
    /// Parse the `/medemap` response: one array of rows per table plus a `columnOptions` map.
    ///
    /// The API is expected to strip the metastat row already; if one slips through it is removed
    /// here and used to resolve the options of tables the API sent none for.
    pub fn from_api_response(response: Value) -> MedemapResult<Self> {
        let Value::Object(mut object) = response else {
            return Err(MedemapError::AnyhowError(anyhow::anyhow!(
                "Indicator data response is not a JSON object"
            )));
        };

        let mut column_options: BTreeMap<String, Vec<ColumnOption>> = match object
            .remove(COL::COLUMN_OPTIONS)
        {
            Some(options) => serde_json::from_value::<BTreeMap<String, Vec<ApiColumnOption>>>(
                options,
            )?
            .into_iter()
            .map(|(table, options)| (table, options.into_iter().map(Into::into).collect()))
            .collect(),
            None => {
                warn!("Indicator data response has no {}", COL::COLUMN_OPTIONS);
                BTreeMap::new()
            }
        };

        let mut tables = BTreeMap::new();
        for (table, rows) in object {
            let Value::Array(_) = rows else {
                warn!("Skipping non-tabular entry in indicator data: {table}");
                continue;
            };
            let rows: Vec<CountryRow> = serde_json::from_value(rows)?;
            let columns = columns_of(&rows);
            let resolved = resolve_table(&columns, rows);
            column_options
                .entry(table.clone())
                .or_insert(resolved.column_options);
            tables.insert(table, resolved.rows);
        }
        info!("Loaded {} indicator tables", tables.len());
        Ok(Self {
            tables,
            column_options,
        })
    }

    /// Build the data from raw tables as stored in the database, metastat row included.
    pub fn from_raw_tables(
        raw: impl IntoIterator<Item = (String, Vec<String>, Vec<CountryRow>)>,
    ) -> Self {
        let mut data = Self::default();
        for (table, columns, rows) in raw {
            let resolved = resolve_table(&columns, rows);
            data.column_options
                .insert(table.clone(), resolved.column_options);
            data.tables.insert(table, resolved.rows);
        }
        data
    }

    pub fn table(&self, table: &str) -> MedemapResult<&[CountryRow]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| MedemapError::MissingTable(table.to_owned()))
    }

    pub fn options(&self, table: &str) -> &[ColumnOption] {
        self.column_options
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn option(&self, table: &str, column: &str) -> Option<&ColumnOption> {
        self.options(table).iter().find(|o| o.value == column)
    }

    pub fn thresholds(&self, table: &str, column: &str) -> Option<&Thresholds> {
        self.option(table, column)
            .and_then(|o| o.thresholds.as_ref())
    }

    /// Table names in presentation order: the known tables first, then any others by name.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = COL::TABLE_ORDER
            .iter()
            .copied()
            .filter(|t| self.tables.contains_key(*t))
            .collect();
        names.extend(
            self.tables
                .keys()
                .map(String::as_str)
                .filter(|t| !COL::TABLE_ORDER.contains(t)),
        );
        names
    }
}

/// Column names of a table in first-seen order.
fn columns_of(rows: &[CountryRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_owned());
            }
        }
    }
    columns
}

/// Where indicator data and coordinates come from.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    async fn fetch_indicator_data(&self) -> MedemapResult<IndicatorData>;
    async fn fetch_coordinates(&self) -> MedemapResult<Vec<GeoCoordinate>>;
}

/// Fetches from the HTTP data API.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    config: Config,
}

impl HttpDataSource {
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> MedemapResult<T> {
        debug!("GET {url}");
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|err| MedemapError::FetchFailed {
                    url: url.to_owned(),
                    reason: err.to_string(),
                })?;
        let status = response.status();
        if !status.is_success() {
            return Err(MedemapError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| MedemapError::FetchFailed {
                url: url.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl DataSource for HttpDataSource {
    async fn fetch_indicator_data(&self) -> MedemapResult<IndicatorData> {
        let response: Value = self.get_json(&self.config.indicator_data_url()).await?;
        IndicatorData::from_api_response(response)
    }

    async fn fetch_coordinates(&self) -> MedemapResult<Vec<GeoCoordinate>> {
        self.get_json(&self.config.geocoordinates_url()).await
    }
}


#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{fixtures::api_response, *};

    #[test]
    fn api_response_parses() {
        let data = IndicatorData::from_api_response(api_response()).unwrap();
        assert_eq!(data.table_names(), vec!["basic_data", "democracy"]);
        assert_eq!(data.table("basic_data").unwrap().len(), 3);
        let democracy = data.table("democracy").unwrap();
        assert_eq!(democracy.len(), 3, "stray metastat row is removed");
        assert!(democracy.iter().all(|r| !r.is_metastat()));
        assert_eq!(data.options("democracy").len(), 4);
        assert_eq!(
            data.thresholds("basic_data", "population")
                .and_then(|t| t.high_medium_threshold),
            Some(80.0)
        );
        assert!(matches!(
            data.table("supply_side"),
            Err(MedemapError::MissingTable(_))
        ));
    }

    #[test]
    fn raw_tables_resolve_metastat() {
        let rows: Vec<CountryRow> = serde_json::from_value(json!([
            {"country": "metastat", "gdp": null, "meta_gdp": "{\"eu_average\": 10}"},
            {"country": "Malta", "gdp": 12, "meta_gdp": null}
        ]))
        .unwrap();
        let columns = vec!["country".to_string(), "gdp".into(), "meta_gdp".into()];
        let data = IndicatorData::from_raw_tables([("basic_data".to_string(), columns, rows)]);
        assert_eq!(data.table("basic_data").unwrap().len(), 1);
        assert_eq!(
            data.thresholds("basic_data", "gdp").and_then(|t| t.eu_average),
            Some(10.0)
        );
    }

    #[test]
    fn country_row_accessors() {
        let row: CountryRow =
            serde_json::from_value(json!({"country": "Austria", "x": "N/A", "y": 2})).unwrap();
        assert_eq!(row.country(), "Austria");
        assert_eq!(row.numeric("x"), 0.0);
        assert_eq!(row.numeric("y"), 2.0);
        assert_eq!(row.numeric("missing"), 0.0);
        assert!(!row.is_metastat());
    }

    #[tokio::test]
    async fn http_source_fetches_both_endpoints() {
        let server = MockServer::start();
        let data_mock = server.mock(|when, then| {
            when.method(GET).path("/api/medemap");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(api_response());
        });
        let coordinates_mock = server.mock(|when, then| {
            when.method(GET).path("/api/geocoordinates");
            then.status(200).json_body(json!([
                {"country": "Austria", "capitol": "Vienna", "latitude": "48.2", "longitude": "16.4"}
            ]));
        });

        let source = HttpDataSource::new(Config {
            base_url: server.url("/api"),
        });
        let data = source.fetch_indicator_data().await.unwrap();
        assert_eq!(data.tables.len(), 2);
        let coordinates = source.fetch_coordinates().await.unwrap();
        assert_eq!(coordinates.len(), 1);
        data_mock.assert();
        coordinates_mock.assert();
    }

    #[tokio::test]
    async fn http_source_reports_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/medemap");
            then.status(500).body("Failed to fetch data");
        });
        let source = HttpDataSource::new(Config {
            base_url: server.url("/api"),
        });
        let err = source.fetch_indicator_data().await.unwrap_err();
        assert!(matches!(err, MedemapError::HttpStatus { status: 500, .. }));
    }
}
