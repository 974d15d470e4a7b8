use std::sync::Arc;

use log::debug;

use crate::{
    config::Config,
    data::{HttpDataSource, IndicatorData},
    error::{MedemapError, MedemapResult},
    metadata::{selectable_options, ColumnOption},
    selection::SelectionOutcome,
    storage::{DurableStorage, MemoryStorage},
    store::Store,
    views::{ViewInputs, ViewKind, ViewOutput, ViewParams},
};

// Re-exports
pub use column_names as COL;

// Modules
pub mod classify;
pub mod column_names;
pub mod config;
pub mod data;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod geo;
pub mod metadata;
pub mod selection;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transform;
pub mod view_state;
pub mod views;

/// Type for medemap data and API
pub struct Medemap<S = MemoryStorage> {
    pub config: Config,
    source: HttpDataSource,
    store: Store<S>,
}

impl Medemap<MemoryStorage> {
    /// Setup the Medemap object with default configuration and in-memory storage
    pub fn new() -> MedemapResult<Self> {
        Self::new_with_config(Config::default(), MemoryStorage::new())
    }
}

impl<S: DurableStorage> Medemap<S> {
    /// Setup the Medemap object with custom configuration and storage. The persisted selection is
    /// restored; data is fetched on first use.
    pub fn new_with_config(config: Config, storage: S) -> MedemapResult<Self> {
        debug!("config: {config:?}");
        let mut store = Store::new(storage);
        store.restore()?;
        Ok(Self {
            source: HttpDataSource::new(config.clone()),
            config,
            store,
        })
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<S> {
        &mut self.store
    }

    /// Indicator tables, fetched once per session
    pub async fn data(&mut self) -> MedemapResult<Arc<IndicatorData>> {
        self.store.ensure_data(&self.source).await
    }

    /// Options of `table` that can be selected
    pub async fn selectable_options(&mut self, table: &str) -> MedemapResult<Vec<ColumnOption>> {
        let data = self.data().await?;
        data.table(table)?;
        Ok(selectable_options(table, data.options(table)))
    }

    /// Select `columns` of `table` by their column key, replacing the previous choice for that
    /// table
    pub async fn select(
        &mut self,
        table: &str,
        columns: &[String],
    ) -> MedemapResult<SelectionOutcome> {
        let options = self.selectable_options(table).await?;
        let chosen = columns
            .iter()
            .map(|column| {
                options
                    .iter()
                    .find(|o| &o.value == column)
                    .cloned()
                    .ok_or_else(|| {
                        MedemapError::InvalidParameter(format!(
                            "{column} is not a selectable column of {table}"
                        ))
                    })
            })
            .collect::<MedemapResult<Vec<_>>>()?;
        self.store.set_table_selection(table, chosen)
    }

    /// Derives a view from the current data and selection
    pub async fn view(&mut self, kind: ViewKind, params: &ViewParams) -> MedemapResult<ViewOutput> {
        let data = self.data().await?;
        let coordinates = if kind.needs_coordinates() {
            Some(self.store.ensure_coordinates(&self.source).await?)
        } else {
            None
        };
        views::derive(
            kind,
            &ViewInputs {
                data: &data,
                selection: self.store.selection(),
                coordinates: coordinates.as_deref().map(Vec::as_slice),
                params,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::{data::fixtures::api_response, selection::Selection, storage::FileStorage};

    fn mock_api(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/api/medemap");
            then.status(200).json_body(api_response());
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/geocoordinates");
            then.status(200).json_body(json!([
                {"country": "Austria", "latitude": "48.2", "longitude": "16.4"},
                {"country": "Belgium", "latitude": 50.8, "longitude": 4.4}
            ]));
        });
    }

    fn medemap(server: &MockServer) -> Medemap {
        Medemap::new_with_config(
            Config {
                base_url: server.url("/api"),
            },
            MemoryStorage::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn select_and_view() {
        let server = MockServer::start();
        mock_api(&server);
        let mut medemap = medemap(&server);

        let options = medemap.selectable_options(COL::BASIC_DATA).await.unwrap();
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["population", "area"]);
        assert_eq!(options[0].label, "Population");

        let outcome = medemap
            .select(COL::BASIC_DATA, &["population".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome, SelectionOutcome::Accepted { total: 1 });

        let output = medemap
            .view(ViewKind::Globe, &ViewParams::default())
            .await
            .unwrap();
        let ViewOutput::Globe(globe) = output else {
            panic!("expected globe output");
        };
        assert_eq!(globe.bars.len(), 2);
        assert_eq!(globe.missing_countries, vec!["Atlantis".to_string()]);
    }

    #[tokio::test]
    async fn unknown_columns_are_rejected() {
        let server = MockServer::start();
        mock_api(&server);
        let mut medemap = medemap(&server);
        let result = medemap
            .select(COL::BASIC_DATA, &["currency".to_string()])
            .await;
        assert!(matches!(result, Err(MedemapError::InvalidParameter(_))));
        assert_eq!(medemap.store().selection(), &Selection::new());
    }

    #[tokio::test]
    async fn repeated_column_keys_select_once() {
        let server = MockServer::start();
        mock_api(&server);
        let mut medemap = medemap(&server);
        let repeated = vec!["population".to_string(); 3];
        let outcome = medemap.select(COL::BASIC_DATA, &repeated).await.unwrap();
        assert_eq!(outcome, SelectionOutcome::Accepted { total: 1 });
        assert_eq!(medemap.store().selection().table(COL::BASIC_DATA).len(), 1);
    }

    #[test]
    fn corrupt_storage_file_does_not_block_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{truncated").unwrap();
        let mut medemap =
            Medemap::new_with_config(Config::default(), FileStorage::new(&path)).unwrap();
        assert!(medemap.store().selection().is_empty());
        assert!(medemap.store_mut().take_first_run().unwrap());
        medemap.store_mut().clear_selection().unwrap();
        assert!(!medemap.store_mut().take_first_run().unwrap());
    }
}
