//! The store owns the fetched data and the selection. Views only ever read from it.

use std::sync::Arc;

use log::{error, info, warn};

use crate::{
    data::{DataSource, IndicatorData},
    error::MedemapResult,
    geo::GeoCoordinate,
    metadata::ColumnOption,
    selection::{distinct_columns, Selection, SelectionOutcome, MAX_SELECTED_COLUMNS},
    storage::{DurableStorage, SELECTION_STORAGE_KEY, SPLASH_STORAGE_KEY},
};

pub struct Store<S> {
    storage: S,
    data: Option<Arc<IndicatorData>>,
    coordinates: Option<Arc<Vec<GeoCoordinate>>>,
    selection: Selection,
    error: Option<String>,
}

impl<S: DurableStorage> Store<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            data: None,
            coordinates: None,
            selection: Selection::new(),
            error: None,
        }
    }

    /// Fetch the indicator tables unless they are already cached.
    pub async fn ensure_data<D: DataSource>(
        &mut self,
        source: &D,
    ) -> MedemapResult<Arc<IndicatorData>> {
        match &self.data {
            Some(data) => {
                info!("Indicator data already loaded");
                Ok(Arc::clone(data))
            }
            None => self.reload_data(source).await,
        }
    }

    /// Fetch the indicator tables again. On failure the error is recorded and any previously
    /// cached data is kept.
    pub async fn reload_data<D: DataSource>(
        &mut self,
        source: &D,
    ) -> MedemapResult<Arc<IndicatorData>> {
        match source.fetch_indicator_data().await {
            Ok(data) => {
                let data = Arc::new(data);
                self.data = Some(Arc::clone(&data));
                self.error = None;
                Ok(data)
            }
            Err(err) => {
                error!("Failed to fetch indicator data: {err}");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Fetch the coordinate reference table unless it is already cached.
    pub async fn ensure_coordinates<D: DataSource>(
        &mut self,
        source: &D,
    ) -> MedemapResult<Arc<Vec<GeoCoordinate>>> {
        if let Some(coordinates) = &self.coordinates {
            return Ok(Arc::clone(coordinates));
        }
        match source.fetch_coordinates().await {
            Ok(coordinates) => {
                let coordinates = Arc::new(coordinates);
                self.coordinates = Some(Arc::clone(&coordinates));
                Ok(coordinates)
            }
            Err(err) => {
                error!("Failed to fetch coordinates: {err}");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn data(&self) -> Option<Arc<IndicatorData>> {
        self.data.clone()
    }

    pub fn coordinates(&self) -> Option<Arc<Vec<GeoCoordinate>>> {
        self.coordinates.clone()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Replace the whole selection. Rejected without any change when it holds more than
    /// [`MAX_SELECTED_COLUMNS`] columns.
    pub fn set_selection(&mut self, selection: Selection) -> MedemapResult<SelectionOutcome> {
        let attempted = selection.total();
        if attempted > MAX_SELECTED_COLUMNS {
            warn!("Rejected selection of {attempted} indicators");
            return Ok(SelectionOutcome::LimitExceeded {
                attempted,
                limit: MAX_SELECTED_COLUMNS,
            });
        }
        self.commit(selection)?;
        Ok(SelectionOutcome::Accepted { total: attempted })
    }

    /// Replace the selected columns of one table, keeping the other tables as they are.
    pub fn set_table_selection(
        &mut self,
        table: &str,
        columns: Vec<ColumnOption>,
    ) -> MedemapResult<SelectionOutcome> {
        let columns = distinct_columns(columns);
        let attempted = self.selection.total_after_replacing(table, columns.len());
        if attempted > MAX_SELECTED_COLUMNS {
            warn!("Rejected selection of {attempted} indicators");
            return Ok(SelectionOutcome::LimitExceeded {
                attempted,
                limit: MAX_SELECTED_COLUMNS,
            });
        }
        let mut selection = self.selection.clone();
        selection.replace_table(table, columns);
        self.commit(selection)?;
        Ok(SelectionOutcome::Accepted { total: attempted })
    }

    /// Drop one column from the selection. Returns whether it was selected.
    pub fn remove_column(&mut self, table: &str, column: &str) -> MedemapResult<bool> {
        let mut selection = self.selection.clone();
        if !selection.remove_column(table, column) {
            return Ok(false);
        }
        self.commit(selection)?;
        Ok(true)
    }

    pub fn clear_selection(&mut self) -> MedemapResult<()> {
        self.storage.remove(SELECTION_STORAGE_KEY)?;
        self.selection = Selection::new();
        Ok(())
    }

    /// Load the persisted selection. A missing, unreadable or over-cap value is ignored and
    /// `false` is returned.
    pub fn restore(&mut self) -> MedemapResult<bool> {
        let Some(raw) = self.storage.get(SELECTION_STORAGE_KEY)? else {
            return Ok(false);
        };
        match serde_json::from_str::<Selection>(&raw) {
            Ok(selection) if selection.total() <= MAX_SELECTED_COLUMNS => {
                info!("Restored selection of {} indicators", selection.total());
                self.selection = selection;
                Ok(true)
            }
            Ok(selection) => {
                warn!(
                    "Ignoring persisted selection of {} indicators",
                    selection.total()
                );
                Ok(false)
            }
            Err(err) => {
                warn!("Ignoring unreadable persisted selection: {err}");
                Ok(false)
            }
        }
    }

    /// `true` the first time this is called against a given storage, `false` afterwards.
    pub fn take_first_run(&mut self) -> MedemapResult<bool> {
        if self.storage.get(SPLASH_STORAGE_KEY)?.as_deref() == Some("true") {
            return Ok(false);
        }
        self.storage.set(SPLASH_STORAGE_KEY, "true")?;
        Ok(true)
    }

    fn commit(&mut self, selection: Selection) -> MedemapResult<()> {
        self.storage
            .set(SELECTION_STORAGE_KEY, &serde_json::to_string(&selection)?)?;
        self.selection = selection;
        Ok(())
    }
}
