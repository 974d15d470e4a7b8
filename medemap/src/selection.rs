//! The user's indicator selection: at most [`MAX_SELECTED_COLUMNS`] columns across all tables.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{metadata::ColumnOption, COL};

/// Maximum number of indicator columns selected at once, across every table.
pub const MAX_SELECTED_COLUMNS: usize = 3;

/// Drops repeated column keys, keeping the first occurrence of each.
pub fn distinct_columns(columns: Vec<ColumnOption>) -> Vec<ColumnOption> {
    columns
        .into_iter()
        .unique_by(|option| option.value.clone())
        .collect()
}

/// Table name to the ordered list of selected column options.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, Vec<ColumnOption>>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the columns of `table`. An empty list removes the table.
    pub fn with_table(mut self, table: &str, columns: Vec<ColumnOption>) -> Self {
        self.replace_table(table, columns);
        self
    }

    pub(crate) fn replace_table(&mut self, table: &str, columns: Vec<ColumnOption>) {
        let columns = distinct_columns(columns);
        if columns.is_empty() {
            self.0.remove(table);
        } else {
            self.0.insert(table.to_owned(), columns);
        }
    }

    pub(crate) fn remove_column(&mut self, table: &str, column: &str) -> bool {
        let Some(columns) = self.0.get_mut(table) else {
            return false;
        };
        let before = columns.len();
        columns.retain(|option| option.value != column);
        let removed = columns.len() != before;
        if columns.is_empty() {
            self.0.remove(table);
        }
        removed
    }

    /// Number of selected columns across every table.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Total after replacing the columns of `table` with `new_len` columns.
    pub fn total_after_replacing(&self, table: &str, new_len: usize) -> usize {
        self.total() - self.table(table).len() + new_len
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn table(&self, table: &str) -> &[ColumnOption] {
        self.0.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Tables with at least one selected column, known tables first in presentation order.
    pub fn tables(&self) -> Vec<(&str, &[ColumnOption])> {
        let mut tables: Vec<(&str, &[ColumnOption])> = self
            .0
            .iter()
            .filter(|(_, columns)| !columns.is_empty())
            .map(|(table, columns)| (table.as_str(), columns.as_slice()))
            .collect();
        tables.sort_by_key(|(table, _)| {
            COL::TABLE_ORDER
                .iter()
                .position(|t| t == table)
                .unwrap_or(COL::TABLE_ORDER.len())
        });
        tables
    }

    /// Every selected column with its table, in the order of [`Selection::tables`].
    pub fn columns(&self) -> Vec<(&str, &ColumnOption)> {
        self.tables()
            .into_iter()
            .flat_map(|(table, columns)| columns.iter().map(move |column| (table, column)))
            .collect()
    }

    /// Feedback line shown after an accepted change.
    pub fn feedback(&self) -> String {
        format!("Selected {} indicators for processing.", self.total())
    }
}

/// Result of trying to change the selection. Going over the cap is an expected outcome, not an
/// error.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Accepted { total: usize },
    LimitExceeded { attempted: usize, limit: usize },
}

impl SelectionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SelectionOutcome::Accepted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<ColumnOption> {
        values.iter().map(|v| ColumnOption::new(v)).collect()
    }

    #[test]
    fn totals_span_tables() {
        let selection = Selection::new()
            .with_table(COL::DEMOCRACY, options(&["a", "b"]))
            .with_table(COL::BASIC_DATA, options(&["gdp"]));
        assert_eq!(selection.total(), 3);
        assert_eq!(selection.total_after_replacing(COL::DEMOCRACY, 1), 2);
        assert_eq!(selection.total_after_replacing(COL::SUPPLY_SIDE, 2), 5);
        assert_eq!(selection.feedback(), "Selected 3 indicators for processing.");
    }

    #[test]
    fn tables_follow_presentation_order() {
        let selection = Selection::new()
            .with_table("zzz_custom", options(&["x"]))
            .with_table(COL::SUPPLY_SIDE, options(&["y"]))
            .with_table(COL::BASIC_DATA, options(&["z"]));
        let names: Vec<&str> = selection.tables().into_iter().map(|(t, _)| t).collect();
        assert_eq!(names, vec![COL::BASIC_DATA, COL::SUPPLY_SIDE, "zzz_custom"]);
        let columns: Vec<&str> = selection
            .columns()
            .into_iter()
            .map(|(_, c)| c.value.as_str())
            .collect();
        assert_eq!(columns, vec!["z", "y", "x"]);
    }

    #[test]
    fn removing_last_column_drops_table() {
        let mut selection = Selection::new().with_table(COL::DEMOCRACY, options(&["a"]));
        assert!(!selection.remove_column(COL::DEMOCRACY, "b"));
        assert!(selection.remove_column(COL::DEMOCRACY, "a"));
        assert!(selection.is_empty());
        assert_eq!(selection, Selection::new());
    }

    #[test]
    fn repeated_columns_are_kept_once() {
        let selection =
            Selection::new().with_table(COL::DEMOCRACY, options(&["trust", "a", "trust"]));
        let columns: Vec<&str> = selection
            .table(COL::DEMOCRACY)
            .iter()
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(columns, vec!["trust", "a"]);
        assert_eq!(selection.total(), 2);
    }

    #[test]
    fn serializes_as_table_map() {
        let selection = Selection::new().with_table(COL::DEMOCRACY, options(&["a"]));
        let value = serde_json::to_value(&selection).unwrap();
        assert_eq!(value["democracy"][0]["value"], "a");
        let back: Selection = serde_json::from_value(value).unwrap();
        assert_eq!(back, selection);
    }
}
