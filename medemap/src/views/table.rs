use serde::Serialize;
use serde_json::{Map, Value};

use super::{FeatureRecord, ToRecords, ViewInputs};
use crate::{
    error::MedemapResult,
    transform::{cell_text, indicator_columns},
    COL,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub field: String,
    pub header: String,
}

/// One table as a grid, metadata columns removed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TableGrid {
    pub table: String,
    pub title: String,
    pub columns: Vec<GridColumn>,
    pub rows: Vec<Map<String, Value>>,
}

impl TableGrid {
    /// The grid as CSV with one header row of field names.
    pub fn to_csv(&self) -> MedemapResult<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .write_record(self.columns.iter().map(|c| c.field.as_str()))
            .map_err(anyhow::Error::from)?;
        for row in &self.rows {
            writer
                .write_record(self.columns.iter().map(|c| cell_text(row.get(&c.field))))
                .map_err(anyhow::Error::from)?;
        }
        let bytes = writer.into_inner().map_err(|err| anyhow::anyhow!("{err}"))?;
        Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct TableOutput {
    pub tables: Vec<TableGrid>,
}

impl TableOutput {
    pub fn table(&self, table: &str) -> Option<&TableGrid> {
        self.tables.iter().find(|t| t.table == table)
    }
}

pub(super) fn derive(inputs: &ViewInputs) -> TableOutput {
    let data = inputs.data;
    let tables = data
        .table_names()
        .into_iter()
        .filter_map(|table| {
            let rows = data.table(table).ok()?;
            let options = data.options(table);
            let columns: Vec<GridColumn> = if options.is_empty() {
                indicator_columns(rows, |c| !c.starts_with(COL::META_PREFIX))
                    .into_iter()
                    .map(|field| GridColumn {
                        header: field.clone(),
                        field,
                    })
                    .collect()
            } else {
                options
                    .iter()
                    .filter(|o| !o.value.starts_with(COL::META_PREFIX))
                    .map(|o| GridColumn {
                        field: o.value.clone(),
                        header: o.display_name().to_owned(),
                    })
                    .collect()
            };
            let rows = rows
                .iter()
                .map(|row| {
                    row.0
                        .iter()
                        .filter(|(key, _)| !key.starts_with(COL::META_PREFIX))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .collect();
            Some(TableGrid {
                table: table.to_owned(),
                title: COL::table_title(table),
                columns,
                rows,
            })
        })
        .collect();
    TableOutput { tables }
}

impl ToRecords for TableOutput {
    fn records(&self) -> Vec<FeatureRecord> {
        self.tables
            .iter()
            .flat_map(|grid| {
                grid.rows.iter().map(|row| {
                    let mut record = FeatureRecord::new().with("table", grid.table.as_str());
                    for column in &grid.columns {
                        record = record.with(
                            &column.field,
                            row.get(&column.field).cloned().unwrap_or(Value::Null),
                        );
                    }
                    record
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{test_inputs, ViewParams};

    fn output() -> TableOutput {
        let data = test_inputs::data();
        let selection = test_inputs::selection();
        let params = ViewParams::default();
        derive(&ViewInputs {
            data: &data,
            selection: &selection,
            coordinates: None,
            params: &params,
        })
    }

    #[test]
    fn grids_follow_table_order_and_use_indicator_headers() {
        let output = output();
        let names: Vec<&str> = output.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec![COL::BASIC_DATA, COL::DEMOCRACY]);
        let basic = output.table(COL::BASIC_DATA).unwrap();
        assert_eq!(basic.title, "Basic Data");
        assert_eq!(basic.columns[1].header, "Population");
        assert_eq!(basic.rows.len(), 3);
    }

    #[test]
    fn grid_exports_csv() {
        let output = output();
        let csv = output.table(COL::BASIC_DATA).unwrap().to_csv().unwrap();
        let expected = [
            "country,population,area,currency",
            "Austria,50,83.9,EUR",
            "Belgium,N/A,30.7,EUR",
            "Atlantis,10,1,Shell",
            "",
        ]
        .join("\n");
        assert_eq!(csv, expected);
    }
}
