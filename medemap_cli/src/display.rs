use comfy_table::{presets::NOTHING, *};

use medemap::{
    metadata::ColumnOption,
    selection::Selection,
    transform::cell_text,
    views::table::TableGrid,
    COL,
};

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn bold_header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

/// Summary of an indicator table and what can be selected from it.
pub struct TableSummary<'a> {
    pub table: &'a str,
    pub rows: usize,
    pub options: Vec<ColumnOption>,
}

pub fn display_tables(summaries: &[TableSummary], selection: &Selection) {
    let mut table = styled_table();
    table.set_header(bold_header(&["Table", "Title", "Countries", "Selectable indicators"]));
    for summary in summaries {
        let selected = selection.table(summary.table);
        let indicators = summary
            .options
            .iter()
            .map(|option| {
                let marker = if selected.iter().any(|s| s.value == option.value) {
                    "* "
                } else {
                    ""
                };
                format!("{marker}{} ({})", option.label, option.value)
            })
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(summary.table),
            Cell::new(COL::table_title(summary.table)),
            Cell::new(summary.rows),
            Cell::new(indicators),
        ]);
    }
    println!("\n{}", table);
}

pub fn display_selection(selection: &Selection) {
    if selection.is_empty() {
        println!("No indicators selected.");
        return;
    }
    let mut table = styled_table();
    table.set_header(bold_header(&["Table", "Column", "Indicator"]));
    for (name, option) in selection.columns() {
        table.add_row(vec![
            COL::table_title(name),
            option.value.clone(),
            option.display_name().to_owned(),
        ]);
    }
    println!("\n{}", table);
    println!("{}", selection.feedback());
}

pub fn display_grid(grid: &TableGrid, max_rows: Option<usize>) {
    let mut table = styled_table();
    let headers: Vec<&str> = grid.columns.iter().map(|c| c.header.as_str()).collect();
    table.set_header(bold_header(&headers));
    for row in grid.rows.iter().take(max_rows.unwrap_or(usize::MAX)) {
        table.add_row(
            grid.columns
                .iter()
                .map(|c| cell_text(row.get(&c.field)))
                .collect::<Vec<_>>(),
        );
    }
    println!("\n{}\n{}", grid.title, table);
    if let Some(max) = max_rows {
        if grid.rows.len() > max {
            println!(
                "{} more rows not shown. Use --full to show all rows.",
                grid.rows.len() - max
            );
        }
    }
}
