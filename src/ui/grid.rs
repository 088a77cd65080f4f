use eframe::egui::{self, Ui};
use egui_extras::{Column as GridColumn, TableBuilder};

use tender_dash::data::aggregate::GroupedSums;
use tender_dash::data::model::{CellValue, Table};
use tender_dash::data::pipeline::format_grouped;

use crate::state::SortState;

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Sortable grid
// ---------------------------------------------------------------------------

/// Read-only grid with click-to-sort headers.
///
/// `cell(row, col)` supplies values; numbers are shown with `decimals`
/// places and grouping when set, as-is otherwise.
fn sortable_grid(
    ui: &mut Ui,
    id: &str,
    headers: &[String],
    rows: usize,
    cell: &dyn Fn(usize, usize) -> CellValue,
    decimals: Option<usize>,
    sort: &mut SortState,
) {
    let mut order: Vec<usize> = (0..rows).collect();
    if let Some(c) = sort.column.filter(|c| *c < headers.len()) {
        order.sort_by(|&a, &b| cell(a, c).cmp(&cell(b, c)));
        if sort.descending {
            order.reverse();
        }
    }

    let mut clicked = None;
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(true)
            .max_scroll_height(420.0)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(GridColumn::auto().at_least(70.0), headers.len())
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for (i, name) in headers.iter().enumerate() {
                    header.col(|ui: &mut Ui| {
                        let arrow = match *sort {
                            SortState { column: Some(c), descending } if c == i => {
                                if descending { " ⏷" } else { " ⏶" }
                            }
                            _ => "",
                        };
                        if ui.button(format!("{name}{arrow}")).clicked() {
                            clicked = Some(i);
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, order.len(), |mut row| {
                    let r = order[row.index()];
                    for c in 0..headers.len() {
                        row.col(|ui: &mut Ui| {
                            ui.label(display(&cell(r, c), decimals));
                        });
                    }
                });
            });
    });

    if let Some(i) = clicked {
        sort.toggle(i);
    }
}

fn display(value: &CellValue, decimals: Option<usize>) -> String {
    match (value, decimals) {
        (CellValue::Number(v), Some(d)) => format_grouped(*v, d),
        (other, _) => other.to_string(),
    }
}

/// Every column of a table.
pub fn table_grid(ui: &mut Ui, id: &str, table: &Table, sort: &mut SortState) {
    let headers: Vec<String> = table.column_names().into_iter().map(String::from).collect();
    let columns = table.columns();
    sortable_grid(
        ui,
        id,
        &headers,
        table.row_count(),
        &|r, c| columns[c].cell(r),
        None,
        sort,
    );
}

/// Key column followed by the summed columns.
pub fn grouped_grid(ui: &mut Ui, id: &str, grouped: &GroupedSums, sort: &mut SortState) {
    let headers: Vec<String> = std::iter::once(grouped.key_column.clone())
        .chain(grouped.value_columns.iter().cloned())
        .collect();
    let cell = |r: usize, c: usize| {
        let row = &grouped.rows[r];
        if c == 0 {
            row.key.clone()
        } else {
            CellValue::Number(row.sums[c - 1])
        }
    };
    sortable_grid(ui, id, &headers, grouped.rows.len(), &cell, Some(2), sort);
}
