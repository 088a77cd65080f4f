use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use tender_dash::data::filter::ColumnFilter;
use tender_dash::data::loader::Source;
use tender_dash::data::pipeline::{DatasetProfile, Report};
use tender_dash::data::resolve::Role;

use crate::state::{AppState, Page, PageState};
use crate::ui::{grid, tiles};

// ---------------------------------------------------------------------------
// Left side panel – data source and filter widgets
// ---------------------------------------------------------------------------

/// Render the left sidebar for the current page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some((page, config)) = state.current_page() else {
        ui.heading("Data Analysis");
        ui.label("Choose a page to see its data.");
        return;
    };

    ui.heading("Data source");
    ui.separator();

    let mut use_upload = page.use_upload;
    if ui.checkbox(&mut use_upload, "Upload a file").changed() {
        page.set_use_upload(use_upload, config);
    }
    if page.use_upload {
        if ui.button("Choose CSV or Excel…").clicked() {
            match pick_upload() {
                Ok(Some(source)) => page.set_upload(source, config),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Failed to read upload: {e:#}");
                    page.error = Some(format!("Error: {e:#}"));
                }
            }
        }
        if let Some(src) = &page.upload {
            ui.small(src.name());
        }
    }
    ui.add_space(8.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| filter_widgets(ui, page));
}

/// Per-column filter widgets; recomputes the report on any change.
fn filter_widgets(ui: &mut Ui, page: &mut PageState) {
    let Some(sel) = &mut page.selections else {
        return;
    };

    if !sel.filters.is_empty() {
        ui.heading("Filters");
        ui.separator();
    }

    let mut changed = false;
    let mut bulk: Option<(String, bool)> = None;

    for (name, filter) in sel.filters.iter_mut() {
        match filter {
            ColumnFilter::Categorical { options, selected } => {
                // Show count of selected / total in the header
                let header_text = format!("{name}  ({}/{})", selected.len(), options.len());
                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(name)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                bulk = Some((name.to_string(), true));
                            }
                            if ui.small_button("None").clicked() {
                                bulk = Some((name.to_string(), false));
                            }
                        });
                        for opt in options.iter() {
                            let mut checked = selected.contains(opt);
                            if ui.checkbox(&mut checked, opt.as_str()).changed() {
                                if checked {
                                    selected.insert(opt.clone());
                                } else {
                                    selected.remove(opt);
                                }
                                changed = true;
                            }
                        }
                    });
            }
            ColumnFilter::TooManyValues { .. } => {
                ui.small(format!("{name}: too many values to filter"));
            }
            ColumnFilter::Range {
                min,
                max,
                low,
                high,
            } => {
                ui.strong(name);
                let bounds = *min..=*max;
                changed |= ui.add(Slider::new(low, bounds.clone()).text("from")).changed();
                changed |= ui.add(Slider::new(high, bounds).text("to")).changed();
                if *low > *high {
                    std::mem::swap(low, high);
                }
            }
        }
    }

    if let Some(ds) = &page.dataset {
        if page.profile == DatasetProfile::Estimate && ds.roles.get(Role::Item).is_some() {
            let label = format!("Include {} in total", ds.excluded_label());
            changed |= ui
                .checkbox(&mut sel.include_excluded_label, label)
                .changed();
        }
    }

    match bulk {
        Some((col, true)) => page.select_all(&col),
        Some((col, false)) => page.select_none(&col),
        None if changed => page.refresh(),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / page switcher.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    let mut goto = None;
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                if let Some((page, config)) = state.current_page() {
                    page.reload(config);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        for (page, label) in [
            (Page::Home, "Home"),
            (Page::Data(DatasetProfile::Tender), DatasetProfile::Tender.page_title()),
            (Page::Data(DatasetProfile::Estimate), DatasetProfile::Estimate.page_title()),
        ] {
            if ui.selectable_label(state.page == page, label).clicked() {
                goto = Some(page);
            }
        }

        ui.separator();

        if let Some((page, _)) = state.current_page() {
            if let (Some(ds), Some(report)) = (&page.dataset, &page.report) {
                ui.label(format!(
                    "{} rows loaded, {} visible",
                    ds.table.row_count(),
                    report.filtered.row_count()
                ));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    if let Some(page) = goto {
        state.open(page);
    }
}

// ---------------------------------------------------------------------------
// Central panel – page body
// ---------------------------------------------------------------------------

/// Render the current page: landing links or tiles and grids.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.page == Page::Home {
        let mut goto = None;
        ui.heading("Data Analysis");
        ui.label("Choose a data file to view and analyse.");
        ui.add_space(8.0);
        for profile in [DatasetProfile::Tender, DatasetProfile::Estimate] {
            if ui.link(format!("📄 {}", profile.page_title())).clicked() {
                goto = Some(Page::Data(profile));
            }
        }
        if let Some(page) = goto {
            state.open(page);
        }
        return;
    }

    let tiles_per_row = state.config.tiles_per_row;
    let Some((page, _)) = state.current_page() else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| data_page(ui, page, tiles_per_row));
}

fn data_page(ui: &mut Ui, page: &mut PageState, tiles_per_row: usize) {
    let title = page
        .dataset
        .as_ref()
        .map(|ds| ds.title.clone())
        .unwrap_or_else(|| page.profile.page_title().to_string());
    ui.label(RichText::new(title).size(30.0).strong());
    ui.add_space(12.0);

    if let Some(err) = &page.error {
        ui.label(RichText::new(err).color(Color32::RED));
        return;
    }
    if let Some(info) = &page.info {
        ui.label(info.as_str());
        return;
    }

    let PageState {
        profile,
        dataset,
        report,
        summary_sort,
        data_sort,
        ..
    } = page;
    let (Some(ds), Some(report)) = (dataset.as_ref(), report.as_ref()) else {
        return;
    };

    match profile {
        DatasetProfile::Tender => {
            if !report.overall.is_empty() {
                ui.heading("Overall totals");
                tiles::tile_row(ui, &report.overall);
            }
            if !report.per_group.is_empty() {
                let roles = (
                    ds.roles.get(Role::Amount),
                    ds.roles.get(Role::Quantity),
                    ds.roles.get(Role::GroupKey),
                );
                if let (Some(amount), Some(quantity), Some(key)) = roles {
                    ui.heading(format!("Total {amount} and {quantity} by {key}"));
                }
                tiles::grouped_tiles(ui, &report.per_group, tiles_per_row);
            }
            if let Some(summary) = &report.summary {
                ui.heading("Sum of AS and CV by contractor");
                grid::grouped_grid(ui, "contractor_summary", summary, summary_sort);
                ui.add_space(12.0);
            }
        }
        DatasetProfile::Estimate => estimate_tiles(ui, report),
    }

    ui.heading("Filtered data");
    grid::table_grid(ui, "filtered_data", &report.filtered, data_sort);
}

fn estimate_tiles(ui: &mut Ui, report: &Report) {
    if report.overall.is_empty() {
        return;
    }
    ui.heading("Filtered totals");
    tiles::tile_row(ui, &report.overall);
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask for a file and read it into memory as an upload.
pub fn pick_upload() -> Result<Option<Source>> {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Supported files", &["csv", "xlsx", "xls", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    let Some(path) = file else {
        return Ok(None);
    };
    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Some(Source::Upload { name, bytes }))
}

/// File → Open: upload into the current page, or the tender page from Home.
pub fn open_file_dialog(state: &mut AppState) {
    if state.page == Page::Home {
        state.open(Page::Data(DatasetProfile::Tender));
    }
    match pick_upload() {
        Ok(Some(source)) => {
            state.status_message = None;
            if let Some((page, config)) = state.current_page() {
                page.set_upload(source, config);
            }
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to open file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

