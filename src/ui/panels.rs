use std::path::Path;

use anyhow::Context;
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::data::loader;
use crate::state::{AppState, ChartId};

// ---------------------------------------------------------------------------
// Top bar – menu, selection summary, reset-all
// ---------------------------------------------------------------------------

/// Render the top menu / summary bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open run configuration…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(agg) = &state.aggregates {
            if state.dash.filters.any_active() {
                ui.label(format!(
                    "{} selected out of {} records",
                    agg.selected, agg.total
                ));
                if ui.link("Reset all").clicked() {
                    state.reset_all();
                }
            } else {
                ui.label("All records selected. Click a chart to apply filters.");
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Side panel – run parameters and the date pickers
// ---------------------------------------------------------------------------

/// Render the left panel with the run configuration and the manual date
/// range selection.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analogue run");
    ui.separator();

    match &state.config {
        Some(config) => {
            egui::Grid::new("run_config")
                .num_columns(2)
                .spacing([8.0, 2.0])
                .show(ui, |ui: &mut Ui| {
                    config_row(ui, "Output file", &config.outputfile);
                    config_row(ui, "Analogues", &config.nanalog);
                    config_row(ui, "Variable", &config.varname);
                    config_row(ui, "Simulation", &config.simsource);
                    config_row(ui, "Archive", &config.archivesource);
                    config_row(ui, "Bounding box", &config.bbox);
                    config_row(
                        ui,
                        "Reference period",
                        &format!("{} - {}", config.ref_start, config.ref_end),
                    );
                });
        }
        None => {
            ui.label("No run configuration loaded.");
        }
    }

    ui.add_space(8.0);
    ui.separator();
    ui.strong("Date range");

    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    let (min_date, max_date) = (ds.min_date, ds.max_date);

    ui.label(format!(
        "Data: {} - {}",
        min_date.format("%d/%m/%Y"),
        max_date.format("%d/%m/%Y")
    ));

    let mut start = state.dash.picker_start;
    let mut end = state.dash.picker_end;
    let mut changed = false;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("picker_start"))
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("picker_end"))
            .changed();
    });

    if changed {
        state.manual_dates(start, end);
    }

    if state.dash.date_reset_visible && ui.small_button("Reset dates").clicked() {
        state.reset_chart(ChartId::Time);
    }
}

fn config_row(ui: &mut Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).strong());
    ui.label(value);
    ui.end_row();
}

// ---------------------------------------------------------------------------
// File dialogs and loading
// ---------------------------------------------------------------------------

pub fn open_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open analogues data")
        .add_filter("Tab-separated data", &["tsv", "txt", "dat"])
        .pick_file();

    if let Some(path) = file {
        load_data_path(state, &path);
    }
}

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open run configuration")
        .add_filter("Configuration", &["txt", "cfg", "ini"])
        .pick_file();

    if let Some(path) = file {
        load_config_path(state, &path);
    }
}

/// Load a data file into the app, surfacing failures in the status line.
pub fn load_data_path(state: &mut AppState, path: &Path) {
    let loaded = loader::load_data(path).with_context(|| format!("loading {}", path.display()));
    match loaded {
        Ok(dataset) => {
            log::info!(
                "Loaded {} analogues spanning {} - {}",
                dataset.len(),
                dataset.min_date,
                dataset.max_date
            );
            state.set_dataset(dataset);
        }
        Err(e) => {
            log::error!("Failed to load data file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Load a run-configuration file; purely informational.
pub fn load_config_path(state: &mut AppState, path: &Path) {
    let loaded = loader::load_config(path).with_context(|| format!("loading {}", path.display()));
    match loaded {
        Ok(config) => {
            log::info!("Loaded run configuration from {}", path.display());
            state.set_config(config);
        }
        Err(e) => {
            log::error!("Failed to load configuration: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
