use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::{Month, Ota};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Clone what we need so we can mutate state inside the loops.
    let Some(localities) = state.dataset().map(|ds| ds.localities.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    if ui.button("Clear all").clicked() {
        state.clear_all();
    }
    ui.label(RichText::new("An empty group shows everything.").weak());
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Properties ----
            let header = group_header("Properties", state.selection.properties.len(), localities.len());
            egui::CollapsingHeader::new(header)
                .id_salt("property_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_properties();
                    }
                    for locality in &localities {
                        let mut checked = state.selection.properties.contains(locality);
                        if ui.checkbox(&mut checked, locality).changed() {
                            state.toggle_property(locality);
                        }
                    }
                });

            // ---- OTAs ----
            let header = group_header("OTAs", state.selection.otas.len(), Ota::ALL.len());
            egui::CollapsingHeader::new(header)
                .id_salt("ota_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_otas();
                    }
                    for ota in Ota::ALL {
                        let mut checked = state.selection.otas.contains(&ota);
                        if ui.checkbox(&mut checked, ota.label()).changed() {
                            state.toggle_ota(ota);
                        }
                    }
                });

            // ---- Months ----
            let header = group_header("Months", state.selection.months.len(), Month::ALL.len());
            egui::CollapsingHeader::new(header)
                .id_salt("month_filter")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        state.clear_months();
                    }
                    for month in Month::ALL {
                        let mut checked = state.selection.months.contains(&month);
                        if ui.checkbox(&mut checked, month.label()).changed() {
                            state.toggle_month(month);
                        }
                    }
                });

            ui.separator();

            // ---- Rating legend ----
            if let Some(cm) = &state.color_map {
                ui.strong(&cm.field);
                for (label, color) in cm.legend_entries() {
                    ui.label(RichText::new(format!("■ {label}")).color(color));
                }
            }
        });
}

fn group_header(name: &str, selected: usize, total: usize) -> RichText {
    let text = if selected == 0 {
        format!("{name}  (all {total})")
    } else {
        format!("{name}  ({selected}/{total})")
    };
    RichText::new(text).strong()
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_data = state.dashboard.is_some();
            if ui
                .add_enabled(has_data, egui::Button::new("Export charts…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = state.dataset() {
            let source = ds
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{source}: {} rows, {} OTA records, {} visible",
                ds.raw_rows,
                ds.len(),
                state.visible
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open OTA booking data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export charts")
        .set_file_name("charts.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_charts(&path) {
            log::error!("Failed to export charts: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
