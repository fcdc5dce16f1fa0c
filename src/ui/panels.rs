use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use incubator_viewer::data::time::TimeUnit;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – load options and view toggles
// ---------------------------------------------------------------------------

/// Render the left options panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Incubator log");
    ui.separator();

    let mut reload = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Files ----
            ui.strong("Files");
            ui.label(format!("Data: {}", file_label(state.data_path.as_deref())));
            ui.label(format!("Events: {}", file_label(state.events_path.as_deref())));
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Open data…").clicked() {
                    open_data_dialog(state);
                }
                if ui.small_button("Open events…").clicked() {
                    open_events_dialog(state);
                }
                if state.events_path.is_some() && ui.small_button("Clear events").clicked() {
                    state.clear_events();
                }
            });
            ui.separator();

            // ---- Loading ----
            egui::CollapsingHeader::new(RichText::new("Loading").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    egui::ComboBox::from_id_salt("time_unit")
                        .selected_text(format!("time unit: {}", state.time_unit))
                        .show_ui(ui, |ui: &mut Ui| {
                            for unit in TimeUnit::ALL {
                                ui.selectable_value(&mut state.time_unit, unit, unit.as_str());
                            }
                        });

                    ui.checkbox(&mut state.normalize_time, "Normalize time");
                    ui.checkbox(&mut state.convert_to_seconds, "Convert to seconds");
                    if state.options_conflict() {
                        ui.label(
                            RichText::new("Normalization cannot be combined with events")
                                .color(Color32::RED),
                        );
                    }

                    optional_bound(ui, "Window start", &mut state.window.start);
                    optional_bound(ui, "Window end", &mut state.window.end);
                });

            // ---- Heater ----
            egui::CollapsingHeader::new(RichText::new("Heater").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Voltage");
                        ui.add(egui::DragValue::new(&mut state.heater.voltage).speed(0.1).suffix(" V"));
                    });
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Current");
                        ui.add(egui::DragValue::new(&mut state.heater.current).speed(0.05).suffix(" A"));
                    });
                });

            ui.separator();
            if ui
                .add_enabled(state.data_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                reload = true;
            }
            ui.separator();

            // ---- View ----
            ui.strong("View");
            ui.checkbox(&mut state.view.overlay_heater, "Overlay heater");
            ui.checkbox(&mut state.view.show_sensor_temperatures, "Sensor temperatures");
            ui.checkbox(&mut state.view.show_actuators, "Actuators");
            ui.checkbox(&mut state.view.show_hr_time, "Wall-clock time");
        });

    if reload {
        state.reload();
    }
}

/// A checkbox enabling a window bound, with its value when enabled.
fn optional_bound(ui: &mut Ui, label: &str, bound: &mut Option<f64>) {
    ui.horizontal(|ui: &mut Ui| {
        let mut enabled = bound.is_some();
        if ui.checkbox(&mut enabled, label).changed() {
            *bound = if enabled { Some(0.0) } else { None };
        }
        if let Some(value) = bound {
            ui.add(egui::DragValue::new(value).speed(1.0));
        }
    });
}

fn file_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "–".to_string())
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data…").clicked() {
                open_data_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open events…").clicked() {
                open_events_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(data) = &state.data {
            ui.label(format!(
                "{} rows, {} events",
                data.data.len(),
                data.events.as_ref().map_or(0, |e| e.len())
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

pub fn open_data_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open incubator data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.set_data_path(path);
    }
}

pub fn open_events_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open event log")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.set_events_path(path);
    }
}
