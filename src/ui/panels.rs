use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::display_float;
use crate::pipeline::config::{GroupBy, XAxis};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – chart settings and run filters
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Chart");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No runs loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            chart_settings(ui, state);
            ui.separator();
            ui.heading("Runs");
            run_filters(ui, state);
        });
}

fn chart_settings(ui: &mut Ui, state: &mut AppState) {
    let metric_keys = state
        .dataset
        .as_ref()
        .map(|ds| ds.metric_keys())
        .unwrap_or_default();
    let has_history = state
        .dataset
        .as_ref()
        .is_some_and(|ds| !ds.history_keys.is_empty());
    let config = &mut state.config;

    // ---- X axis ----
    ui.strong("X-Axis");
    egui::ComboBox::from_id_salt("x_axis")
        .selected_text(config.x_axis.label())
        .show_ui(ui, |ui: &mut Ui| {
            for axis in XAxis::BUILTIN {
                let label = axis.label().to_string();
                ui.selectable_value(&mut config.x_axis, axis, label);
            }
        });
    ui.toggle_value(&mut config.x_log_scale, "Log x");

    // ---- Y axis ----
    ui.add_space(4.0);
    ui.strong("Y-Axis");
    ui.add_enabled_ui(has_history, |ui: &mut Ui| {
        let current = config.y_key.clone().unwrap_or_else(|| "key".to_string());
        egui::ComboBox::from_id_salt("y_axis")
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for key in &metric_keys {
                    ui.selectable_value(&mut config.y_key, Some(key.clone()), key);
                }
            });
        ui.toggle_value(&mut config.y_log_scale, "Log y");

        // ---- Smoothing ----
        ui.add_space(4.0);
        ui.label(format!("Smoothing: {}", display_float(config.effective_weight())));
        ui.add(egui::Slider::new(&mut config.smoothing_weight, 0.0..=1.0).step_by(0.001));
    });

    // ---- Aggregation ----
    ui.add_space(4.0);
    ui.checkbox(&mut config.aggregate, "Aggregate Runs");
    ui.add_enabled_ui(config.aggregate, |ui: &mut Ui| {
        egui::ComboBox::from_id_salt("group_by")
            .selected_text(config.group_by.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut config.group_by, GroupBy::None, "None");
                for field in &state.group_candidates {
                    ui.selectable_value(
                        &mut config.group_by,
                        GroupBy::Field(field.clone()),
                        field,
                    );
                }
            });
    });
}

fn run_filters(ui: &mut Ui, state: &mut AppState) {
    // Clone what we need so we can mutate state inside the loop.
    let Some(dataset) = &state.dataset else {
        return;
    };
    let columns = dataset.config_columns.clone();
    let unique = dataset.unique_values.clone();
    let mut changed = false;

    for col in &columns {
        let Some(all_values) = unique.get(col) else {
            continue;
        };

        let n_selected = state.filters.get(col).map_or(0, |s| s.len());
        let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(col)
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all(col);
                    }
                    if ui.small_button("None").clicked() {
                        state.select_none(col);
                    }
                });

                // Re-borrow after potential mutation from All/None
                let selected = state.filters.entry(col.clone()).or_default();
                for val in all_values {
                    let mut checked = selected.contains(val);
                    if ui.checkbox(&mut checked, val.to_string()).changed() {
                        if checked {
                            selected.insert(val.clone());
                        } else {
                            selected.remove(val);
                        }
                        changed = true;
                    }
                }
            });
    }

    if changed {
        state.refilter();
    }
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} runs loaded, {} selected",
                ds.len(),
                state.selected_runs.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open run histories")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
