use std::collections::BTreeSet;
use std::path::Path;

use crate::data::filter::{FilterState, filtered_run_ids, init_filter_state};
use crate::data::loader::load_file;
use crate::data::model::{MetadataValue, RunDataset, RunId};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::{LinePlot, Pipeline};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Inputs the cached plot was computed from.
#[derive(Debug, Clone, PartialEq)]
struct PlotKey {
    generation: u64,
    selected: BTreeSet<RunId>,
    config: PipelineConfig,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<RunDataset>,

    /// Bumped on every load so cached plots of older data are discarded.
    generation: u64,

    /// Per-column run filter selections.
    pub filters: FilterState,

    /// Runs passing the current filters.
    pub selected_runs: BTreeSet<RunId>,

    /// Plot configuration edited by the side panel.
    pub config: PipelineConfig,

    /// Config fields the selected runs can be grouped by.
    pub group_candidates: Vec<String>,

    plot: Option<LinePlot>,
    plot_key: Option<PlotKey>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl AppState {
    /// Load a file and make it the current dataset; failures end up in the
    /// status message.
    pub fn open_path(&mut self, path: &Path) {
        self.loading = true;
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} runs with history keys {:?}",
                    dataset.len(),
                    dataset.history_keys
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.loading = false;
            }
        }
    }

    /// Ingest a newly loaded dataset and select every run.
    pub fn set_dataset(&mut self, dataset: RunDataset) {
        self.filters = init_filter_state(&dataset);
        self.selected_runs = dataset.runs.iter().map(|r| r.id.clone()).collect();

        // Keep the chosen metric only if the new data logs it.
        if let Some(key) = &self.config.y_key {
            if !dataset.history_keys.contains(key) {
                self.config.y_key = None;
            }
        }

        self.generation += 1;
        self.dataset = Some(dataset);
        self.refresh_group_candidates();
        self.status_message = None;
        self.loading = false;
    }

    /// Recompute `selected_runs` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selected_runs = filtered_run_ids(ds, &self.filters);
        }
        self.refresh_group_candidates();
    }

    fn refresh_group_candidates(&mut self) {
        self.group_candidates = match &self.dataset {
            Some(ds) => Pipeline::new(ds).group_candidates(&self.selected_runs),
            None => Vec::new(),
        };
    }

    /// Toggle a single config value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &MetadataValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    /// The plot for the current dataset, selection and config. Recomputed
    /// only when one of those changed since the last call.
    pub fn line_plot(&mut self) -> Option<&LinePlot> {
        let ds = self.dataset.as_ref()?;
        let key = PlotKey {
            generation: self.generation,
            selected: self.selected_runs.clone(),
            config: self.config.clone(),
        };

        if self.plot_key.as_ref() != Some(&key) {
            self.plot = match Pipeline::new(ds).plot(&ds.histories, &key.selected, &key.config) {
                Ok(plot) => {
                    log::debug!("rebuilt plot with {} lines", plot.lines.len());
                    self.status_message = None;
                    Some(plot)
                }
                Err(e) => {
                    log::error!("Invalid plot configuration: {e}");
                    self.status_message = Some(format!("Error: {e}"));
                    None
                }
            };
            self.plot_key = Some(key);
        }
        self.plot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_json;

    fn state() -> AppState {
        let ds = parse_json(
            r#"[
                {"name": "a", "config": {"opt": "adam"},
                 "history": [{"_step": 0, "loss": 1}, {"_step": 1, "loss": 3}]},
                {"name": "b", "config": {"opt": "sgd"},
                 "history": [{"_step": 0, "loss": 5}, {"_step": 1, "loss": 7}]}
            ]"#,
        )
        .unwrap();
        let mut state = AppState::default();
        state.set_dataset(ds);
        state
    }

    #[test]
    fn new_dataset_selects_every_run() {
        let state = state();
        assert_eq!(state.selected_runs.len(), 2);
        assert!(state.config.y_key.is_none());
    }

    #[test]
    fn unconfigured_plot_is_empty() {
        let mut state = state();
        let plot = state.line_plot().unwrap();
        assert!(!plot.is_configured());
        assert!(plot.lines.is_empty());
    }

    #[test]
    fn plot_follows_filters_and_config() {
        let mut state = state();
        state.config.y_key = Some("loss".into());
        assert_eq!(state.line_plot().unwrap().lines.len(), 2);

        state.toggle_filter_value("opt", &MetadataValue::String("adam".into()));
        assert_eq!(state.selected_runs.len(), 1);
        assert_eq!(state.line_plot().unwrap().lines.len(), 1);

        state.select_none("opt");
        assert!(state.line_plot().unwrap().lines.is_empty());
    }

    #[test]
    fn invalid_config_sets_status() {
        let mut state = state();
        state.config.y_key = Some("loss".into());
        state.config.smoothing_weight = -1.0;
        assert!(state.line_plot().is_none());
        assert!(state.status_message.is_some());

        state.config.smoothing_weight = 0.5;
        assert!(state.line_plot().is_some());
        assert!(state.status_message.is_none());
    }
}
