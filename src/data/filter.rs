use std::collections::{BTreeMap, BTreeSet};

use super::model::{MetadataValue, RunDataset, RunId};

// ---------------------------------------------------------------------------
// Run selection: which config values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps config column → set of selected values.
/// A column absent from the map imposes no constraint.
pub type FilterState = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show every run).
pub fn init_filter_state(dataset: &RunDataset) -> FilterState {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return the identifiers of runs that pass all active filters.
///
/// A run passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * Every value of the column is selected → passes
/// * The run's value for that column is in the selected set → passes
/// * The run lacks the column → passes only if `Null` is selected
pub fn filtered_run_ids(dataset: &RunDataset, filters: &FilterState) -> BTreeSet<RunId> {
    dataset
        .runs
        .iter()
        .filter(|run| {
            for (col, selected) in filters {
                if selected.is_empty() {
                    return false;
                }
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if selected.len() == all_vals.len() {
                        continue;
                    }
                }
                let value = run.config.get(col).unwrap_or(&MetadataValue::Null);
                if !selected.contains(value) {
                    return false;
                }
            }
            true
        })
        .map(|run| run.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RunInfo;

    fn dataset() -> RunDataset {
        RunDataset::from_runs(
            vec![
                RunInfo::new("a").with_config("opt", MetadataValue::String("adam".into())),
                RunInfo::new("b").with_config("opt", MetadataValue::String("sgd".into())),
                RunInfo::new("c"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn initial_state_selects_every_run() {
        let ds = dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_run_ids(&ds, &filters).len(), 3);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert("opt".into(), BTreeSet::new());
        assert!(filtered_run_ids(&ds, &filters).is_empty());
    }

    #[test]
    fn partial_selection_keeps_matching_runs() {
        let ds = dataset();
        let mut filters = FilterState::new();
        filters.insert(
            "opt".into(),
            [MetadataValue::String("sgd".into())].into_iter().collect(),
        );
        let ids = filtered_run_ids(&ds, &filters);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![RunId::from("b")]);
    }

    #[test]
    fn missing_column_matches_null_selection() {
        let ds = dataset();
        let mut filters = FilterState::new();
        filters.insert("opt".into(), [MetadataValue::Null].into_iter().collect());
        let ids = filtered_run_ids(&ds, &filters);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![RunId::from("c")]);
    }
}
