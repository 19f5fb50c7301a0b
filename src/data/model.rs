use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MetadataValue – a single run configuration value
// ---------------------------------------------------------------------------

/// A dynamically-typed configuration value attached to a run.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{}", display_float(*v)),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

/// Compact float formatting for labels: four decimals at most, trailing
/// zeros dropped, scientific notation for very small or large magnitudes.
pub fn display_float(v: f64) -> String {
    if v.is_finite() && v != 0.0 && (v.abs() < 1e-3 || v.abs() >= 1e6) {
        return format!("{v:e}");
    }
    let s = format!("{v:.4}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run identity and history
// ---------------------------------------------------------------------------

/// Identifier of a single run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        RunId(s.to_string())
    }
}

/// One logged step of one run: field name → value (`None` for null).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRecord {
    fields: BTreeMap<String, Option<f64>>,
}

impl HistoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<f64>) {
        self.fields.insert(field.into(), value);
    }

    /// Builder-style insert of a present value.
    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.insert(field, Some(value));
        self
    }

    /// The field's value when it is present, non-null and finite.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields
            .get(field)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<f64>)> for HistoryRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<f64>)>>(iter: I) -> Self {
        HistoryRecord {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The ordered history of one run (insertion order = logging order).
#[derive(Debug, Clone, PartialEq)]
pub struct RunHistory {
    pub name: RunId,
    pub history: Vec<HistoryRecord>,
}

impl RunHistory {
    pub fn new(name: impl Into<String>, history: Vec<HistoryRecord>) -> Self {
        RunHistory {
            name: RunId(name.into()),
            history,
        }
    }
}

/// Per-run metadata: display name and configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    pub id: RunId,
    pub display_name: Option<String>,
    pub config: BTreeMap<String, MetadataValue>,
}

impl RunInfo {
    pub fn new(id: impl Into<String>) -> Self {
        RunInfo {
            id: RunId(id.into()),
            display_name: None,
            config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, field: impl Into<String>, value: MetadataValue) -> Self {
        self.config.insert(field.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Run metadata store
// ---------------------------------------------------------------------------

/// Looks up user-facing names and configuration values by run identifier.
pub trait RunCatalog {
    /// Display name for the run; falls back to the identifier.
    fn display_name(&self, id: &RunId) -> String;

    /// Resolved configuration value for `field`, if the run has one.
    fn config_value(&self, id: &RunId, field: &str) -> Option<MetadataValue>;

    /// Configuration of the given run, used for grouping.
    fn config(&self, id: &RunId) -> BTreeMap<String, MetadataValue>;
}

// ---------------------------------------------------------------------------
// RunDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Loaded runs and their histories with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct RunDataset {
    /// Run metadata, one per run, in load order.
    pub runs: Vec<RunInfo>,
    /// Run histories, parallel to `runs`.
    pub histories: Vec<RunHistory>,
    /// Every history field seen in any record (y-axis candidates).
    pub history_keys: BTreeSet<String>,
    /// Ordered list of configuration column names.
    pub config_columns: Vec<String>,
    /// For each configuration column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
    /// Run id → position in `runs`; the first run wins on duplicate ids.
    run_index: HashMap<RunId, usize>,
}

impl RunDataset {
    /// Build column indices from loaded runs and histories.
    pub fn from_runs(runs: Vec<RunInfo>, histories: Vec<RunHistory>) -> Self {
        let mut columns: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();

        for run in &runs {
            for (col, val) in &run.config {
                columns.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        // Runs lacking a column show up under `Null` so filters can select them.
        for run in &runs {
            for col in &columns {
                if !run.config.contains_key(col) {
                    unique_values
                        .entry(col.clone())
                        .or_default()
                        .insert(MetadataValue::Null);
                }
            }
        }

        let history_keys: BTreeSet<String> = histories
            .iter()
            .flat_map(|h| h.history.iter())
            .flat_map(|rec| rec.keys().map(str::to_string))
            .collect();

        let mut run_index = HashMap::with_capacity(runs.len());
        for (i, run) in runs.iter().enumerate() {
            run_index.entry(run.id.clone()).or_insert(i);
        }

        RunDataset {
            runs,
            histories,
            history_keys,
            config_columns: columns.into_iter().collect(),
            unique_values,
            run_index,
        }
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn run(&self, id: &RunId) -> Option<&RunInfo> {
        self.run_index.get(id).and_then(|&i| self.runs.get(i))
    }

    /// History fields a user would plot: internal `_`-prefixed fields excluded.
    pub fn metric_keys(&self) -> Vec<String> {
        self.history_keys
            .iter()
            .filter(|k| !k.starts_with('_'))
            .cloned()
            .collect()
    }
}

impl RunCatalog for RunDataset {
    fn display_name(&self, id: &RunId) -> String {
        self.run(id)
            .and_then(|r| r.display_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn config_value(&self, id: &RunId, field: &str) -> Option<MetadataValue> {
        self.run(id).and_then(|r| r.config.get(field).cloned())
    }

    fn config(&self, id: &RunId) -> BTreeMap<String, MetadataValue> {
        self.run(id).map(|r| r.config.clone()).unwrap_or_default()
    }
}
