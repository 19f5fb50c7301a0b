use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{HistoryRecord, MetadataValue, RunDataset, RunHistory, RunInfo};

/// Column naming the run a row belongs to (CSV / Parquet).
pub const RUN_COLUMN: &str = "run";
/// Optional column with the run's display name (CSV / Parquet).
pub const DISPLAY_NAME_COLUMN: &str = "display_name";
/// Prefix marking configuration columns (CSV / Parquet).
pub const CONFIG_PREFIX: &str = "config.";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load run histories from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – long format, one row per logged step (recommended)
/// * `.json`    – `[{ "name": ..., "config": {...}, "history": [{...}] }, ...]`
/// * `.csv`     – long format, same columns as Parquet
///
/// Long format: a `run` column, an optional `display_name` column,
/// `config.<field>` columns and one column per history field.
pub fn load_file(path: &Path) -> Result<RunDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::debug!(
        "{}: {} runs, history keys {:?}",
        path.display(),
        dataset.len(),
        dataset.history_keys
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Run assembly shared by the long-format loaders
// ---------------------------------------------------------------------------

/// Collects rows into runs, preserving first-seen run order and row order.
#[derive(Default)]
struct RunsBuilder {
    index: HashMap<String, usize>,
    runs: Vec<RunInfo>,
    histories: Vec<Vec<HistoryRecord>>,
}

impl RunsBuilder {
    fn entry(&mut self, run: &str) -> usize {
        if let Some(&i) = self.index.get(run) {
            return i;
        }
        let i = self.runs.len();
        self.index.insert(run.to_string(), i);
        self.runs.push(RunInfo::new(run));
        self.histories.push(Vec::new());
        i
    }

    /// Config and display name come from the first row of each run.
    fn set_meta_if_absent(&mut self, run: usize, field: &str, value: MetadataValue) {
        self.runs[run].config.entry(field.to_string()).or_insert(value);
    }

    fn set_display_name_if_absent(&mut self, run: usize, name: &str) {
        if !name.is_empty() && self.runs[run].display_name.is_none() {
            self.runs[run].display_name = Some(name.to_string());
        }
    }

    fn push(&mut self, run: usize, record: HistoryRecord) {
        self.histories[run].push(record);
    }

    fn finish(self) -> RunDataset {
        let histories = self
            .runs
            .iter()
            .zip(self.histories)
            .map(|(info, history)| RunHistory {
                name: info.id.clone(),
                history,
            })
            .collect();
        RunDataset::from_runs(self.runs, histories)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// [
///   {
///     "name": "run-1",
///     "displayName": "brisk-sun-1",
///     "config": { "lr": 0.01, "optimizer": "adam" },
///     "history": [ { "_step": 0, "loss": 2.3 }, { "_step": 1, "loss": null } ]
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RunDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse the JSON run layout from a string.
pub fn parse_json(text: &str) -> Result<RunDataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut runs = Vec::with_capacity(records.len());
    let mut histories = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Run {i} is not a JSON object"))?;

        let name = match obj.get("name") {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            _ => bail!("Run {i}: missing or invalid 'name'"),
        };

        let mut info = RunInfo::new(name.as_str());
        info.display_name = obj
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(config) = obj.get("config") {
            let config = config
                .as_object()
                .with_context(|| format!("Run {name}: 'config' is not an object"))?;
            info.config = config
                .iter()
                .map(|(k, v)| (k.clone(), json_to_metadata(v)))
                .collect::<BTreeMap<_, _>>();
        }

        let rows = obj
            .get("history")
            .and_then(|v| v.as_array())
            .with_context(|| format!("Run {name}: missing or invalid 'history' array"))?;

        let history = rows
            .iter()
            .enumerate()
            .map(|(j, row)| -> Result<HistoryRecord> {
                let row = row
                    .as_object()
                    .with_context(|| format!("Run {name}, history[{j}]: not an object"))?;
                Ok(row.iter().map(|(k, v)| (k.clone(), v.as_f64())).collect())
            })
            .collect::<Result<Vec<HistoryRecord>>>()?;

        histories.push(RunHistory {
            name: info.id.clone(),
            history,
        });
        runs.push(info);
    }

    Ok(RunDataset::from_runs(runs, histories))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        // Nested config sections are shown as their JSON text.
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one row per logged step.
/// Empty history cells are null.
fn load_csv(path: &Path) -> Result<RunDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    parse_csv(file)
}

/// Parse the long CSV layout from any reader.
pub fn parse_csv<R: std::io::Read>(input: R) -> Result<RunDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let run_idx = headers
        .iter()
        .position(|h| h == RUN_COLUMN)
        .context("CSV missing 'run' column")?;
    let display_idx = headers.iter().position(|h| h == DISPLAY_NAME_COLUMN);

    let mut builder = RunsBuilder::default();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let run_name = record.get(run_idx).unwrap_or("").trim();
        if run_name.is_empty() {
            bail!("CSV row {row_no}: empty 'run' value");
        }
        let run = builder.entry(run_name);

        let mut history = HistoryRecord::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == run_idx {
                continue;
            }
            let col_name = &headers[col_idx];
            if Some(col_idx) == display_idx {
                builder.set_display_name_if_absent(run, value.trim());
            } else if let Some(field) = col_name.strip_prefix(CONFIG_PREFIX) {
                builder.set_meta_if_absent(run, field, guess_metadata_type(value));
            } else {
                let parsed = parse_history_cell(value)
                    .with_context(|| format!("CSV row {row_no}, column '{col_name}'"))?;
                history.insert(col_name.as_str(), parsed);
            }
        }
        builder.push(run, history);
    }

    Ok(builder.finish())
}

fn parse_history_cell(s: &str) -> Result<Option<f64>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let v = s
        .parse::<f64>()
        .with_context(|| format!("'{s}' is not a number"))?;
    Ok(Some(v))
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of run histories.
///
/// Expected schema (long format, one row per logged step):
/// - `run`: Utf8 / LargeUtf8 / integer – run identifier
/// - `display_name`: optional Utf8
/// - `config.<field>`: configuration values (strings, ints, floats, bools)
/// - any other numeric column is a history field; nulls are missing values
fn load_parquet(path: &Path) -> Result<RunDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut runs = RunsBuilder::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        let run_idx = schema
            .index_of(RUN_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'run' column"))?;
        let display_idx = schema.index_of(DISPLAY_NAME_COLUMN).ok();
        let run_col = batch.column(run_idx);

        let mut config_cols: Vec<(usize, String)> = Vec::new();
        let mut history_cols: Vec<(usize, String)> = Vec::new();
        for (i, field) in schema.fields().iter().enumerate() {
            if i == run_idx || Some(i) == display_idx {
                continue;
            }
            if let Some(name) = field.name().strip_prefix(CONFIG_PREFIX) {
                config_cols.push((i, name.to_string()));
            } else if is_numeric(field.data_type()) {
                history_cols.push((i, field.name().clone()));
            } else {
                log::warn!(
                    "Skipping non-numeric history column '{}' ({:?})",
                    field.name(),
                    field.data_type()
                );
            }
        }

        for row in 0..n_rows {
            let run_name = extract_string(run_col, row)
                .with_context(|| format!("Row {row}: failed to read 'run'"))?;
            let run = runs.entry(&run_name);

            if let Some(idx) = display_idx {
                if let Ok(name) = extract_string(batch.column(idx), row) {
                    runs.set_display_name_if_absent(run, &name);
                }
            }
            for (col_idx, field) in &config_cols {
                let value = extract_metadata_value(batch.column(*col_idx), row);
                runs.set_meta_if_absent(run, field, value);
            }

            let record: HistoryRecord = history_cols
                .iter()
                .map(|(col_idx, name)| (name.clone(), extract_f64(batch.column(*col_idx), row)))
                .collect();
            runs.push(run, record);
        }
    }

    Ok(runs.finish())
}

// -- Parquet / Arrow helpers --

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Extract a string-like cell (run identifiers may also be integers).
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    let s = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        other => bail!("Expected string or integer column, got {other:?}"),
    };
    Ok(s)
}

/// Extract a numeric history cell; null becomes `None`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => Some(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Some(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Int64 => Some(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Int32 => Some(col.as_primitive::<Int32Type>().value(row) as f64),
        _ => None,
    }
}

/// Extract a single configuration value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            MetadataValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => MetadataValue::Bool(col.as_boolean().value(row)),
        _ => MetadataValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{RunCatalog, RunId};

    #[test]
    fn json_runs_keep_order_and_nulls() {
        let text = r#"[
            {"name": "a", "displayName": "alpha", "config": {"lr": 0.1, "opt": "adam"},
             "history": [{"_step": 0, "loss": 1.0}, {"_step": 1, "loss": null}]},
            {"name": "b", "history": []}
        ]"#;
        let ds = parse_json(text).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.histories[0].name, RunId::from("a"));
        assert_eq!(ds.histories[0].history.len(), 2);
        assert_eq!(ds.histories[0].history[1].value("loss"), None);
        assert_eq!(ds.histories[0].history[1].value("_step"), Some(1.0));
        assert!(ds.histories[1].history.is_empty());
        assert_eq!(ds.display_name(&RunId::from("a")), "alpha");
        assert_eq!(
            ds.config_value(&RunId::from("a"), "opt"),
            Some(MetadataValue::String("adam".into()))
        );
    }

    #[test]
    fn json_rejects_missing_history() {
        let err = parse_json(r#"[{"name": "a"}]"#).unwrap_err();
        assert!(format!("{err:#}").contains("history"));
    }

    #[test]
    fn csv_groups_rows_by_run() {
        let text = "run,config.opt,_step,loss\n\
                    b,sgd,0,5\n\
                    a,adam,0,1\n\
                    b,sgd,1,\n\
                    a,adam,1,3\n";
        let ds = parse_csv(text.as_bytes()).unwrap();

        let names: Vec<_> = ds.histories.iter().map(|h| h.name.to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(ds.histories[0].history.len(), 2);
        assert_eq!(ds.histories[0].history[1].value("loss"), None);
        assert_eq!(ds.histories[1].history[1].value("loss"), Some(3.0));
        assert_eq!(
            ds.config_value(&RunId::from("a"), "opt"),
            Some(MetadataValue::String("adam".into()))
        );
        assert!(!ds.history_keys.contains("config.opt"));
    }

    #[test]
    fn csv_reports_bad_cells() {
        let err = parse_csv("run,loss\na,abc\n".as_bytes()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("loss"), "{msg}");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("runs.xlsx")).is_err());
    }
}
