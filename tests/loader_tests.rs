//! Loading run histories from disk in each supported format.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use runplot::data::loader::load_file;
use runplot::data::model::{MetadataValue, RunCatalog, RunId};
use runplot::{PipelineConfig, build_lines};

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn json_file_feeds_the_pipeline() {
    let file = write_temp(
        ".json",
        r#"[
            {"name": "a", "history": [{"_step": 0, "loss": 1}, {"_step": 1, "loss": 3}]},
            {"name": "b", "history": [{"_step": 0, "loss": 5}, {"_step": 1, "loss": 7}]}
        ]"#,
    );
    let ds = load_file(file.path()).unwrap();
    let all = ds.runs.iter().map(|r| r.id.clone()).collect();
    let config = PipelineConfig {
        aggregate: true,
        ..PipelineConfig::for_key("loss")
    };

    let lines = build_lines(&ds, &all, &config).unwrap();
    let ys: Vec<f64> = lines[0].points().unwrap().iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![3.0, 5.0]);
}

#[test]
fn csv_file_with_config_and_display_names() {
    let file = write_temp(
        ".csv",
        "run,display_name,config.lr,_step,loss\n\
         r1,first,0.1,0,2.0\n\
         r1,first,0.1,1,1.5\n\
         r2,,0.2,0,3.0\n",
    );
    let ds = load_file(file.path()).unwrap();

    assert_eq!(ds.len(), 2);
    assert_eq!(ds.display_name(&RunId::from("r1")), "first");
    assert_eq!(ds.display_name(&RunId::from("r2")), "r2");
    assert_eq!(
        ds.config_value(&RunId::from("r2"), "lr"),
        Some(MetadataValue::Float(0.2))
    );
    assert_eq!(ds.histories[0].history.len(), 2);
}

#[test]
fn parquet_file_in_long_format() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Utf8, false),
        Field::new("config.seed", DataType::Int64, false),
        Field::new("_step", DataType::Int64, false),
        Field::new("loss", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["a", "a", "b"])),
            Arc::new(Int64Array::from(vec![1, 1, 2])),
            Arc::new(Int64Array::from(vec![0, 1, 0])),
            Arc::new(Float64Array::from(vec![Some(1.0), None, Some(4.0)])),
        ],
    )
    .unwrap();

    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(
        ds.config_value(&RunId::from("b"), "seed"),
        Some(MetadataValue::Integer(2))
    );

    let a = &ds.histories[0];
    assert_eq!(a.history.len(), 2);
    assert_eq!(a.history[0].value("loss"), Some(1.0));
    assert_eq!(a.history[1].value("loss"), None);
    assert_eq!(a.history[1].value("_step"), Some(1.0));
}

#[test]
fn missing_run_column_is_an_error() {
    let file = write_temp(".csv", "_step,loss\n0,1\n");
    let err = load_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("run"));
}
