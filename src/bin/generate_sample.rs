use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue, json};

const STEPS: usize = 300;
/// Accuracy is evaluated every this many steps; other rows log it as null.
const EVAL_EVERY: usize = 10;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One synthetic run.
struct SampleRun {
    name: String,
    display_name: String,
    optimizer: &'static str,
    lr: f64,
    batch_size: i64,
    /// (_step, _runtime, _timestamp, loss, accuracy)
    rows: Vec<(i64, f64, f64, f64, Option<f64>)>,
}

fn simulate(
    index: usize,
    optimizer: &'static str,
    lr: f64,
    batch_size: i64,
    rng: &mut SimpleRng,
) -> SampleRun {
    // Adam converges faster; larger learning rates converge faster but noisier.
    let base_rate = if optimizer == "adam" { 0.02 } else { 0.008 };
    let rate = base_rate * (lr / 0.001).sqrt();
    let noise = 0.02 + lr * 5.0;
    let start = 1_700_000_000.0 + index as f64 * 3600.0;

    let mut runtime = 0.0;
    let rows = (0..STEPS)
        .map(|step| {
            runtime += 0.5 + rng.next_f64() * 0.1;
            let loss = 2.3 * (-rate * step as f64).exp() + 0.1 + rng.gauss(0.0, noise);
            let accuracy = (step % EVAL_EVERY == 0)
                .then(|| (1.0 - loss / 2.4).clamp(0.0, 1.0));
            (step as i64, runtime, start + runtime, loss, accuracy)
        })
        .collect();

    SampleRun {
        name: format!("run-{index:03}"),
        display_name: format!("{optimizer}-lr{lr}-{index}"),
        optimizer,
        lr,
        batch_size,
        rows,
    }
}

fn write_parquet(runs: &[SampleRun], path: &str) -> Result<()> {
    let rows = || runs.iter().flat_map(|r| r.rows.iter().map(move |row| (r, row)));

    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Utf8, false),
        Field::new("display_name", DataType::Utf8, false),
        Field::new("config.optimizer", DataType::Utf8, false),
        Field::new("config.lr", DataType::Float64, false),
        Field::new("config.batch_size", DataType::Int64, false),
        Field::new("_step", DataType::Int64, false),
        Field::new("_runtime", DataType::Float64, false),
        Field::new("_timestamp", DataType::Float64, false),
        Field::new("loss", DataType::Float64, false),
        Field::new("accuracy", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows().map(|(r, _)| r.name.as_str()))),
            Arc::new(StringArray::from_iter_values(
                rows().map(|(r, _)| r.display_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(rows().map(|(r, _)| r.optimizer))),
            Arc::new(Float64Array::from_iter_values(rows().map(|(r, _)| r.lr))),
            Arc::new(Int64Array::from_iter_values(rows().map(|(r, _)| r.batch_size))),
            Arc::new(Int64Array::from_iter_values(rows().map(|(_, row)| row.0))),
            Arc::new(Float64Array::from_iter_values(rows().map(|(_, row)| row.1))),
            Arc::new(Float64Array::from_iter_values(rows().map(|(_, row)| row.2))),
            Arc::new(Float64Array::from_iter_values(rows().map(|(_, row)| row.3))),
            Arc::new(rows().map(|(_, row)| row.4).collect::<Float64Array>()),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_json(runs: &[SampleRun], path: &str) -> Result<()> {
    let records: Vec<JsonValue> = runs
        .iter()
        .map(|r| {
            let history: Vec<JsonValue> = r
                .rows
                .iter()
                .map(|&(step, runtime, timestamp, loss, accuracy)| {
                    let mut row = Map::new();
                    row.insert("_step".into(), json!(step));
                    row.insert("_runtime".into(), json!(runtime));
                    row.insert("_timestamp".into(), json!(timestamp));
                    row.insert("loss".into(), json!(loss));
                    row.insert("accuracy".into(), json!(accuracy));
                    JsonValue::Object(row)
                })
                .collect();
            json!({
                "name": r.name,
                "displayName": r.display_name,
                "config": {
                    "optimizer": r.optimizer,
                    "lr": r.lr,
                    "batch_size": r.batch_size,
                },
                "history": history,
            })
        })
        .collect();

    let text = serde_json::to_string(&records).context("serializing runs")?;
    std::fs::write(path, text).with_context(|| format!("writing {path}"))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let optimizers = ["adam", "sgd"];
    let learning_rates = [0.001, 0.01];
    let seeds_per_setting = 3;

    let mut runs = Vec::new();
    for &optimizer in &optimizers {
        for &lr in &learning_rates {
            for _ in 0..seeds_per_setting {
                let batch_size = if runs.len() % 2 == 0 { 32 } else { 64 };
                runs.push(simulate(runs.len(), optimizer, lr, batch_size, &mut rng));
            }
        }
    }

    write_parquet(&runs, "sample_runs.parquet")?;
    write_json(&runs, "sample_runs.json")?;

    log::info!("generated {} runs", runs.len());
    println!(
        "Wrote {} runs ({STEPS} steps each) to sample_runs.parquet and sample_runs.json",
        runs.len()
    );
    Ok(())
}
