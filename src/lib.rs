//! Run history line plots.
//!
//! Turns per-run metric histories into plottable line series (extraction,
//! cross-run aggregation into mean and min/max bands, debiased exponential
//! smoothing) and shows them in an egui viewer.

pub mod app;
pub mod color;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod ui;

pub use error::ConfigError;
pub use pipeline::config::PipelineConfig;
pub use pipeline::{LinePlot, Pipeline, build_lines, plot};
