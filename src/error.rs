//! Error types for the line pipeline.

use thiserror::Error;

/// Invalid pipeline configuration, reported before any line is computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Smoothing weight is NaN, infinite or outside `[0, 1]`.
    #[error("smoothing weight must be within [0, 1], got {0}")]
    SmoothingWeight(f64),
}
