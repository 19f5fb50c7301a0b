use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

/// History field plotted on the x axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum XAxis {
    #[default]
    Step,
    Runtime,
    Timestamp,
    /// Any other logged field.
    Field(String),
}

impl XAxis {
    /// The three built-in axes offered to a user.
    pub const BUILTIN: [XAxis; 3] = [XAxis::Step, XAxis::Runtime, XAxis::Timestamp];

    /// History field the x values are read from.
    pub fn field(&self) -> &str {
        match self {
            XAxis::Step => "_step",
            XAxis::Runtime => "_runtime",
            XAxis::Timestamp => "_timestamp",
            XAxis::Field(f) => f,
        }
    }

    /// Axis label text.
    pub fn label(&self) -> &str {
        match self {
            XAxis::Step => "Step",
            XAxis::Runtime => "Relative Time (s)",
            XAxis::Timestamp => "Absolute Time",
            XAxis::Field(f) => f,
        }
    }
}

impl From<String> for XAxis {
    fn from(s: String) -> Self {
        match s.as_str() {
            "_step" => XAxis::Step,
            "_runtime" => XAxis::Runtime,
            "_timestamp" => XAxis::Timestamp,
            _ => XAxis::Field(s),
        }
    }
}

impl From<XAxis> for String {
    fn from(axis: XAxis) -> Self {
        axis.field().to_string()
    }
}

/// Axis scale handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl AxisScale {
    pub fn from_log_flag(log: bool) -> Self {
        if log {
            AxisScale::Log
        } else {
            AxisScale::Linear
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// How runs are bucketed when aggregating.
///
/// Serialized as the field name, with `"None"` standing for no grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupBy {
    /// Aggregate all runs together.
    #[default]
    None,
    /// One group per distinct value of this config field.
    Field(String),
}

impl From<String> for GroupBy {
    fn from(s: String) -> Self {
        if s == "None" {
            GroupBy::None
        } else {
            GroupBy::Field(s)
        }
    }
}

impl From<GroupBy> for String {
    fn from(g: GroupBy) -> Self {
        match g {
            GroupBy::None => "None".to_string(),
            GroupBy::Field(f) => f,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::None => f.write_str("None"),
            GroupBy::Field(field) => f.write_str(field),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Parameters of one line plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// X axis field.
    pub x_axis: XAxis,
    /// Y axis field. `None` means the plot is not configured yet.
    #[serde(rename = "key")]
    pub y_key: Option<String>,
    /// Smoothing strength in `[0, 1]`; 0 disables smoothing.
    pub smoothing_weight: f64,
    /// Collapse runs into mean and min/max band lines.
    pub aggregate: bool,
    pub group_by: GroupBy,
    pub x_log_scale: bool,
    pub y_log_scale: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            x_axis: XAxis::Step,
            y_key: None,
            smoothing_weight: 0.0,
            aggregate: false,
            group_by: GroupBy::None,
            x_log_scale: false,
            y_log_scale: false,
        }
    }
}

impl PipelineConfig {
    /// Config plotting `key` against the step with everything else default.
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            y_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Filter weight actually applied: the square root of the configured
    /// strength, so the slider feels linear.
    pub fn effective_weight(&self) -> f64 {
        self.smoothing_weight.max(0.0).sqrt()
    }

    pub fn is_smoothing(&self) -> bool {
        self.smoothing_weight > 0.0
    }

    pub fn x_scale(&self) -> AxisScale {
        AxisScale::from_log_flag(self.x_log_scale)
    }

    pub fn y_scale(&self) -> AxisScale {
        AxisScale::from_log_flag(self.y_log_scale)
    }
}

/// Fill in defaults for unset or blank values. Returns a new config and
/// leaves the caller's untouched.
pub fn with_defaults(config: &PipelineConfig) -> PipelineConfig {
    let mut out = config.clone();
    if let XAxis::Field(f) = &out.x_axis {
        if f.trim().is_empty() {
            out.x_axis = XAxis::Step;
        }
    }
    if out.y_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
        out.y_key = None;
    }
    if let GroupBy::Field(f) = &out.group_by {
        if f.trim().is_empty() {
            out.group_by = GroupBy::None;
        }
    }
    out
}

/// Reject configurations the pipeline cannot run with.
pub fn validate(config: &PipelineConfig) -> Result<(), ConfigError> {
    let w = config.smoothing_weight;
    if !w.is_finite() || !(0.0..=1.0).contains(&w) {
        return Err(ConfigError::SmoothingWeight(w));
    }
    Ok(())
}
