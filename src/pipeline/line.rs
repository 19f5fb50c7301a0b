use serde::Serialize;

use crate::color::Rgba;
use crate::data::model::RunId;

/// One plotted sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Min/max spread across a group of runs at one `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaPoint {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

/// The samples of a line: plain points or a band.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Series {
    Points(Vec<Point>),
    Area(Vec<AreaPoint>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Points(p) => p.len(),
            Series::Area(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a line stands for, and therefore how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineRole {
    /// A single run's values.
    Primary,
    /// Mean across a group of runs.
    Mean,
    /// Min/max band across a group of runs.
    Band,
    /// Unsmoothed values drawn faintly behind their smoothed line.
    FadedOriginal,
    Smoothed,
}

/// A finished line ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Display text only; the role carries all drawing semantics.
    pub title: String,
    pub color: Rgba,
    pub role: LineRole,
    pub series: Series,
    /// Source run, for lines that show a single run.
    pub run: Option<RunId>,
}

impl Line {
    pub fn is_area(&self) -> bool {
        matches!(self.series, Series::Area(_))
    }

    /// Background lines are never smoothed and are drawn faintly.
    pub fn is_hidden(&self) -> bool {
        matches!(self.role, LineRole::Band | LineRole::FadedOriginal)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Points of a non-band line.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.series {
            Series::Points(p) => Some(p),
            Series::Area(_) => None,
        }
    }
}

/// A run's extracted points before titles and colours are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedLine {
    pub name: RunId,
    pub data: Vec<Point>,
}
