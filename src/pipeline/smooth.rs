//! Exponential moving average with startup debiasing.
//!
//! A plain EMA seeded with zero lags towards zero for the first few points:
//! with weight `w` and a constant input `c`, after `t` points it reads
//! `c * (1 - w^t)`. Dividing by `1 - w^t` removes that bias, so early points
//! track the data instead of climbing up from zero.

use crate::color::{ColorProvider, FADED_OPACITY};

use super::line::{Line, LineRole, Point, Series};

/// Debiased EMA of `values` in slice order.
///
/// The first output equals the first input. A weight of `1` never decays, so
/// every output stays at the first input. Weights are expected in `[0, 1]`.
pub fn ema_debiased(values: &[f64], weight: f64) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    if weight >= 1.0 {
        return vec![first; values.len()];
    }

    let mut last = (1.0 - weight) * first;
    let mut num_accum: i32 = 1;
    let mut out = Vec::with_capacity(values.len());
    out.push(first);
    for &y in &values[1..] {
        last = last * weight + (1.0 - weight) * y;
        num_accum = num_accum.saturating_add(1);
        let debias = 1.0 - weight.powi(num_accum);
        out.push(last / debias);
    }
    out
}

/// Smooth the `y` values of `points`, keeping every `x` in place.
pub fn smooth_points(points: &[Point], weight: f64) -> Vec<Point> {
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    points
        .iter()
        .zip(ema_debiased(&ys, weight))
        .map(|(p, y)| Point { x: p.x, y })
        .collect()
}

/// Lines after smoothing, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedLines {
    /// Background lines (bands) passed through untouched.
    pub passthrough: Vec<Line>,
    /// Visible lines re-coloured faintly to sit behind their smoothed copy.
    pub faded: Vec<Line>,
    pub smoothed: Vec<Line>,
}

impl SmoothedLines {
    /// `passthrough ++ faded ++ smoothed`.
    pub fn into_lines(self) -> Vec<Line> {
        let mut lines = self.passthrough;
        lines.extend(self.faded);
        lines.extend(self.smoothed);
        lines
    }
}

/// Smooth every visible line with the given filter weight.
///
/// Hidden lines pass through. Each visible line `i` yields a faded copy
/// (colour `i` at low opacity) and a smoothed copy (colour `i`, opaque)
/// with the same title.
pub fn smooth<C>(lines: Vec<Line>, weight: f64, colors: &C) -> SmoothedLines
where
    C: ColorProvider + ?Sized,
{
    let (passthrough, visible): (Vec<Line>, Vec<Line>) =
        lines.into_iter().partition(Line::is_hidden);

    let mut faded = Vec::with_capacity(visible.len());
    let mut smoothed = Vec::with_capacity(visible.len());
    for (i, line) in visible.into_iter().enumerate() {
        let series = match &line.series {
            Series::Points(points) => Series::Points(smooth_points(points, weight)),
            // Visible bands do not occur; keep the data as is.
            Series::Area(area) => Series::Area(area.clone()),
        };
        smoothed.push(Line {
            title: line.title.clone(),
            color: colors.color(i, 1.0),
            role: LineRole::Smoothed,
            series,
            run: line.run.clone(),
        });
        faded.push(Line {
            color: colors.color(i, FADED_OPACITY),
            role: LineRole::FadedOriginal,
            ..line
        });
    }

    SmoothedLines {
        passthrough,
        faded,
        smoothed,
    }
}
