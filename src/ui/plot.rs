use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line as PlotLine, Plot, PlotPoints, PlotUi, Polygon};

use crate::pipeline::config::AxisScale;
use crate::pipeline::line::{AreaPoint, Line, LineRole, Point, Series};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Run history plot (central panel)
// ---------------------------------------------------------------------------

/// Render the line plot in the central panel.
pub fn run_plot(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        placeholder(ui, "Open a file to view run histories  (File → Open…)");
        return;
    }
    let no_runs = state.selected_runs.is_empty();

    let Some(plot) = state.line_plot() else {
        placeholder(ui, "Invalid chart configuration");
        return;
    };
    let Some(title) = plot.title.as_deref() else {
        placeholder(ui, "This chart is not yet configured");
        return;
    };
    if no_runs {
        placeholder(ui, &format!("Select runs containing {title} in their history."));
        return;
    }

    ui.heading(title);

    let (x_scale, y_scale) = (plot.x_scale, plot.y_scale);
    Plot::new("run_plot")
        .legend(Legend::default())
        .x_axis_label(axis_label(&plot.x_label, x_scale))
        .y_axis_label(axis_label(title, y_scale))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for line in &plot.lines {
                draw_line(plot_ui, line, x_scale, y_scale);
            }
        });
}

fn placeholder(ui: &mut Ui, text: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(text);
    });
}

fn axis_label(label: &str, scale: AxisScale) -> String {
    match scale {
        AxisScale::Linear => label.to_string(),
        AxisScale::Log => format!("log10 {label}"),
    }
}

/// Map a value onto the axis; `None` when it cannot be shown on a log axis.
fn scaled(v: f64, scale: AxisScale) -> Option<f64> {
    match scale {
        AxisScale::Linear => Some(v),
        AxisScale::Log if v > 0.0 => Some(v.log10()),
        AxisScale::Log => None,
    }
}

fn line_points(points: &[Point], xs: AxisScale, ys: AxisScale) -> Vec<[f64; 2]> {
    points
        .iter()
        .filter_map(|p| Some([scaled(p.x, xs)?, scaled(p.y, ys)?]))
        .collect()
}

/// Closed outline of a band: upper edge left to right, lower edge back.
fn band_outline(area: &[AreaPoint], xs: AxisScale, ys: AxisScale) -> Vec<[f64; 2]> {
    let upper = area
        .iter()
        .filter_map(|a| Some([scaled(a.x, xs)?, scaled(a.y1, ys)?]));
    let lower: Vec<[f64; 2]> = area
        .iter()
        .filter_map(|a| Some([scaled(a.x, xs)?, scaled(a.y0, ys)?]))
        .collect();
    upper.chain(lower.into_iter().rev()).collect()
}

/// Hidden lines (bands, faded originals) are drawn without a name so the
/// legend skips them.
fn draw_line(plot_ui: &mut PlotUi, line: &Line, xs: AxisScale, ys: AxisScale) {
    let color = Color32::from(line.color);
    let name = if line.is_hidden() { "" } else { line.title.as_str() };
    match &line.series {
        Series::Points(points) => {
            let width = match line.role {
                LineRole::FadedOriginal => 1.0,
                _ => 1.5,
            };
            let plot_line = PlotLine::new(PlotPoints::from(line_points(points, xs, ys)))
                .name(name)
                .color(color)
                .width(width);
            plot_ui.line(plot_line);
        }
        Series::Area(area) => {
            let polygon = Polygon::new(PlotPoints::from(band_outline(area, xs, ys)))
                .name(name)
                .fill_color(color)
                .stroke(Stroke::NONE);
            plot_ui.polygon(polygon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_scale_drops_non_positive_values() {
        let pts = vec![Point::new(1.0, 10.0), Point::new(2.0, 0.0), Point::new(3.0, 100.0)];
        let out = line_points(&pts, AxisScale::Linear, AxisScale::Log);
        assert_eq!(out, vec![[1.0, 1.0], [3.0, 2.0]]);
    }

    #[test]
    fn band_outline_walks_upper_then_lower_edge() {
        let area = vec![
            AreaPoint { x: 0.0, y0: 1.0, y1: 2.0 },
            AreaPoint { x: 1.0, y0: 3.0, y1: 5.0 },
        ];
        let out = band_outline(&area, AxisScale::Linear, AxisScale::Linear);
        assert_eq!(out, vec![[0.0, 2.0], [1.0, 5.0], [1.0, 3.0], [0.0, 1.0]]);
    }
}
