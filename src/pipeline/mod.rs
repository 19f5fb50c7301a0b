/// Line pipeline: run histories → plottable lines.
///
/// ```text
///   Vec<RunHistory> ── filter by selected run ids
///        │
///        ▼
///   ┌──────────┐
///   │ extract   │  (x, y) points per run
///   └──────────┘
///        │
///        ├── aggregate on ──▶ ┌───────────┐
///        │                    │ aggregate  │  mean + band per group
///        │                    └───────────┘
///        ├── aggregate off ─▶ titled, coloured run lines
///        ▼
///   ┌──────────┐
///   │  smooth   │  only when smoothing weight > 0
///   └──────────┘
///        │
///        ▼
///     Vec<Line>
/// ```

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod group;
pub mod line;
pub mod smooth;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::color::{ColorProvider, IndexPalette, RUN_OPACITY};
use crate::data::model::{RunCatalog, RunDataset, RunHistory, RunId};
use crate::error::ConfigError;

use config::{AxisScale, GroupBy, PipelineConfig, validate, with_defaults};
use group::{ConfigGroupResolver, GroupIndices, GroupResolver, RunConfig};
use line::{Line, LineRole, NamedLine, Series};

// ---------------------------------------------------------------------------
// LinePlot – everything the renderer needs
// ---------------------------------------------------------------------------

/// Finished lines plus axis settings for the chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePlot {
    /// Plotted y field; `None` when the plot is not configured.
    pub title: Option<String>,
    pub x_label: String,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
    pub lines: Vec<Line>,
}

impl LinePlot {
    pub fn is_configured(&self) -> bool {
        self.title.is_some()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The line pipeline bound to its collaborators: a run catalog for names and
/// configs, a colour provider and a group resolver.
pub struct Pipeline<'a> {
    catalog: &'a dyn RunCatalog,
    colors: Box<dyn ColorProvider + 'a>,
    resolver: Box<dyn GroupResolver + 'a>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with the default palette and config-value grouping.
    pub fn new(catalog: &'a dyn RunCatalog) -> Self {
        Pipeline {
            catalog,
            colors: Box::new(IndexPalette::new()),
            resolver: Box::new(ConfigGroupResolver),
        }
    }

    pub fn with_colors(mut self, colors: impl ColorProvider + 'a) -> Self {
        self.colors = Box::new(colors);
        self
    }

    pub fn with_resolver(mut self, resolver: impl GroupResolver + 'a) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Config fields the given runs can be grouped by.
    pub fn group_candidates<'r, I>(&self, runs: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'r RunId>,
    {
        let configs: Vec<RunConfig> = runs.into_iter().map(|id| self.catalog.config(id)).collect();
        self.resolver.candidates(&configs)
    }

    /// Build the lines for `config` from the runs selected in `filtered`.
    ///
    /// The configuration is defaulted and validated first; an invalid one is
    /// the only error. An unset y field yields no lines.
    pub fn build_lines(
        &self,
        histories: &[RunHistory],
        filtered: &BTreeSet<RunId>,
        config: &PipelineConfig,
    ) -> Result<Vec<Line>, ConfigError> {
        let config = with_defaults(config);
        validate(&config)?;

        let Some(y_key) = config.y_key.as_deref() else {
            log::debug!("y axis not configured, no lines");
            return Ok(Vec::new());
        };

        let selected = histories.iter().filter(|run| filtered.contains(&run.name));
        let extracted = extract::extract(selected, config.x_axis.field(), y_key);
        log::debug!(
            "extracted {} lines ({} points) for {y_key} vs {}",
            extracted.len(),
            extracted.iter().map(|l| l.data.len()).sum::<usize>(),
            config.x_axis.field()
        );

        let lines = if config.aggregate {
            let groups = self.resolve_groups(&extracted, &config.group_by);
            aggregate::aggregate(&extracted, &config.group_by, &groups, y_key, &*self.colors)
        } else {
            self.run_lines(extracted)
        };

        if !config.is_smoothing() {
            return Ok(lines);
        }
        let weight = config.effective_weight();
        log::debug!("smoothing {} lines with weight {weight:.3}", lines.len());
        Ok(smooth::smooth(lines, weight, &*self.colors).into_lines())
    }

    /// Build lines and bundle them with the axis settings.
    pub fn plot(
        &self,
        histories: &[RunHistory],
        filtered: &BTreeSet<RunId>,
        config: &PipelineConfig,
    ) -> Result<LinePlot, ConfigError> {
        let lines = self.build_lines(histories, filtered, config)?;
        let config = with_defaults(config);
        Ok(LinePlot {
            title: config.y_key.clone(),
            x_label: config.x_axis.label().to_string(),
            x_scale: config.x_scale(),
            y_scale: config.y_scale(),
            lines,
        })
    }

    fn resolve_groups(&self, lines: &[NamedLine], group_by: &GroupBy) -> GroupIndices {
        match group_by {
            GroupBy::None => GroupIndices::new(),
            GroupBy::Field(field) => {
                let configs: Vec<RunConfig> =
                    lines.iter().map(|l| self.catalog.config(&l.name)).collect();
                self.resolver.group_indices(&configs, field)
            }
        }
    }

    /// One titled, coloured line per run that has any points.
    fn run_lines(&self, extracted: Vec<NamedLine>) -> Vec<Line> {
        extracted
            .into_iter()
            .filter(|line| !line.data.is_empty())
            .enumerate()
            .map(|(i, line)| Line {
                title: self.catalog.display_name(&line.name),
                color: self.colors.color(i, RUN_OPACITY),
                role: LineRole::Primary,
                series: Series::Points(line.data),
                run: Some(line.name),
            })
            .collect()
    }
}

/// Build lines from a loaded dataset with the default collaborators.
pub fn build_lines(
    dataset: &RunDataset,
    filtered: &BTreeSet<RunId>,
    config: &PipelineConfig,
) -> Result<Vec<Line>, ConfigError> {
    Pipeline::new(dataset).build_lines(&dataset.histories, filtered, config)
}

/// [`build_lines`] bundled with axis settings.
pub fn plot(
    dataset: &RunDataset,
    filtered: &BTreeSet<RunId>,
    config: &PipelineConfig,
) -> Result<LinePlot, ConfigError> {
    Pipeline::new(dataset).plot(&dataset.histories, filtered, config)
}
