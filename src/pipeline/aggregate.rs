use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::color::{BAND_OPACITY, ColorProvider};

use super::config::GroupBy;
use super::group::GroupIndices;
use super::line::{AreaPoint, Line, LineRole, NamedLine, Point, Series};

/// `x` as an ordered map key. `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Copy)]
struct XKey(f64);

impl XKey {
    fn new(x: f64) -> Self {
        XKey(if x == 0.0 { 0.0 } else { x })
    }
}

impl PartialEq for XKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for XKey {}

impl PartialOrd for XKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Every `y` observed at each distinct `x` across `lines`, ascending by `x`.
fn collect_by_x<'a, I>(lines: I) -> BTreeMap<XKey, Vec<f64>>
where
    I: IntoIterator<Item = &'a NamedLine>,
{
    let mut by_x: BTreeMap<XKey, Vec<f64>> = BTreeMap::new();
    for line in lines {
        for p in &line.data {
            by_x.entry(XKey::new(p.x)).or_default().push(p.y);
        }
    }
    by_x
}

/// Mean points and min/max band points, one of each per distinct `x`.
fn summarize<'a, I>(lines: I) -> (Vec<Point>, Vec<AreaPoint>)
where
    I: IntoIterator<Item = &'a NamedLine>,
{
    let by_x = collect_by_x(lines);
    let mut mean = Vec::with_capacity(by_x.len());
    let mut band = Vec::with_capacity(by_x.len());
    for (XKey(x), ys) in by_x {
        mean.push(Point {
            x,
            y: ys.iter().sum::<f64>() / ys.len() as f64,
        });
        band.push(AreaPoint {
            x,
            y0: ys.iter().copied().fold(f64::INFINITY, f64::min),
            y1: ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });
    }
    (mean, band)
}

/// Mean line over a group.
pub fn mean_points<'a, I>(lines: I) -> Vec<Point>
where
    I: IntoIterator<Item = &'a NamedLine>,
{
    summarize(lines).0
}

/// Min/max band over a group.
pub fn band_points<'a, I>(lines: I) -> Vec<AreaPoint>
where
    I: IntoIterator<Item = &'a NamedLine>,
{
    summarize(lines).1
}

/// Collapse one group into its mean line and band line, coloured by
/// `color_index`.
pub fn aggregate_group<C>(
    group: &[&NamedLine],
    label: &str,
    color_index: usize,
    colors: &C,
) -> [Line; 2]
where
    C: ColorProvider + ?Sized,
{
    let (mean, band) = summarize(group.iter().copied());

    [
        Line {
            title: format!("Mean {label}"),
            color: colors.color(color_index, 1.0),
            role: LineRole::Mean,
            series: Series::Points(mean),
            run: None,
        },
        Line {
            title: format!("area {label}"),
            color: colors.color(color_index, BAND_OPACITY),
            role: LineRole::Band,
            series: Series::Area(band),
            run: None,
        },
    ]
}

/// Aggregate extracted lines into mean + band pairs.
///
/// With [`GroupBy::None`] every line forms one group labelled `base_label`.
/// Otherwise `groups` maps each value of the group-by field to indices into
/// `lines`; each group is labelled `"{base_label} {field}:{value}"` and gets
/// the next colour index, in the map's order.
pub fn aggregate<C>(
    lines: &[NamedLine],
    group_by: &GroupBy,
    groups: &GroupIndices,
    base_label: &str,
    colors: &C,
) -> Vec<Line>
where
    C: ColorProvider + ?Sized,
{
    match group_by {
        GroupBy::None => {
            let all: Vec<&NamedLine> = lines.iter().collect();
            aggregate_group(&all, base_label, 0, colors).into()
        }
        GroupBy::Field(field) => {
            let mut out = Vec::with_capacity(groups.len() * 2);
            for (color_index, (value, indices)) in groups.iter().enumerate() {
                let members: Vec<&NamedLine> = indices
                    .iter()
                    .filter_map(|&i| {
                        let line = lines.get(i);
                        if line.is_none() {
                            log::warn!("group {field}:{value} refers to missing line {i}");
                        }
                        line
                    })
                    .collect();
                let label = format!("{base_label} {field}:{value}");
                out.extend(aggregate_group(&members, &label, color_index, colors));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::IndexPalette;
    use crate::data::model::{MetadataValue, RunId};

    fn line(name: &str, pts: &[(f64, f64)]) -> NamedLine {
        NamedLine {
            name: RunId::from(name),
            data: pts.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    #[test]
    fn mean_and_band_cover_every_x() {
        let lines = vec![line("a", &[(0.0, 2.0), (1.0, 10.0)]), line("b", &[(0.0, 4.0)])];

        assert_eq!(mean_points(&lines), vec![Point::new(0.0, 3.0), Point::new(1.0, 10.0)]);
        assert_eq!(
            band_points(&lines),
            vec![
                AreaPoint { x: 0.0, y0: 2.0, y1: 4.0 },
                AreaPoint { x: 1.0, y0: 10.0, y1: 10.0 },
            ]
        );
    }

    #[test]
    fn negative_zero_shares_a_bucket() {
        let lines = vec![line("a", &[(0.0, 1.0)]), line("b", &[(-0.0, 3.0)])];
        assert_eq!(mean_points(&lines), vec![Point::new(0.0, 2.0)]);
    }

    #[test]
    fn duplicate_x_in_one_run_counts_twice() {
        let lines = vec![line("a", &[(3.0, 1.0), (3.0, 5.0)]), line("b", &[(3.0, 6.0)])];

        assert_eq!(mean_points(&lines), vec![Point::new(3.0, 4.0)]);
        assert_eq!(band_points(&lines), vec![AreaPoint { x: 3.0, y0: 1.0, y1: 6.0 }]);
    }

    #[test]
    fn ungrouped_produces_mean_and_band() {
        let palette = IndexPalette::new();
        let lines = vec![line("a", &[(0.0, 1.0)]), line("b", &[(0.0, 5.0)])];
        let out = aggregate(&lines, &GroupBy::None, &GroupIndices::new(), "loss", &palette);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Mean loss");
        assert_eq!(out[0].role, LineRole::Mean);
        assert!(!out[0].is_area());
        assert_eq!(out[1].role, LineRole::Band);
        assert!(out[1].is_area() && out[1].is_hidden());
        assert_eq!(out[1].color, palette.color(0, BAND_OPACITY));
    }

    #[test]
    fn grouped_lines_get_titles_and_sequential_colours() {
        let palette = IndexPalette::new();
        let lines = vec![
            line("a", &[(0.0, 1.0)]),
            line("b", &[(0.0, 3.0)]),
            line("c", &[(0.0, 7.0)]),
        ];
        let mut groups = GroupIndices::new();
        groups.insert(MetadataValue::String("adam".into()), vec![1]);
        groups.insert(MetadataValue::String("sgd".into()), vec![0, 2]);

        let out = aggregate(&lines, &GroupBy::Field("opt".into()), &groups, "loss", &palette);
        let titles: Vec<_> = out.iter().map(|l| l.title.as_str()).collect();

        assert_eq!(
            titles,
            vec![
                "Mean loss opt:adam",
                "area loss opt:adam",
                "Mean loss opt:sgd",
                "area loss opt:sgd",
            ]
        );
        assert_eq!(out[0].color, palette.color(0, 1.0));
        assert_eq!(out[2].color, palette.color(1, 1.0));
        assert_eq!(out[2].points().unwrap(), &[Point::new(0.0, 4.0)]);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let palette = IndexPalette::new();
        let lines = vec![line("a", &[(0.0, 1.0)])];
        let mut groups = GroupIndices::new();
        groups.insert(MetadataValue::Integer(1), vec![0, 5]);

        let out = aggregate(&lines, &GroupBy::Field("seed".into()), &groups, "loss", &palette);
        assert_eq!(out[0].points().unwrap(), &[Point::new(0.0, 1.0)]);
    }
}
