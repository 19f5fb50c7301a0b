use crate::data::model::RunHistory;

use super::line::{NamedLine, Point};

/// Turn each run's history into `(x, y)` points for the chosen fields.
///
/// Records without `x_field` use their position in the history, so older
/// runs that never logged the field still plot. Records without a finite
/// `y_field` value contribute nothing. Duplicate `x` values are kept in
/// record order.
pub fn extract<'a, I>(runs: I, x_field: &str, y_field: &str) -> Vec<NamedLine>
where
    I: IntoIterator<Item = &'a RunHistory>,
{
    runs.into_iter()
        .map(|run| NamedLine {
            name: run.name.clone(),
            data: run
                .history
                .iter()
                .enumerate()
                .filter_map(|(j, record)| {
                    let y = record.value(y_field)?;
                    let x = record.value(x_field).unwrap_or(j as f64);
                    Some(Point { x, y })
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::HistoryRecord;

    #[test]
    fn keeps_points_with_y_and_preserves_order() {
        let runs = vec![
            RunHistory::new(
                "a",
                vec![
                    HistoryRecord::new().with("_step", 10.0).with("loss", 1.0),
                    HistoryRecord::new().with("_step", 11.0),
                    HistoryRecord::new().with("_step", 12.0).with("loss", 0.5),
                ],
            ),
            RunHistory::new("b", vec![]),
        ];
        let lines = extract(&runs, "_step", "loss");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].data, vec![Point::new(10.0, 1.0), Point::new(12.0, 0.5)]);
        assert!(lines[1].data.is_empty());
    }

    #[test]
    fn missing_x_falls_back_to_record_index() {
        let mut rec = HistoryRecord::new();
        rec.insert("_runtime", None);
        rec.insert("loss", Some(2.0));
        let runs = vec![RunHistory::new(
            "a",
            vec![HistoryRecord::new().with("loss", 1.0), rec],
        )];
        let lines = extract(&runs, "_runtime", "loss");

        assert_eq!(lines[0].data, vec![Point::new(0.0, 1.0), Point::new(1.0, 2.0)]);
    }

    #[test]
    fn null_and_non_finite_y_are_dropped() {
        let mut null_y = HistoryRecord::new().with("_step", 0.0);
        null_y.insert("loss", None);
        let runs = vec![RunHistory::new(
            "a",
            vec![null_y, HistoryRecord::new().with("_step", 1.0).with("loss", f64::INFINITY)],
        )];
        assert!(extract(&runs, "_step", "loss")[0].data.is_empty());
    }

    #[test]
    fn zero_x_is_kept() {
        let runs = vec![RunHistory::new(
            "a",
            vec![
                HistoryRecord::new().with("loss", 1.0),
                HistoryRecord::new().with("_step", 0.0).with("loss", 2.0),
            ],
        )];
        let lines = extract(&runs, "_step", "loss");
        assert_eq!(lines[0].data[1], Point::new(0.0, 2.0));
    }

    #[test]
    fn duplicate_x_values_are_kept_in_record_order() {
        let runs = vec![RunHistory::new(
            "a",
            vec![
                HistoryRecord::new().with("_step", 3.0).with("loss", 2.0),
                HistoryRecord::new().with("_step", 3.0).with("loss", 1.0),
                HistoryRecord::new().with("_step", 4.0).with("loss", 0.5),
            ],
        )];
        let lines = extract(&runs, "_step", "loss");

        assert_eq!(
            lines[0].data,
            vec![Point::new(3.0, 2.0), Point::new(3.0, 1.0), Point::new(4.0, 0.5)]
        );
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(extract(&Vec::<RunHistory>::new(), "_step", "loss").is_empty());
    }
}
