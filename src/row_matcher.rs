use log::{debug, info};

use crate::catalog::{MetricCatalog, MetricSpec};
use crate::schema::{ExtractedMetricValue, Grid};
use crate::utils::{
    edit_distance_score, is_loosely_contained, normalize_sentence, strip_trailing_numbers,
};

/// Non-empty cells joined and normalized like a sentence, so a label wrapped inside its
/// cell reads as one line. `None` for blank rows.
pub fn row_text(row: &[String]) -> Option<String> {
    let joined = row
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(normalize_sentence(&joined))
    }
}

pub struct FuzzyRowMatcher<'a> {
    catalog: &'a MetricCatalog,
}

impl<'a> FuzzyRowMatcher<'a> {
    pub fn new(catalog: &'a MetricCatalog) -> Self {
        Self { catalog }
    }

    pub fn match_rows(&self, grid: &Grid, start_row: usize, column: usize) -> Vec<ExtractedMetricValue> {
        let found: Vec<ExtractedMetricValue> = self
            .catalog
            .specs()
            .iter()
            .filter_map(|spec| self.best_row(spec, grid, start_row, column))
            .collect();

        info!(
            "Matched {} of {} metrics in sheet rows from {}",
            found.len(),
            self.catalog.specs().len(),
            start_row
        );
        found
    }

    /// Any candidate wins if it is the best seen; there is no minimum score.
    pub fn best_row(
        &self,
        spec: &MetricSpec,
        grid: &Grid,
        start_row: usize,
        column: usize,
    ) -> Option<ExtractedMetricValue> {
        let label = spec.label();
        let mut best: Option<(usize, f64)> = None;

        for (idx, row) in grid.rows().enumerate().skip(start_row) {
            let Some(text) = row_text(row) else {
                continue;
            };
            if !is_loosely_contained(&label, &text, spec.excluded_prefix) {
                continue;
            }

            let score = edit_distance_score(&label, &strip_trailing_numbers(&text));
            debug!("{} candidate row {} scored {:.1}", spec.metric, idx, score);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        let (row_index, score) = best?;
        Some(ExtractedMetricValue {
            metric: spec.metric,
            row_index,
            raw_cell_value: grid.cell(row_index, column).trim().to_string(),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Metric;

    fn grid() -> Grid {
        Grid::from_rows(vec![
            vec!["", "3Q", "2Q"],
            vec!["", "2024", "2024"],
            vec!["Net income applicable to common", "3,000", "2,950"],
            vec!["Net income", "3,217", "3,150"],
            vec!["Tangible book value per share", "55.10", "54.20"],
            vec!["", "", ""],
            vec!["Revenues, net of interest expense", "12,345", "12,001"],
        ])
    }

    fn matched(metric: Metric) -> Option<ExtractedMetricValue> {
        let catalog = MetricCatalog::standard();
        FuzzyRowMatcher::new(catalog).best_row(catalog.get(metric).unwrap(), &grid(), 2, 1)
    }

    #[test]
    fn test_exact_label_beats_longer_label() {
        let m = matched(Metric::NetIncome).unwrap();
        assert_eq!(m.row_index, 3);
        assert_eq!(m.raw_cell_value, "3,217");
        assert_eq!(m.score, 100.0);
    }

    #[test]
    fn test_tangible_row_does_not_count_as_book_value() {
        assert!(matched(Metric::BookValuePerShare).is_none());
        let tbv = matched(Metric::TangibleBookValuePerShare).unwrap();
        assert_eq!(tbv.row_index, 4);
        assert_eq!(tbv.raw_cell_value, "55.10");
    }

    #[test]
    fn test_poor_match_still_accepted() {
        let m = matched(Metric::Revenues).unwrap();
        assert_eq!(m.row_index, 6);
        assert!(m.score < 50.0);
        assert_eq!(m.raw_cell_value, "12,345");
    }

    #[test]
    fn test_rows_above_start_are_ignored() {
        let catalog = MetricCatalog::standard();
        let spec = catalog.get(Metric::NetIncome).unwrap();
        let m = FuzzyRowMatcher::new(catalog).best_row(spec, &grid(), 4, 1);
        assert!(m.is_none());
    }

    #[test]
    fn test_tie_keeps_topmost_row() {
        let grid = Grid::from_rows(vec![
            vec!["Net income", "1"],
            vec!["Net income", "2"],
        ]);
        let catalog = MetricCatalog::standard();
        let found = FuzzyRowMatcher::new(catalog).match_rows(&grid, 0, 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_cell_value, "1");
    }

    #[test]
    fn test_row_text() {
        let row = vec!["  Net Income ".to_string(), "".to_string(), "3,217".to_string()];
        assert_eq!(row_text(&row).as_deref(), Some("net income 3,217"));
        assert_eq!(row_text(&[String::new()]), None);

        let wrapped = vec!["Tangible\nbook  value per share".to_string(), "55.10".to_string()];
        assert_eq!(
            row_text(&wrapped).as_deref(),
            Some("tangible book value per share 55.10")
        );
    }

    #[test]
    fn test_wrapped_tangible_label_does_not_count_as_book_value() {
        let catalog = MetricCatalog::standard();
        let matcher = FuzzyRowMatcher::new(catalog);
        let book_value = catalog.get(Metric::BookValuePerShare).unwrap();
        let tangible = catalog.get(Metric::TangibleBookValuePerShare).unwrap();

        for label in [
            "Tangible\nbook value per share",
            "Tangible  book value per share",
            "Tangible\r\n book value\tper share",
        ] {
            let grid = Grid::from_rows(vec![vec![label, "55.10"]]);
            assert!(
                matcher.best_row(book_value, &grid, 0, 1).is_none(),
                "{:?} matched book value per share",
                label
            );
            let tbv = matcher.best_row(tangible, &grid, 0, 1).unwrap();
            assert_eq!(tbv.raw_cell_value, "55.10");
        }
    }
}
