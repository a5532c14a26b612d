//! # Metric Recon
//!
//! Pulls five headline metrics out of a bank's quarterly earnings report (narrative PDF)
//! and its summary workbook (tabular sheet), then checks that the two agree.
//!
//! ## Pipeline
//!
//! - **Period**: the reporting quarter and year come from each file name ([`period`]).
//! - **Narrative side**: per-metric regexes scan the report's sentences ([`extraction`]),
//!   and the most frequent value for the period wins ([`disambiguation`]).
//! - **Tabular side**: the quarter/year header rows locate the period's column ([`header`]),
//!   and fuzzy label matching picks the row for each metric ([`row_matcher`]).
//! - **Comparison**: values are reconciled with a relative tolerance, retrying at
//!   ×1000 and ÷1000 for unknown sheet units ([`comparator`]).
//!
//! Missing periods, metrics and columns are not errors: the affected side simply reports
//! fewer metrics, and the comparison marks them `No Match`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use metric_recon::*;
//!
//! let sentences = vec!["our cet1 capital ratio of 13.6% in q3 2024".to_string()];
//! let grid = Grid::from_rows(vec![
//!     vec!["", "2Q", "3Q"],
//!     vec!["", "2024", "2024"],
//!     vec!["CET1 capital ratio", "0.134", "0.136"],
//! ]);
//!
//! let records = reconcile_sources(
//!     "2024Q3_report.pdf",
//!     &sentences,
//!     "3Q24_summary.xlsx",
//!     &grid,
//!     DEFAULT_TOLERANCE,
//! );
//! assert_eq!(records[0].match_status, MatchStatus::Match);
//! ```

pub mod catalog;
pub mod comparator;
pub mod config;
pub mod disambiguation;
pub mod error;
pub mod extraction;
pub mod header;
pub mod ingestion;
pub mod period;
pub mod row_matcher;
pub mod schema;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use catalog::{MetricCatalog, MetricSpec};
pub use comparator::{
    compare_values, parse_narrative_metric, parse_tabular_metric, prepare_parsed_data,
    NarrativeMetrics, TabularMetrics, DEFAULT_TOLERANCE,
};
pub use config::{Approach, ReconcileConfig};
pub use disambiguation::FrequencyDisambiguator;
pub use error::{ReconcileError, Result};
pub use extraction::TextMetricExtractor;
pub use header::{locate, HeaderLookup};
pub use period::{resolve_period, resolve_period_from_path};
pub use row_matcher::FuzzyRowMatcher;
pub use schema::*;

use log::{debug, info, warn};
use std::path::Path;

/// Runs both extraction paths and the comparison with one catalog and tolerance.
pub struct MetricReconciler<'a> {
    catalog: &'a MetricCatalog,
    tolerance: f64,
}

impl MetricReconciler<'static> {
    pub fn standard() -> Self {
        Self::new(MetricCatalog::standard(), DEFAULT_TOLERANCE)
    }
}

impl<'a> MetricReconciler<'a> {
    pub fn new(catalog: &'a MetricCatalog, tolerance: f64) -> Self {
        Self { catalog, tolerance }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// One voted value per metric found in `sentences` for `quarter`.
    pub fn canonical_values<S: AsRef<str>>(
        &self,
        sentences: &[S],
        quarter: Quarter,
    ) -> Vec<CanonicalMetricValue> {
        let observations = TextMetricExtractor::new(self.catalog).extract_raw(sentences);
        FrequencyDisambiguator::select(&observations, quarter)
    }

    /// Narrative-side values, or nothing when the file name carries no period.
    pub fn narrative_metrics<S: AsRef<str>>(
        &self,
        filename: &str,
        sentences: &[S],
    ) -> NarrativeMetrics {
        let Some(period) = resolve_period_from_path(Path::new(filename)) else {
            warn!("Didn't find quarter and year in '{}'", filename);
            return NarrativeMetrics::new();
        };

        self.canonical_values(sentences, period.quarter)
            .into_iter()
            .map(|c| (c.metric, c.to_narrative_value()))
            .collect()
    }

    /// Matched sheet rows for `period`, or nothing when the header or column is missing.
    pub fn table_values(&self, grid: &Grid, period: &ReportingPeriod) -> Vec<ExtractedMetricValue> {
        match locate(grid, period) {
            HeaderLookup::Found(location) => FuzzyRowMatcher::new(self.catalog).match_rows(
                grid,
                location.first_data_row(),
                location.target_column_index,
            ),
            HeaderLookup::HeaderNotFound => {
                warn!("Didn't find the quarter/year header rows of the table");
                Vec::new()
            }
            HeaderLookup::ColumnNotFound(_) => {
                warn!("Didn't find a column for {} in the table", period);
                Vec::new()
            }
        }
    }

    /// Tabular-side values; cells that are not numbers are dropped.
    pub fn tabular_metrics(&self, filename: &str, grid: &Grid) -> TabularMetrics {
        let Some(period) = resolve_period_from_path(Path::new(filename)) else {
            warn!("Didn't find quarter and year in '{}'", filename);
            return TabularMetrics::new();
        };

        let mut metrics = TabularMetrics::new();
        for found in self.table_values(grid, &period) {
            match parse_tabular_metric(&found.raw_cell_value) {
                Some(value) => {
                    metrics.insert(found.metric, value);
                }
                None => debug!(
                    "Row {} for {} holds non-numeric '{}'",
                    found.row_index, found.metric, found.raw_cell_value
                ),
            }
        }
        metrics
    }

    pub fn reconcile(
        &self,
        narrative: &NarrativeMetrics,
        tabular: &TabularMetrics,
    ) -> Vec<ComparisonRecord> {
        compare_values(narrative, tabular, self.tolerance)
    }

    pub fn run<S: AsRef<str>>(
        &self,
        pdf_name: &str,
        sentences: &[S],
        excel_name: &str,
        grid: &Grid,
    ) -> Vec<ComparisonRecord> {
        info!("Reconciling '{}' against '{}'", pdf_name, excel_name);
        let narrative = self.narrative_metrics(pdf_name, sentences);
        let tabular = self.tabular_metrics(excel_name, grid);
        self.reconcile(&narrative, &tabular)
    }
}

pub fn reconcile_sources<S: AsRef<str>>(
    pdf_name: &str,
    sentences: &[S],
    excel_name: &str,
    grid: &Grid,
    tolerance: f64,
) -> Vec<ComparisonRecord> {
    MetricReconciler::standard()
        .with_tolerance(tolerance)
        .run(pdf_name, sentences, excel_name, grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_grid() -> Grid {
        Grid::from_rows(vec![
            vec!["Selected Financial Data", "", "", ""],
            vec!["($ in millions, except per share)", "2Q", "3Q", "3Q"],
            vec!["", "2024", "2023", "2024"],
            vec!["Net income", "3,150", "2,900", "3,217"],
            vec!["Revenues, net of interest expense", "12,001", "11,800", "12,345"],
            vec!["CET1 capital ratio", "0.134", "0.131", "0.136"],
            vec!["Book value per share", "59.10", "57.00", "60.25"],
            vec!["Tangible book value per share", "54.20", "52.00", "55.10"],
        ])
    }

    fn report_sentences() -> Vec<&'static str> {
        vec![
            "Net income of $3,217M in Q3 2024, up from $2,900M in 3Q23.",
            "Our CET1 capital ratio of 13.6% in the third quarter remained strong.",
            "Revenues of $12.3B for 3Q24.",
            "Revenues of $12.3B reflected growth across segments.",
            "Revenues of $11.8B in Q2 2024.",
            "Book value per share of $60.25 and tangible book value per share of $55.10.",
        ]
    }

    #[test]
    fn test_end_to_end_processing() {
        let records = reconcile_sources(
            "2024Q3_report.pdf",
            &report_sentences(),
            "3Q24_summary.xlsx",
            &summary_grid(),
            DEFAULT_TOLERANCE,
        );

        assert_eq!(records.len(), 5);
        for record in &records {
            assert_eq!(
                record.match_status,
                MatchStatus::Match,
                "{} did not match: {:?}",
                record.metric,
                record
            );
        }
        let metrics: Vec<Metric> = records.iter().map(|r| r.metric).collect();
        assert_eq!(metrics, Metric::ALL.to_vec());
        assert_eq!(records[3].pdf_display.as_deref(), Some("3217M"));
        assert_eq!(records[3].scale, Some(ScaleAdjustment::DividedByThousand));
    }

    #[test]
    fn test_unresolvable_filename_yields_one_sided_records() {
        let reconciler = MetricReconciler::standard();
        let records = reconciler.run(
            "earnings_report.pdf",
            &report_sentences(),
            "3Q24_summary.xlsx",
            &summary_grid(),
        );
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.pdf_display.is_none()));
        assert!(records.iter().all(|r| r.match_status == MatchStatus::NoMatch));
    }

    #[test]
    fn test_missing_column_gives_empty_table_side() {
        let reconciler = MetricReconciler::standard();
        let tabular = reconciler.tabular_metrics("4Q24_summary.xlsx", &summary_grid());
        assert!(tabular.is_empty());
    }

    #[test]
    fn test_canonical_values_use_target_quarter() {
        let reconciler = MetricReconciler::standard();
        let values = reconciler.canonical_values(&report_sentences(), Quarter::Q3);
        let revenues = values
            .iter()
            .find(|v| v.metric == Metric::Revenues)
            .unwrap();
        assert_eq!(revenues.numeric_value, 12.3);
        assert_eq!(revenues.occurrences, 2);
        assert_eq!(revenues.quarter_tag, Some(Quarter::Q3));
    }
}
