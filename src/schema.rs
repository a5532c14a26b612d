use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::format_number;

/// The fixed metric vocabulary. Declaration order is the reporting priority, so
/// `Ord` and `BTreeMap<Metric, _>` iterate in that order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Metric {
    #[serde(rename = "CET1 Capital Ratio")]
    #[schemars(description = "Common Equity Tier 1 capital ratio, reported as a percentage")]
    Cet1CapitalRatio,

    #[serde(rename = "Tangible book value per share")]
    #[schemars(description = "Tangible book value per common share, in dollars")]
    TangibleBookValuePerShare,

    #[serde(rename = "Book value per share")]
    #[schemars(description = "Book value per common share, in dollars")]
    BookValuePerShare,

    #[serde(rename = "Net income")]
    #[schemars(description = "Net income for the period, usually in millions or billions")]
    NetIncome,

    #[serde(rename = "Revenues")]
    #[schemars(description = "Total revenues for the period, usually in millions or billions")]
    Revenues,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Cet1CapitalRatio,
        Metric::TangibleBookValuePerShare,
        Metric::BookValuePerShare,
        Metric::NetIncome,
        Metric::Revenues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cet1CapitalRatio => "CET1 Capital Ratio",
            Metric::TangibleBookValuePerShare => "Tangible book value per share",
            Metric::BookValuePerShare => "Book value per share",
            Metric::NetIncome => "Net income",
            Metric::Revenues => "Revenues",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        let wanted = name.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn from_digit(digit: char) -> Option<Quarter> {
        match digit {
            '1' => Some(Quarter::Q1),
            '2' => Some(Quarter::Q2),
            '3' => Some(Quarter::Q3),
            '4' => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn standardize(mention: &str) -> Option<Quarter> {
        let lower = mention.to_lowercase();
        for (quarter, digit, word) in [
            (Quarter::Q1, '1', "first"),
            (Quarter::Q2, '2', "second"),
            (Quarter::Q3, '3', "third"),
            (Quarter::Q4, '4', "fourth"),
        ] {
            if lower.contains(digit) || lower.contains(word) {
                return Some(quarter);
            }
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportingPeriod {
    pub quarter: Quarter,
    /// Four-digit year, kept as text because it is compared against sheet cells verbatim.
    pub year: String,
}

impl ReportingPeriod {
    pub fn new(quarter: Quarter, year: impl Into<String>) -> Self {
        Self {
            quarter,
            year: year.into(),
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quarter, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    None,
    Percent,
    Dollar,
    /// Value is stored in billions; the source literal carried an `M` suffix.
    Million,
    Billion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Percentage,
    Dollar,
    MillionsBillions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub metric: Metric,
    pub raw_value: String,
    pub numeric_value: f64,
    pub unit: Unit,
    pub quarter_tag: Option<Quarter>,
    pub source_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalMetricValue {
    pub metric: Metric,
    pub numeric_value: f64,
    pub unit: Unit,
    pub quarter_tag: Option<Quarter>,
    pub occurrences: usize,
}

impl CanonicalMetricValue {
    pub fn to_narrative_value(&self) -> NarrativeValue {
        NarrativeValue {
            value: self.numeric_value,
            unit: self.unit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrativeValue {
    pub value: f64,
    pub unit: Unit,
}

impl NarrativeValue {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn display(&self) -> String {
        match self.unit {
            Unit::None => format_number(self.value),
            Unit::Percent => format!("{}%", format_number(self.value)),
            Unit::Dollar => format!("${}", format_number(self.value)),
            Unit::Million => format!("{}M", format_number(self.value * 1000.0)),
            Unit::Billion => format!("{}B", format_number(self.value)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLocation {
    pub quarter_row_index: usize,
    pub year_row_index: usize,
    pub target_column_index: usize,
}

impl HeaderLocation {
    pub fn first_data_row(&self) -> usize {
        self.year_row_index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetricValue {
    pub metric: Metric,
    pub row_index: usize,
    pub raw_cell_value: String,
    /// Similarity (0-100) between the metric name and the row label.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MatchStatus {
    #[serde(rename = "Match")]
    Match,
    #[serde(rename = "No Match")]
    NoMatch,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Match => f.write_str("Match"),
            MatchStatus::NoMatch => f.write_str("No Match"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScaleAdjustment {
    #[schemars(description = "Values agreed as given (percentages after fraction conversion)")]
    Unscaled,
    #[schemars(description = "Tabular value was multiplied by 1000")]
    TimesThousand,
    #[schemars(description = "Tabular value was divided by 1000")]
    DividedByThousand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRecord {
    pub metric: Metric,
    pub pdf_display: Option<String>,
    pub excel_display: Option<String>,
    pub match_status: MatchStatus,
    pub scale: Option<ScaleAdjustment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_priority_order() {
        let mut shuffled = vec![
            Metric::Revenues,
            Metric::BookValuePerShare,
            Metric::Cet1CapitalRatio,
            Metric::NetIncome,
            Metric::TangibleBookValuePerShare,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Metric::ALL.to_vec());
    }

    #[test]
    fn test_metric_serializes_as_display_name() {
        let json = serde_json::to_string(&Metric::TangibleBookValuePerShare).unwrap();
        assert_eq!(json, "\"Tangible book value per share\"");
        assert_eq!(Metric::from_name("net income"), Some(Metric::NetIncome));
        assert_eq!(Metric::from_name("Operating income"), None);
    }

    #[test]
    fn test_quarter_standardize() {
        assert_eq!(Quarter::standardize("Q3"), Some(Quarter::Q3));
        assert_eq!(Quarter::standardize("4q"), Some(Quarter::Q4));
        assert_eq!(Quarter::standardize("2nd quarter"), Some(Quarter::Q2));
        assert_eq!(Quarter::standardize("first quarter"), Some(Quarter::Q1));
        assert_eq!(Quarter::standardize("quarter"), None);
    }

    #[test]
    fn test_narrative_display() {
        assert_eq!(NarrativeValue::new(13.6, Unit::Percent).display(), "13.6%");
        assert_eq!(NarrativeValue::new(55.1, Unit::Dollar).display(), "$55.1");
        assert_eq!(NarrativeValue::new(3.2, Unit::Billion).display(), "3.2B");
        assert_eq!(NarrativeValue::new(0.8, Unit::Million).display(), "800M");
        assert_eq!(NarrativeValue::new(3200.0, Unit::None).display(), "3200");
    }

    #[test]
    fn test_grid_short_rows_read_empty() {
        let grid = Grid::from_rows(vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(grid.cell(1, 1), "");
        assert_eq!(grid.cell(5, 0), "");
        assert_eq!(grid.column_count(), 2);
    }
}
