//! Reporting-period inference from file names.
//!
//! Rules are tried in a fixed order and the first usable match wins. Tighter rules sit
//! ahead of looser ones; reordering them changes which period ambiguous names resolve to.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::schema::{Quarter, ReportingPeriod};

static FILENAME_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 2024pr-qtr3rslt, 2024Q3
        r"(?P<year>\d{4}).*?qt?r?[-_]?(?P<q>[1-4])",
        // FY2024Q3
        r"fy.*?(?P<year>\d{4}).*?qt?r?[-_]?(?P<q>[1-4])",
        // q3-2024
        r"qt?r?[-_]?(?P<q>[1-4]).*?(?P<year>\d{4})",
        // Quarter 3 2024
        r"(?:quarter|qtr|q)\s*(?P<q>[1-4]).*?(?P<year>\d{4})",
        r"(?P<year>\d{4}).*?q.*?(?P<q>[1-4])",
        r"q.*?(?P<q>[1-4]).*?(?P<year>\d{4})",
        // 3QTR24
        r"(?P<q>[1-4])qtr.*?(?P<year2>\d{2})",
        // 2024QTR3
        r"(?P<year>\d{4})qtr.*?(?P<q>[1-4])",
        // 3Q24
        r"(?P<q>[1-4])q(?P<year2>\d{2})",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect()
});

/// Period plus the 1-based index of the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub period: ReportingPeriod,
    pub rule: usize,
}

pub fn resolve_with_rule(filename: &str) -> Option<ResolvedPeriod> {
    for (idx, rule) in FILENAME_RULES.iter().enumerate() {
        let Some(caps) = rule.captures(filename) else {
            continue;
        };

        let quarter_digit = caps.name("q").and_then(|m| m.as_str().chars().next());
        let Some(quarter) = quarter_digit.and_then(Quarter::from_digit) else {
            debug!(
                "Filename rule {} matched '{}' with an invalid quarter, trying next rule",
                idx + 1,
                filename
            );
            continue;
        };

        let year = if let Some(short) = caps.name("year2") {
            format!("20{}", short.as_str())
        } else if let Some(full) = caps.name("year") {
            full.as_str().to_string()
        } else {
            continue;
        };

        info!(
            "Filename rule {} matched '{}': {} {}",
            idx + 1,
            filename,
            quarter,
            year
        );
        return Some(ResolvedPeriod {
            period: ReportingPeriod::new(quarter, year),
            rule: idx + 1,
        });
    }

    info!("No filename rule matched '{}'", filename);
    None
}

/// Resolves the reporting period encoded in `filename`.
pub fn resolve_period(filename: &str) -> Option<ReportingPeriod> {
    resolve_with_rule(filename).map(|r| r.period)
}

/// Resolves from the final path component only, so digits in directory names are ignored.
pub fn resolve_period_from_path(path: &Path) -> Option<ReportingPeriod> {
    let name = path.file_name()?.to_string_lossy();
    resolve_period(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(filename: &str) -> (ReportingPeriod, usize) {
        let r = resolve_with_rule(filename).unwrap();
        (r.period, r.rule)
    }

    #[test]
    fn test_year_then_quarter() {
        let (period, rule) = resolved("2024Q3_report.pdf");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q3, "2024"));
        assert_eq!(rule, 1);
    }

    #[test]
    fn test_quarter_digit_then_q_and_short_year() {
        let (period, rule) = resolved("3Q24_summary.xlsx");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q3, "2024"));
        assert_eq!(rule, 9);
    }

    #[test]
    fn test_fiscal_year_prefix() {
        let (period, _) = resolved("FY2024-Q3.pdf");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q3, "2024"));
    }

    #[test]
    fn test_spelled_out_quarter() {
        let (period, rule) = resolved("Quarter 2 results 2023");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q2, "2023"));
        assert_eq!(rule, 4);
    }

    #[test]
    fn test_quarter_before_year() {
        let (period, rule) = resolved("q1-2025_earnings");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q1, "2025"));
        assert_eq!(rule, 3);
    }

    #[test]
    fn test_qtr_spelled() {
        let (period, _) = resolved("2024pr-qtr3rslt");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q3, "2024"));
        let (period, rule) = resolved("3QTR24");
        assert_eq!(period, ReportingPeriod::new(Quarter::Q3, "2024"));
        assert_eq!(rule, 7);
    }

    #[test]
    fn test_no_period() {
        assert!(resolve_period("annual_report.pdf").is_none());
        assert!(resolve_period("summary.xlsx").is_none());
    }

    #[test]
    fn test_path_uses_file_name_only() {
        let path = Path::new("/data/2019q1/3Q24_summary.xlsx");
        assert_eq!(
            resolve_period_from_path(path),
            Some(ReportingPeriod::new(Quarter::Q3, "2024"))
        );
    }
}
