//! Reconciles narrative and tabular values for each metric.
//!
//! Percentages are compared as fractions. Other values are compared as given, then with
//! the tabular side scaled by 1000 and by 1/1000, because the sheet's implicit unit
//! (millions or billions) is unknown. The first attempt that lands inside the tolerance
//! decides the verdict.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{ComparisonRecord, MatchStatus, Metric, NarrativeValue, ScaleAdjustment, Unit};
use crate::utils::{format_number, parse_amount};

pub const DEFAULT_TOLERANCE: f64 = 0.05;

pub type NarrativeMetrics = BTreeMap<Metric, NarrativeValue>;
pub type TabularMetrics = BTreeMap<Metric, f64>;

static PERCENT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.?\d*)\s*%$").unwrap());
static DOLLAR_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\s*(\d[\d,]*\.?\d*)$").unwrap());
static SCALED_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?\s*(\d[\d,]*\.?\d*)\s*(billion|million|bn|b|mm|m)$").unwrap()
});
static BARE_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d[\d,]*\.?\d*)$").unwrap());

/// Relative closeness test. A zero reference only matches zero.
pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    if b == 0.0 {
        return a == 0.0;
    }
    let ratio = a / b;
    1.0 - tolerance <= ratio && ratio <= 1.0 + tolerance
}

pub fn reconcile_values(
    narrative: NarrativeValue,
    tabular: f64,
    tolerance: f64,
) -> Option<ScaleAdjustment> {
    if narrative.unit == Unit::Percent {
        let pdf_fraction = narrative.value / 100.0;
        // Sheets store ratios either as fractions or as whole percentages.
        let excel_fraction = if tabular > 1.0 { tabular / 100.0 } else { tabular };
        return within_tolerance(pdf_fraction, excel_fraction, tolerance)
            .then_some(ScaleAdjustment::Unscaled);
    }

    [
        (ScaleAdjustment::Unscaled, tabular),
        (ScaleAdjustment::TimesThousand, tabular * 1000.0),
        (ScaleAdjustment::DividedByThousand, tabular / 1000.0),
    ]
    .into_iter()
    .find(|(_, candidate)| within_tolerance(narrative.value, *candidate, tolerance))
    .map(|(scale, _)| scale)
}

pub fn compare_values(
    narrative: &NarrativeMetrics,
    tabular: &TabularMetrics,
    tolerance: f64,
) -> Vec<ComparisonRecord> {
    let metrics: BTreeSet<Metric> = narrative.keys().chain(tabular.keys()).copied().collect();

    let records: Vec<ComparisonRecord> = metrics
        .into_iter()
        .map(|metric| {
            let pdf = narrative.get(&metric);
            let excel = tabular.get(&metric);
            let scale = match (pdf, excel) {
                (Some(p), Some(e)) => reconcile_values(*p, *e, tolerance),
                _ => None,
            };
            debug!("{}: pdf={:?} excel={:?} scale={:?}", metric, pdf, excel, scale);

            ComparisonRecord {
                metric,
                pdf_display: pdf.map(NarrativeValue::display),
                excel_display: excel.map(|v| format_number(*v)),
                match_status: if scale.is_some() {
                    MatchStatus::Match
                } else {
                    MatchStatus::NoMatch
                },
                scale,
            }
        })
        .collect();

    let matched = records
        .iter()
        .filter(|r| r.match_status == MatchStatus::Match)
        .count();
    info!(
        "Compared {} metrics at {:.1}% tolerance: {} matched",
        records.len(),
        tolerance * 100.0,
        matched
    );
    records
}

/// Parses free-form narrative values such as `13.6%`, `$87.53`, `3.2 billion` or `99.70`.
/// Millions are stored in billions, as the sentence extractor does.
pub fn parse_narrative_metric(literal: &str) -> Option<NarrativeValue> {
    let text = literal.trim().to_lowercase();

    if let Some(caps) = PERCENT_LITERAL.captures(&text) {
        return caps[1].parse().ok().map(|v| NarrativeValue::new(v, Unit::Percent));
    }
    if let Some(caps) = DOLLAR_LITERAL.captures(&text) {
        return parse_amount(&caps[1]).map(|v| NarrativeValue::new(v, Unit::Dollar));
    }
    if let Some(caps) = SCALED_LITERAL.captures(&text) {
        let value = parse_amount(&caps[1])?;
        return Some(match &caps[2] {
            "billion" | "bn" | "b" => NarrativeValue::new(value, Unit::Billion),
            _ => NarrativeValue::new(value / 1000.0, Unit::Million),
        });
    }
    if let Some(caps) = BARE_LITERAL.captures(&text) {
        return parse_amount(&caps[1]).map(|v| NarrativeValue::new(v, Unit::None));
    }
    None
}

pub fn parse_tabular_metric(literal: &str) -> Option<f64> {
    parse_amount(literal)
}

pub fn prepare_parsed_data(
    narrative: &BTreeMap<Metric, String>,
    tabular: &BTreeMap<Metric, String>,
) -> (NarrativeMetrics, TabularMetrics) {
    let mut parsed_narrative = NarrativeMetrics::new();
    for (metric, raw) in narrative {
        match parse_narrative_metric(raw) {
            Some(value) => {
                parsed_narrative.insert(*metric, value);
            }
            None => warn!("Could not parse PDF metric '{}' with value '{}'", metric, raw),
        }
    }

    let mut parsed_tabular = TabularMetrics::new();
    for (metric, raw) in tabular {
        match parse_tabular_metric(raw) {
            Some(value) => {
                parsed_tabular.insert(*metric, value);
            }
            None => warn!("Could not parse Excel metric '{}' with value '{}'", metric, raw),
        }
    }

    (parsed_narrative, parsed_tabular)
}
