//! The metric vocabulary and the sentence patterns used to find each metric.
//!
//! A single [`MetricCatalog`] is built once and handed to every stage that needs to
//! know which metrics exist, in which order they are reported, and how to spot them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{Metric, ValueType};

const AMOUNT: &str = r"\d{1,3}(?:,\d{3})*(?:\.\d+)?";

#[derive(Debug, Clone)]
pub struct MetricSpec {
    pub metric: Metric,
    /// Capture group 1 holds the value literal.
    pub pattern: Regex,
    pub value_type: ValueType,
    /// Text that disqualifies a hit when it immediately precedes the metric name.
    pub excluded_prefix: Option<&'static str>,
}

impl MetricSpec {
    pub fn new(
        metric: Metric,
        pattern: &str,
        value_type: ValueType,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            metric,
            pattern: Regex::new(&format!("(?i){}", pattern))?,
            value_type,
            excluded_prefix: None,
        })
    }

    pub fn excluding_prefix(mut self, prefix: &'static str) -> Self {
        self.excluded_prefix = Some(prefix);
        self
    }

    pub fn label(&self) -> String {
        self.metric.name().to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct MetricCatalog {
    specs: Vec<MetricSpec>,
}

static STANDARD: Lazy<MetricCatalog> =
    Lazy::new(|| MetricCatalog::new(standard_specs().unwrap()));

fn standard_specs() -> Result<Vec<MetricSpec>, regex::Error> {
    Ok(vec![
        MetricSpec::new(
            Metric::Cet1CapitalRatio,
            r"\bcet1 capital ratio\b\s*(?:of\s*)?[:\-]?\s*(\d+\.?\d*%)",
            ValueType::Percentage,
        )?,
        MetricSpec::new(
            Metric::TangibleBookValuePerShare,
            &format!(
                r"\btangible book value per share\b\s*(?:of\s*)?[:\-]?\s*\$?\s*({})",
                AMOUNT
            ),
            ValueType::Dollar,
        )?,
        MetricSpec::new(
            Metric::BookValuePerShare,
            &format!(
                r"\bbook value per share\b\s*(?:of\s*)?[:\-]?\s*\$?\s*({})",
                AMOUNT
            ),
            ValueType::Dollar,
        )?
        .excluding_prefix("tangible "),
        MetricSpec::new(
            Metric::NetIncome,
            &format!(
                r"\bnet income\b\s*(?:of\s*)?[:\-]?\s*\$?\s*({}[MmBb]?)",
                AMOUNT
            ),
            ValueType::MillionsBillions,
        )?,
        MetricSpec::new(
            Metric::Revenues,
            &format!(
                r"\brevenues\b\s*(?:of\s*)?[:\-]?\s*\$?\s*({}[MmBb]?)",
                AMOUNT
            ),
            ValueType::MillionsBillions,
        )?,
    ])
}

impl MetricCatalog {
    pub fn new(mut specs: Vec<MetricSpec>) -> Self {
        specs.sort_by_key(|s| s.metric);
        Self { specs }
    }

    pub fn standard() -> &'static MetricCatalog {
        &STANDARD
    }

    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricSpec> {
        self.specs.iter().find(|s| s.metric == metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.specs.iter().map(|s| s.metric)
    }
}
