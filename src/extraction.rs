use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::catalog::{MetricCatalog, MetricSpec};
use crate::schema::{MetricObservation, Quarter, Unit, ValueType};
use crate::utils::{normalize_sentence, parse_amount, preceded_by};

static QUARTER_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(q[1-4]|[1-4]q|(?:1st|2nd|3rd|4th|first|second|third|fourth) quarter)\s*(?:'?\d{2,4})?",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterTag {
    Absent,
    Tagged(Quarter),
    Unparseable,
}

pub fn find_quarter_tag(sentence: &str) -> QuarterTag {
    match QUARTER_MENTION.captures(sentence) {
        None => QuarterTag::Absent,
        Some(caps) => match Quarter::standardize(&caps[1]) {
            Some(q) => QuarterTag::Tagged(q),
            None => QuarterTag::Unparseable,
        },
    }
}

pub fn normalize_value(literal: &str, value_type: ValueType) -> Option<(f64, Unit)> {
    match value_type {
        ValueType::Percentage => {
            let value = literal.replace('%', "").trim().parse::<f64>().ok()?;
            Some((value, Unit::Percent))
        }
        ValueType::Dollar => parse_amount(literal).map(|v| (v, Unit::Dollar)),
        ValueType::MillionsBillions => {
            let trimmed = literal.trim();
            match trimmed.chars().last() {
                Some('m') | Some('M') => parse_amount(&trimmed[..trimmed.len() - 1])
                    .map(|v| (v / 1000.0, Unit::Million)),
                Some('b') | Some('B') => {
                    parse_amount(&trimmed[..trimmed.len() - 1]).map(|v| (v, Unit::Billion))
                }
                _ => parse_amount(trimmed).map(|v| (v, Unit::None)),
            }
        }
    }
}

pub struct TextMetricExtractor<'a> {
    catalog: &'a MetricCatalog,
}

impl<'a> TextMetricExtractor<'a> {
    pub fn new(catalog: &'a MetricCatalog) -> Self {
        Self { catalog }
    }

    /// Sentences are expected to be normalized already (see [`normalize_sentence`]).
    pub fn extract(&self, sentences: &[String]) -> Vec<MetricObservation> {
        let mut observations = Vec::new();
        for sentence in sentences {
            for spec in self.catalog.specs() {
                if let Some(obs) = self.observe(spec, sentence) {
                    observations.push(obs);
                }
            }
        }

        info!(
            "Extracted {} metric observations from {} sentences",
            observations.len(),
            sentences.len()
        );
        observations
    }

    pub fn extract_raw<S: AsRef<str>>(&self, sentences: &[S]) -> Vec<MetricObservation> {
        let normalized: Vec<String> = sentences
            .iter()
            .map(|s| normalize_sentence(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        self.extract(&normalized)
    }

    fn observe(&self, spec: &MetricSpec, sentence: &str) -> Option<MetricObservation> {
        let caps = first_admissible_match(spec, sentence)?;
        let raw_value = caps.get(1)?.as_str();

        let Some((numeric_value, unit)) = normalize_value(raw_value, spec.value_type) else {
            debug!(
                "Discarding {} value '{}': not numeric",
                spec.metric, raw_value
            );
            return None;
        };

        let quarter_tag = match find_quarter_tag(sentence) {
            QuarterTag::Absent => None,
            QuarterTag::Tagged(q) => Some(q),
            QuarterTag::Unparseable => {
                debug!(
                    "Discarding {} value '{}': unreadable quarter mention",
                    spec.metric, raw_value
                );
                return None;
            }
        };

        Some(MetricObservation {
            metric: spec.metric,
            raw_value: raw_value.to_string(),
            numeric_value,
            unit,
            quarter_tag,
            source_sentence: sentence.to_string(),
        })
    }
}

fn first_admissible_match<'s>(spec: &MetricSpec, sentence: &'s str) -> Option<Captures<'s>> {
    spec.pattern.captures_iter(sentence).find(|caps| {
        caps.get(0)
            .is_some_and(|m| !preceded_by_ignore_case(sentence, m.start(), spec.excluded_prefix))
    })
}

fn preceded_by_ignore_case(sentence: &str, position: usize, prefix: Option<&str>) -> bool {
    let before = sentence[..position].to_lowercase();
    let prefix = prefix.map(str::to_lowercase);
    preceded_by(&before, before.len(), prefix.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Metric;

    fn extract(sentences: &[&str]) -> Vec<MetricObservation> {
        TextMetricExtractor::new(MetricCatalog::standard()).extract_raw(sentences)
    }

    #[test]
    fn test_percentage_extraction() {
        let obs = extract(&["Our CET1 capital ratio of 13.6% in Q3 2024 remained strong."]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].metric, Metric::Cet1CapitalRatio);
        assert_eq!(obs[0].numeric_value, 13.6);
        assert_eq!(obs[0].unit, Unit::Percent);
        assert_eq!(obs[0].quarter_tag, Some(Quarter::Q3));
        assert_eq!(obs[0].raw_value, "13.6%");
    }

    #[test]
    fn test_dollar_with_thousands_separator() {
        let obs = extract(&["book value per share of $1,055.10 at period end"]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].metric, Metric::BookValuePerShare);
        assert_eq!(obs[0].numeric_value, 1055.1);
        assert_eq!(obs[0].unit, Unit::Dollar);
        assert_eq!(obs[0].quarter_tag, None);
    }

    #[test]
    fn test_tangible_book_value_is_not_counted_twice() {
        let obs = extract(&["tangible book value per share of $55.10 for the quarter"]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].metric, Metric::TangibleBookValuePerShare);
    }

    #[test]
    fn test_book_value_found_after_tangible_mention() {
        let obs = extract(&[
            "tangible book value per share $55.10 and book value per share $60.25",
        ]);
        let book: Vec<_> = obs
            .iter()
            .filter(|o| o.metric == Metric::BookValuePerShare)
            .collect();
        assert_eq!(book.len(), 1);
        assert_eq!(book[0].numeric_value, 60.25);
    }

    #[test]
    fn test_millions_expressed_in_billions() {
        let obs = extract(&["net income of $3,200m in the third quarter"]);
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].numeric_value, 3.2);
        assert_eq!(obs[0].unit, Unit::Million);
        assert_eq!(obs[0].quarter_tag, Some(Quarter::Q3));

        let obs = extract(&["revenues of $12.5b, 2q24"]);
        assert_eq!(obs[0].numeric_value, 12.5);
        assert_eq!(obs[0].unit, Unit::Billion);
        assert_eq!(obs[0].quarter_tag, Some(Quarter::Q2));
    }

    #[test]
    fn test_bare_amount_has_no_unit() {
        let obs = extract(&["revenues of $3,217"]);
        assert_eq!(obs[0].numeric_value, 3217.0);
        assert_eq!(obs[0].unit, Unit::None);
    }

    #[test]
    fn test_sentence_without_metric() {
        assert!(extract(&["the weather was pleasant in q3"]).is_empty());
    }

    #[test]
    fn test_normalize_value_rejects_garbage() {
        assert_eq!(normalize_value("abc%", ValueType::Percentage), None);
        assert_eq!(normalize_value("$", ValueType::Dollar), None);
        assert_eq!(normalize_value("m", ValueType::MillionsBillions), None);
    }

    #[test]
    fn test_quarter_tag_variants() {
        assert_eq!(find_quarter_tag("results for 4q'24"), QuarterTag::Tagged(Quarter::Q4));
        assert_eq!(
            find_quarter_tag("in the first quarter of 2024"),
            QuarterTag::Tagged(Quarter::Q1)
        );
        assert_eq!(find_quarter_tag("full year results"), QuarterTag::Absent);
    }
}
