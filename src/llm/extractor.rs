use log::{info, warn};
use std::collections::BTreeMap;

use crate::catalog::MetricCatalog;
use crate::error::{ReconcileError, Result};
use crate::llm::prompts::{
    NARRATIVE_INSTRUCTIONS, PERIOD_INSTRUCTIONS, SYSTEM_PROMPT_METRICS, SYSTEM_PROMPT_PERIOD,
    TABULAR_INSTRUCTIONS,
};
use crate::llm::{client::GeminiClient, types::*};
use crate::schema::{Grid, Metric, Quarter, ReportingPeriod};

/// Upper bound on document text sent in one request.
const MAX_CONTEXT_CHARS: usize = 200_000;
const PERIOD_CHUNK_CHARS: usize = 8_000;
const MAX_PERIOD_CHUNKS: usize = 5;

/// Asks a hosted model for the raw metric strings. Parsing into numbers is left to
/// [`crate::comparator::prepare_parsed_data`], same as for hand-entered values.
pub struct LlmMetricExtractor {
    client: GeminiClient,
    model: String,
}

impl LlmMetricExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn extract_narrative(
        &self,
        text: &str,
        period: Option<&ReportingPeriod>,
        catalog: &MetricCatalog,
    ) -> Result<BTreeMap<Metric, String>> {
        let context: String = text.chars().take(MAX_CONTEXT_CHARS).collect();
        let prompt = build_prompt(NARRATIVE_INSTRUCTIONS, &context, period, catalog)?;
        self.ask(prompt, catalog).await
    }

    pub async fn extract_tabular(
        &self,
        grid: &Grid,
        period: Option<&ReportingPeriod>,
        catalog: &MetricCatalog,
    ) -> Result<BTreeMap<Metric, String>> {
        let prompt = build_prompt(TABULAR_INSTRUCTIONS, &render_grid(grid), period, catalog)?;
        self.ask(prompt, catalog).await
    }

    /// Asks for the reporting period one text chunk at a time, front to back. The first
    /// chunk with a usable answer decides.
    pub async fn extract_period(&self, text: &str) -> Result<Option<ReportingPeriod>> {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(LlmPeriodAnswer))?;

        for (idx, chunk) in text_chunks(text, PERIOD_CHUNK_CHARS)
            .into_iter()
            .take(MAX_PERIOD_CHUNKS)
            .enumerate()
        {
            let prompt = format!(
                "{}\n\nJSON schema:\n{}\n\nMaterial:\n{}",
                PERIOD_INSTRUCTIONS, schema, chunk
            );
            let raw_json = self
                .client
                .generate_content(
                    &self.model,
                    SYSTEM_PROMPT_PERIOD,
                    vec![Content::user(prompt)],
                    None,
                )
                .await?;

            let answer: LlmPeriodAnswer = match serde_json::from_str(&clean_json_output(&raw_json)) {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Period answer for chunk {} is not valid JSON: {}", idx + 1, e);
                    continue;
                }
            };
            if let Some(period) = period_from_answer(&answer) {
                info!("Model reported {} from text chunk {}", period, idx + 1);
                return Ok(Some(period));
            }
        }

        warn!("Model found no reporting period in the text");
        Ok(None)
    }

    async fn ask(&self, prompt: String, catalog: &MetricCatalog) -> Result<BTreeMap<Metric, String>> {
        let raw_json = self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_METRICS,
                vec![Content::user(prompt)],
                None,
            )
            .await?;

        let answer: LlmMetricAnswer = serde_json::from_str(&clean_json_output(&raw_json))
            .map_err(|e| {
                ReconcileError::ExtractionFailed(format!("Model answer is not valid JSON: {}", e))
            })?;

        let values = collect_answer(answer, catalog);
        info!("Model reported {} metric value(s)", values.len());
        Ok(values)
    }
}

fn build_prompt(
    instructions: &str,
    context: &str,
    period: Option<&ReportingPeriod>,
    catalog: &MetricCatalog,
) -> Result<String> {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(LlmMetricAnswer))?;
    let metric_list = catalog
        .metrics()
        .map(|m| format!("- {}", m.name()))
        .collect::<Vec<_>>()
        .join("\n");
    let period_line = match period {
        Some(p) => format!("Reporting period: {}", p),
        None => "Reporting period: the most recent quarter in the material".to_string(),
    };

    Ok(format!(
        "{}\n{}\n\nMetrics:\n{}\n\nJSON schema:\n{}\n\nMaterial:\n{}",
        instructions, period_line, metric_list, schema, context
    ))
}

/// Keeps catalog metrics with a usable value; the first answer per metric wins.
fn collect_answer(answer: LlmMetricAnswer, catalog: &MetricCatalog) -> BTreeMap<Metric, String> {
    let mut values = BTreeMap::new();
    for item in answer.metrics {
        let Some(metric) = Metric::from_name(&item.metric) else {
            warn!("Model returned unknown metric '{}'", item.metric);
            continue;
        };
        if catalog.get(metric).is_none() {
            continue;
        }
        let value = item.value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("not found") {
            continue;
        }
        values.entry(metric).or_insert_with(|| value.to_string());
    }
    values
}

fn period_from_answer(answer: &LlmPeriodAnswer) -> Option<ReportingPeriod> {
    let year = answer.year.trim();
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let quarter_text = answer.quarter.trim();
    let digits: Vec<char> = quarter_text.chars().filter(char::is_ascii_digit).collect();
    let quarter = match digits.as_slice() {
        [digit] => Quarter::from_digit(*digit)?,
        [] => Quarter::standardize(quarter_text)?,
        _ => return None,
    };
    Some(ReportingPeriod::new(quarter, year))
}

fn text_chunks(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect::<String>())
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

fn render_grid(grid: &Grid) -> String {
    grid.rows()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_json_output(raw: &str) -> String {
    if let Some(start) = raw.find('{') {
        if let Some(end) = raw.rfind('}') {
            return raw[start..=end].to_string();
        }
    }
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_answer_filters_noise() {
        let answer: LlmMetricAnswer = serde_json::from_str(
            r#"{"metrics": [
                {"metric": "CET1 Capital Ratio", "value": "13.6%"},
                {"metric": "net income", "value": "$3.2 billion"},
                {"metric": "Revenues", "value": "Not Found"},
                {"metric": "Operating margin", "value": "31%"},
                {"metric": "Net income", "value": "$9.9 billion"}
            ]}"#,
        )
        .unwrap();

        let values = collect_answer(answer, MetricCatalog::standard());
        assert_eq!(values.len(), 2);
        assert_eq!(values[&Metric::Cet1CapitalRatio], "13.6%");
        assert_eq!(values[&Metric::NetIncome], "$3.2 billion");
    }

    #[test]
    fn test_clean_json_output_strips_fences() {
        let raw = "```json\n{\"metrics\": []}\n```";
        assert_eq!(clean_json_output(raw), "{\"metrics\": []}");
    }

    fn period_answer(year: &str, quarter: &str) -> LlmPeriodAnswer {
        LlmPeriodAnswer {
            year: year.to_string(),
            quarter: quarter.to_string(),
        }
    }

    #[test]
    fn test_period_from_answer() {
        let q3 = Some(ReportingPeriod::new(Quarter::Q3, "2024"));
        assert_eq!(period_from_answer(&period_answer("2024", "Q3")), q3);
        assert_eq!(period_from_answer(&period_answer(" 2024 ", "3Q")), q3);
        assert_eq!(period_from_answer(&period_answer("2024", "third quarter")), q3);

        assert_eq!(period_from_answer(&period_answer("not found", "not found")), None);
        assert_eq!(period_from_answer(&period_answer("2024", "not found")), None);
        assert_eq!(period_from_answer(&period_answer("24", "Q3")), None);
        assert_eq!(period_from_answer(&period_answer("2024", "Q3 2024")), None);
        assert_eq!(period_from_answer(&period_answer("2024", "Q5")), None);
    }

    #[test]
    fn test_text_chunks_skip_blank_tail() {
        let chunks = text_chunks("abcdef   ", 6);
        assert_eq!(chunks, vec!["abcdef".to_string()]);
        assert_eq!(text_chunks("héllo wörld", 4).len(), 3);
        assert!(text_chunks("", 4).is_empty());
    }

    #[test]
    fn test_prompt_lists_metrics_and_period() {
        let period = ReportingPeriod::new(crate::schema::Quarter::Q3, "2024");
        let prompt = build_prompt("Intro", "body", Some(&period), MetricCatalog::standard()).unwrap();
        assert!(prompt.contains("Reporting period: Q3 2024"));
        assert!(prompt.contains("- Tangible book value per share"));
        assert!(prompt.ends_with("body"));
    }
}
