use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

/// One metric value as reported by the model, verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LlmMetricValue {
    #[schemars(description = "Exact metric name from the requested list")]
    pub metric: String,
    #[schemars(
        description = "Value with its unit as written, e.g. \"13.6%\", \"$87.53\", \"3.2 billion\". Use \"not found\" when absent."
    )]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LlmMetricAnswer {
    pub metrics: Vec<LlmMetricValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LlmPeriodAnswer {
    #[schemars(description = "Four-digit fiscal year the material reports on, or \"not found\"")]
    pub year: String,
    #[schemars(description = "Quarter the material reports on, as Q1 to Q4, or \"not found\"")]
    pub quarter: String,
}
