use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::comparator::DEFAULT_TOLERANCE;
use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approach {
    /// Regex extraction and sheet heuristics; no network access.
    #[default]
    NoLlm,
    /// Ask a hosted model for the values (requires the `gemini` feature).
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Relative tolerance, e.g. 0.05 for 5%.
    pub tolerance: f64,
    pub sheet_name: String,
    pub approach: Approach,
    pub gemini_model: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            sheet_name: "Summary".to_string(),
            approach: Approach::NoLlm,
            gemini_model: "gemini-2.0-flash".to_string(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ReconcileConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_tolerance(self.tolerance)?;
        if self.sheet_name.trim().is_empty() {
            return Err(ReconcileError::InvalidConfig(
                "sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || !(0.0..1.0).contains(&tolerance) {
        return Err(ReconcileError::InvalidTolerance(tolerance));
    }
    Ok(())
}
