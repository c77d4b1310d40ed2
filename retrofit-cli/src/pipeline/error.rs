use chrono::NaiveDate;
use thiserror::Error;

use crate::pipeline::weather::RegionCode;

/// Failure of a single scenario's pipeline step.
///
/// None of these are retryable: the same inputs reproduce the same error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown reference category `{0}`")]
    UnknownCategory(String),

    #[error("unknown label `{label}` in the reference category `{category}`")]
    UnknownLabel { category: String, label: String },

    #[error("no weather series for region {0}")]
    UnknownRegion(RegionCode),

    #[error("model inference failed: {0}")]
    ModelInference(String),

    /// All end-use shares were clipped to zero and no fallback was allowed.
    #[error("all end-use shares are zero on {date}")]
    DegenerateShare { date: NaiveDate },

    #[error("expected between 1 and {max} scenarios, got {actual}")]
    ScenarioCount { actual: usize, max: usize },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

impl PipelineError {
    pub fn model_inference(message: impl Into<String>) -> Self {
        Self::ModelInference(message.into())
    }

    pub fn invalid_scenario(message: impl Into<String>) -> Self {
        Self::InvalidScenario(message.into())
    }
}
