use serde::Serialize;
use std::time::Duration;

/// Outcome of one solve, as returned to API callers.
///
/// Exactly one of `solution` / `error` is set, keyed by `success`, and
/// `processing_time` (seconds) is always present. The constructors are the
/// only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    processing_time: f64,
}

impl SolutionEnvelope {
    pub fn solved(solution: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            solution: Some(solution.into()),
            error: None,
            processing_time: elapsed.as_secs_f64(),
        }
    }

    pub fn failed(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            solution: None,
            error: Some(error.into()),
            processing_time: elapsed.as_secs_f64(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn solution(&self) -> Option<&str> {
        self.solution.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Elapsed wall-clock seconds; never negative.
    pub fn processing_time(&self) -> f64 {
        self.processing_time
    }
}
