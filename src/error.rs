//! Worker error taxonomy
//!
//! Only `StorageUnavailable` and `Validation` surface as request failures;
//! the rest degrade gracefully and are reported via logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// No persistence backing configured; save/index/search fail fast.
    #[error("storage unavailable: no database configured")]
    StorageUnavailable,

    /// Malformed request rejected before computation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Underlying persistence failure on an otherwise valid request.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Recurrence rule rejected by the evaluator. Logged; the schedule
    /// expands to no extra occurrences.
    #[error("recurrence rule parse failed: {0}")]
    RecurrenceParse(String),

    /// Similarity-index creation or insertion failed. Logged; the raw
    /// vector remains durable and searchable via the fallback path.
    #[error("index write failed: {0}")]
    IndexWrite(String),

    /// External optimizer not configured, timed out, or exited with error.
    #[error("optimizer unavailable: {0}")]
    OptimizerUnavailable(String),
}

impl WorkerError {
    /// Wire error code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::StorageUnavailable => "STORAGE_UNAVAILABLE",
            WorkerError::Validation(_) => "VALIDATION_ERROR",
            WorkerError::Storage(_) => "STORAGE_ERROR",
            WorkerError::RecurrenceParse(_) => "RECURRENCE_PARSE_ERROR",
            WorkerError::IndexWrite(_) => "INDEX_WRITE_FAILURE",
            WorkerError::OptimizerUnavailable(_) => "OPTIMIZER_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(WorkerError::StorageUnavailable.code(), "STORAGE_UNAVAILABLE");
        assert_eq!(
            WorkerError::Validation("empty vector".into()).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            WorkerError::OptimizerUnavailable("not configured".into()).code(),
            "OPTIMIZER_UNAVAILABLE"
        );
    }

    #[test]
    fn test_display_includes_reason() {
        let err = WorkerError::RecurrenceParse("bad FREQ".into());
        assert!(err.to_string().contains("bad FREQ"));
    }
}
