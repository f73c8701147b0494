//! Error types for the metric-anomaly library.

use thiserror::Error;

/// Result type alias for anomaly-detection operations.
pub type Result<T> = std::result::Result<T, AnomalyError>;

/// Errors that can occur while transforming data or detecting anomalies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnomalyError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Column sets of two tables are incompatible.
    #[error("schema mismatch: expected columns [{expected}], got [{got}]")]
    SchemaMismatch { expected: String, got: String },

    /// A named dimension or component column does not exist.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g. numerical issues, no fittable model).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Anomaly export failed.
    #[error("export error: {0}")]
    ExportError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = AnomalyError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = AnomalyError::InsufficientData { needed: 24, got: 7 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 24, got 7"
        );

        let err = AnomalyError::SchemaMismatch {
            expected: "state, quote_count".to_string(),
            got: "state".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch: expected columns [state, quote_count], got [state]"
        );

        let err = AnomalyError::ColumnNotFound("region".to_string());
        assert_eq!(err.to_string(), "column not found: region");

        let err = AnomalyError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = AnomalyError::EmptyData;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
