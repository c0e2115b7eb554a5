use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Batch-level failures. Any of these aborts an import before (or instead
/// of) producing a `BatchResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum AppError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Unknown attribute '{attribute}' for type '{target_type}' in representation '{representation}'")]
    UnknownAttribute {
        representation: String,
        target_type: String,
        attribute: String,
    },

    #[error("Cyclic dependency: {0}")]
    CyclicDependency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures scoped to one representation of one row. Recorded in the row
/// outcome, never propagated out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FieldError {
    #[error("Missing value for required attribute '{attribute}'")]
    MissingRequiredAttribute { attribute: String },

    #[error("Cannot parse '{value}' for attribute '{attribute}' with date pattern '{pattern}'")]
    DateParse {
        attribute: String,
        value: String,
        pattern: String,
    },

    #[error("Cannot coerce '{value}' for attribute '{attribute}' to {expected}")]
    TypeCoercion {
        attribute: String,
        value: String,
        expected: String,
    },

    #[error("Representation '{representation}' was not built for this row")]
    MissingDependency { representation: String },
}

/// One failed representation within a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentationFailure {
    pub representation_id: String,
    pub error: FieldError,
}

/// Aggregated failure of a row: every representation that failed, in
/// evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowError {
    pub failures: Vec<RepresentationFailure>,
}

impl RowError {
    pub fn push(&mut self, representation_id: &str, error: FieldError) {
        self.failures.push(RepresentationFailure {
            representation_id: representation_id.to_string(),
            error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, representation_id: &str) -> bool {
        self.failures
            .iter()
            .any(|f| f.representation_id == representation_id)
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .failures
            .iter()
            .map(|failure| format!("[{}] {}", failure.representation_id, failure.error))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for RowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_display_lists_every_failure() {
        let mut error = RowError::default();
        error.push(
            "person",
            FieldError::MissingRequiredAttribute {
                attribute: "name".to_string(),
            },
        );
        error.push(
            "knows",
            FieldError::MissingDependency {
                representation: "person".to_string(),
            },
        );

        let text = error.to_string();
        assert!(text.contains("[person] Missing value for required attribute 'name'"));
        assert!(text.contains("[knows] Representation 'person' was not built"));
        assert!(error.failed("knows"));
        assert!(!error.failed("other"));
    }

    #[test]
    fn test_app_error_serializes_with_kind_tag() {
        let err = AppError::InvalidMapping("no representation".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"kind":"InvalidMapping","detail":"no representation"}"#);
    }
}
