use thiserror::Error;

use crate::request::FieldError;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("malformed estimate document: {0}")]
    Malformed(String),

    #[error("invalid estimate shape at {path}: {reason}")]
    Shape { path: String, reason: String },

    #[error("unknown role '{label}' on task '{task}'")]
    UnknownRole { label: String, task: String },

    #[error("invalid rate input '{0}': expected a non-negative decimal number up to 1000000, or an empty string")]
    InvalidRateInput(String),

    #[error("an analysis is already in progress")]
    AnalysisInProgress,

    #[error("no estimate loaded")]
    NoEstimate,

    #[error("request validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, EstimateError>;
