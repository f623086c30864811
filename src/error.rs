//! Error handling for survey processing operations.
//!
//! Structural problems (missing columns, unresolved station mappings, bad
//! configuration) are fatal and surface here. Per-measurement decode
//! problems and failing validation rules are not errors; they are reported
//! through `DecodeOutcome` and `ValidationReport` instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid measurement pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error in {stage}: {reason}")]
    Schema { stage: String, reason: String },

    #[error("Mapping error: {reason} (Field_IDs: {field_ids:?})")]
    Mapping { reason: String, field_ids: Vec<i64> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },
}

impl SurveyError {
    pub fn schema(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_column(stage: impl Into<String>, column: &str) -> Self {
        Self::schema(stage, format!("expected column '{}' is absent", column))
    }

    pub fn mapping(reason: impl Into<String>, field_ids: Vec<i64>) -> Self {
        Self::Mapping {
            reason: reason.into(),
            field_ids,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;
