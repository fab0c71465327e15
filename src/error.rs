//! Error types for the URL shortener
//!
//! Validation failures are user-correctable and carry the form field they
//! belong to. Storage failures wrap the redb error family. `AppError` is the
//! HTTP-facing error that handlers return; it maps every variant to a status
//! code and a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A user-correctable problem with one submitted field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty, unparsable, relative, or non-web URL; carries the reason
    #[error("{0}")]
    InvalidUrl(&'static str),

    #[error("Validity must be a positive number")]
    InvalidValidity,

    #[error("Shortcode must be alphanumeric")]
    InvalidShortcodeFormat,

    #[error("Shortcode must be between 3 and 20 characters")]
    InvalidShortcodeLength,

    #[error("This shortcode is already taken")]
    ShortcodeTaken,
}

impl ValidationError {
    /// Name of the form field that failed
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "url",
            Self::InvalidValidity => "validity",
            Self::InvalidShortcodeFormat | Self::InvalidShortcodeLength | Self::ShortcodeTaken => {
                "shortcode"
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidValidity => "invalid_validity",
            Self::InvalidShortcodeFormat => "invalid_shortcode_format",
            Self::InvalidShortcodeLength => "invalid_shortcode_length",
            Self::ShortcodeTaken => "shortcode_taken",
        }
    }
}

/// Every draw collided with an existing shortcode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to generate unique shortcode after {attempts} attempts")]
pub struct GenerationExhausted {
    pub attempts: usize,
}

/// Failures of the persistence medium
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage quota exceeded for '{key}': {size} bytes (limit {limit})")]
    QuotaExceeded {
        key: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("Shortcode '{0}' already exists")]
    ShortcodeConflict(String),
}

/// Failure to shorten a single URL
#[derive(Error, Debug)]
pub enum ShortenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationExhausted),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ShortenError {
    fn from(err: StoreError) -> Self {
        match err {
            // lost the race against a concurrent insert of the same code
            StoreError::ShortcodeConflict(_) => Self::Validation(ValidationError::ShortcodeTaken),
            other => Self::Store(other),
        }
    }
}

/// Per-field validation failures of one batch entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryErrors {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcode: Option<String>,
}

impl EntryErrors {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Files the error under its field, keeping the first one per field
    pub fn push(&mut self, err: &ValidationError) {
        let slot = match err.field() {
            "url" => &mut self.url,
            "validity" => &mut self.validity,
            _ => &mut self.shortcode,
        };
        if slot.is_none() {
            *slot = Some(err.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.validity.is_none() && self.shortcode.is_none()
    }
}

/// Failure of a multi-URL submission
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Between 1 and {max} URLs may be submitted at once, got {got}")]
    Size { got: usize, max: usize },

    #[error("Please fix the errors before submitting")]
    Invalid(Vec<EntryErrors>),

    #[error("Failed to shorten entry {index}: {source}")]
    Failed {
        index: usize,
        #[source]
        source: ShortenError,
    },
}

/// Invalid environment configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Application error type returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Generation(#[from] GenerationExhausted),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("The requested URL was not found")]
    NotFound,
}

impl From<ShortenError> for AppError {
    fn from(err: ShortenError) -> Self {
        match err {
            ShortenError::Validation(e) => Self::Validation(e),
            ShortenError::Generation(e) => Self::Generation(e),
            ShortenError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": e.to_string(), "code": e.code(), "field": e.field() }),
            ),
            AppError::Batch(BatchError::Invalid(entries)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "code": "invalid_batch", "entries": entries }),
            ),
            AppError::Batch(BatchError::Size { .. }) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "code": "batch_size" }),
            ),
            AppError::Batch(BatchError::Failed { index, source }) => {
                tracing::error!(index, "Batch entry failed: {}", source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An error occurred. Please try again.", "code": "internal", "index": index }),
                )
            }
            AppError::Generation(e) => {
                tracing::error!("Shortcode generation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An error occurred. Please try again.", "code": "generation_exhausted" }),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An error occurred. Please try again.", "code": "internal" }),
                )
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string(), "code": "not_found" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handler results
pub type Result<T> = std::result::Result<T, AppError>;
