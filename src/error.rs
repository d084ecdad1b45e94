//! Error types for dataset loading, aggregation and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Failure to turn a file into a usable dataset.
///
/// Always fatal at startup: the dashboard never renders without data.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid header in {path}: {reason}")]
    Header { path: PathBuf, reason: String },

    #[error("row {row} of {path} has {found} fields, expected {expected}")]
    RaggedRow {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path} contains no data rows")]
    Empty { path: PathBuf },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("outcome column '{column}' in {path} is not binary (row {row}: {value:?})")]
    NonBinaryOutcome {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("cannot band column '{column}': {reason}")]
    InvalidBand { column: String, reason: String },
}

/// A requested column cannot be used for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFeatureError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is not a binary outcome")]
    NotBinary(String),
}

impl InvalidFeatureError {
    /// Name of the offending column.
    pub fn column(&self) -> &str {
        match self {
            InvalidFeatureError::UnknownColumn(c) | InvalidFeatureError::NotBinary(c) => c,
        }
    }
}

/// A chart could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to draw chart: {0}")]
pub struct RenderError(pub String);

/// Failure of one explorer input cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    InvalidFeature(#[from] InvalidFeatureError),

    #[error(transparent)]
    DataLoad(#[from] DataLoadError),
}

/// Errors surfaced by the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid feature: {0}")]
    InvalidFeature(#[from] InvalidFeatureError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Dataset unavailable: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InvalidFeature(ref e) = self {
            warn!("Rejected request for column '{}'", e.column());
        }

        let (status, code) = match &self {
            ApiError::InvalidFeature(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FEATURE"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::DataLoad(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATA_LOAD_ERROR"),
            ApiError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_feature_column() {
        let err = InvalidFeatureError::UnknownColumn("Tenure".to_string());
        assert_eq!(err.column(), "Tenure");
        assert_eq!(err.to_string(), "unknown column 'Tenure'");
    }

    #[test]
    fn test_api_error_status() {
        let resp = ApiError::from(InvalidFeatureError::NotBinary("Age".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError::BadRequest("missing a".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::from(RenderError("backend closed".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
