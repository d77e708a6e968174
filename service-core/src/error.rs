use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("{message}")]
    Coded {
        code: String,
        message: String,
        data: Map<String, Value>,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Error with an explicit client-facing code and an empty data object.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Coded {
            code: code.into(),
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn with_data(self, data: Map<String, Value>) -> Self {
        match self {
            AppError::Coded { code, message, .. } => AppError::Coded {
                code,
                message,
                data,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn code(&self) -> &str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Coded { code, .. } => code,
            AppError::InternalError(_) => "InternalError",
            AppError::ConfigError(_) => "ConfigError",
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let (message, data) = match self {
            AppError::Coded { message, data, .. } => (message.clone(), data.clone()),
            AppError::InternalError(err) => (err.to_string(), Map::new()),
            AppError::NotFound(err) | AppError::ConfigError(err) => (err.to_string(), Map::new()),
        };

        ErrorPayload {
            error_message: message,
            error_code: self.code().to_string(),
            error_data: data,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Body returned to clients for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub error_message: String,
    pub error_code: String,
    pub error_data: Map<String, Value>,
}

/// Attached to 500 responses so the reporting middleware can log and notify
/// without re-deriving anything from the body.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub payload: ErrorPayload,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_not_found() {
            tracing::debug!(error = %self, "Resource not found");
            return StatusCode::NOT_FOUND.into_response();
        }

        let payload = self.payload();
        let report = FailureReport {
            payload: payload.clone(),
            detail: format!("{:?}", self),
        };

        let mut res = (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        res.extensions_mut().insert(Arc::new(report));

        res
    }
}
