//! Error types for the REST API server

use crate::event_store::EventStoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong API key on a protected route
    Unauthorized,
    /// The server has no API key configured
    ServerMisconfigured,
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Invalid time window (bad format or since > until)
    InvalidTimeWindow(String),
    /// Event store failure
    StorageFailed(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Invalid or missing API key"),
            ApiError::ServerMisconfigured => {
                write!(f, "Server misconfigured: ANALYTICS_API_KEY not set")
            }
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidTimeWindow(msg) => write!(f, "Invalid time window: {}", msg),
            ApiError::StorageFailed(msg) => write!(f, "Storage failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Invalid or missing API key".to_string(),
            ),
            ApiError::ServerMisconfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ServerMisconfigured",
                "Server misconfigured: ANALYTICS_API_KEY not set".to_string(),
            ),
            ApiError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, "InvalidParameter", msg.clone())
            }
            ApiError::InvalidTimeWindow(msg) => {
                (StatusCode::BAD_REQUEST, "InvalidTimeWindow", msg.clone())
            }
            ApiError::StorageFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "StorageFailed",
                msg.clone(),
            ),
        };

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// Conversions from other error types

impl From<EventStoreError> for ApiError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::InvalidFilter(msg) => ApiError::InvalidTimeWindow(msg),
            EventStoreError::Storage(msg) => ApiError::StorageFailed(msg),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidParameter(format!("JSON error: {}", err))
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidTimeWindow(format!("Timestamp parse error: {}", err))
    }
}
