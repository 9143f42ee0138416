//! Centralized error handling for the Trustigo dashboard
//!
//! This module provides the error taxonomy every page and workflow branches on:
//! local validation failures, transport failures (no response) and server
//! failures (the backend answered with an error status).

use thiserror::Error;

/// Error type returned by the API client and surfaced by the workflows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Server error ({status}): {}", detail.as_deref().unwrap_or("no detail provided"))]
    ServerError { status: u16, detail: Option<String> },

    #[error("Invalid response payload: {0}")]
    DecodeError(String),
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::TransportError(_) => "TRANSPORT_ERROR",
            ApiError::ServerError { .. } => "SERVER_ERROR",
            ApiError::DecodeError(_) => "DECODE_ERROR",
        }
    }

    /// The detail message the server attached to its error response, if any
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ApiError::ServerError { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// True when no response was received at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::TransportError(_))
    }

    /// Message suitable for showing to an operator
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ValidationError(msg) => msg.clone(),
            ApiError::TransportError(_) => {
                "Could not reach the Trustigo backend. Make sure the backend is running.".to_string()
            }
            ApiError::ServerError { status, detail } => match detail {
                Some(detail) => detail.clone(),
                None => format!("The backend rejected the request (HTTP {}).", status),
            },
            ApiError::DecodeError(_) => {
                "The backend returned data in an unexpected format.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::DecodeError(err.to_string())
        } else {
            ApiError::TransportError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::DecodeError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
