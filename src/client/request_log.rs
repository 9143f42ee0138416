//! Request tracing for outbound backend calls

use std::time::Duration;

use reqwest::StatusCode;

/// Log the start of an outbound request
pub fn request_started(method: &str, path: &str) {
    tracing::debug!(method = %method, path = %path, "Request started");
}

/// Log a response, picking the level from its status
pub fn request_completed(method: &str, path: &str, status: StatusCode, duration: Duration) {
    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }
}

/// Log a request that never got a response
pub fn request_failed(method: &str, path: &str, error: &reqwest::Error, duration: Duration) {
    tracing::error!(
        method = %method,
        path = %path,
        error = %error,
        timeout = error.is_timeout(),
        duration_ms = %duration.as_millis(),
        "Request failed before a response arrived"
    );
}
