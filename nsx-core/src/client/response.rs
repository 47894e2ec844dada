//! Helpers turning `reqwest` outcomes into the installer's error taxonomy.

use super::retry::Failure;
use log::{debug, error};
use nsx::{ApiError, NetworkError};
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Maps a transport-level failure (no response received).
pub fn transport_failure(err: reqwest::Error) -> Failure {
    if err.is_builder() {
        return Failure::Fatal(ApiError::Client(err.to_string()));
    }
    let network = if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() {
        NetworkError::Connect(err.to_string())
    } else {
        NetworkError::Other(err.to_string())
    };
    Failure::Transient(network)
}

/// Whether a status is worth retrying.
pub fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT
}

/// Classifies a status code and body into success or failure.
pub fn classify(status: StatusCode, method: &str, path: &str, body: String) -> Result<Value, Failure> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body).map_err(|e| {
            Failure::Fatal(ApiError::InvalidResponse(format!(
                "{} {}: {}",
                method, path, e
            )))
        });
    }

    error!("{} {} -> {}: {}", method, path, status.as_u16(), body);
    if is_transient(status) {
        Err(Failure::Transient(NetworkError::ServerError {
            status: status.as_u16(),
            body,
        }))
    } else {
        Err(Failure::Fatal(ApiError::Status {
            status: status.as_u16(),
            method: method.to_string(),
            path: path.to_string(),
            body,
        }))
    }
}

/// Reads the body of a response and classifies it.
pub async fn handle_response(resp: Response, method: &str, path: &str) -> Result<Value, Failure> {
    let status = resp.status();
    debug!("{} {} -> {}", method, path, status.as_u16());
    let body = resp.text().await.map_err(transport_failure)?;
    classify(status, method, path, body)
}
