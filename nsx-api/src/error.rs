use crate::model::object::ObjectKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading and validating the layered configuration.
///
/// All of them are fatal: the installer stops before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file is missing or could not be parsed.
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// A required key is absent from both files (or left empty).
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// A key is present but its value is unusable.
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// Two items of the same kind share a display name.
    #[error("Duplicate {kind} display name '{name}'")]
    DuplicateDisplayName { kind: ObjectKind, name: String },

    #[error("Failed to render configuration: {0}")]
    Render(#[from] serde_json::Error),

    /// Writing a template or rendered file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Transient transport failures. These are retried by the client and never
/// reach the orchestrator directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("transport error: {0}")]
    Other(String),
}

/// The NSX Manager rejected a request or could not service it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-retryable HTTP status (4xx) with the server-provided payload.
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: NetworkError },

    /// A create failed after reaching the server. It is not sent again; the object
    /// may exist.
    #[error("{request} was not confirmed and is not repeated: {last}")]
    Unconfirmed { request: String, last: NetworkError },

    /// A name referenced by a spec does not exist on the manager.
    #[error("no {kind} named '{name}' on the NSX Manager")]
    UnresolvedReference { kind: ObjectKind, name: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The run was cancelled while the request was in flight.
    #[error("cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::RetriesExhausted {
                last: NetworkError::ServerError { status, .. },
                ..
            }
            | ApiError::Unconfirmed {
                last: NetworkError::ServerError { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
