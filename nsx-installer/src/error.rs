use nsx::{ApiError, ConfigError};
use std::path::PathBuf;
use thiserror::Error;

/// Exit status when at least one item failed or was not attempted.
pub const EXIT_ITEM_FAILURE: u8 = 1;
/// Exit status for configuration problems. Nothing was sent to the manager.
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Errors that end the installer before or outside a run.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] ApiError),

    #[error("Cannot open log file {path}: {source}")]
    Logger {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => EXIT_CONFIG_ERROR,
            _ => EXIT_ITEM_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
