//! Error types for deckctl

use flightdeck_interface::InterfaceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::ProfileNotFound(_) => 3,
            CliError::ValidationError(_) | CliError::JsonError(_) => 4,
            CliError::NetworkError(_) => 5,
        }
    }
}

impl From<InterfaceError> for CliError {
    fn from(error: InterfaceError) -> Self {
        match error {
            InterfaceError::Io { .. } => CliError::ProfileNotFound(error.to_string()),
            InterfaceError::Transport(_)
            | InterfaceError::NotReady
            | InterfaceError::ServiceStopped => CliError::NetworkError(error.to_string()),
            InterfaceError::InvalidConfiguration(_)
            | InterfaceError::Profile(_)
            | InterfaceError::Function(_)
            | InterfaceError::AlertDecode(_) => CliError::ValidationError(error.to_string()),
        }
    }
}
