//! Error types for the export interface.

use std::path::PathBuf;

use flightdeck_functions::FunctionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("Invalid interface configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile: {0}")]
    Profile(String),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Transport has no remote endpoint yet")]
    NotReady,

    #[error("Alert message is not valid: {0}")]
    AlertDecode(String),

    #[error("Interface service has stopped")]
    ServiceStopped,
}

impl InterfaceError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

pub type InterfaceResult<T> = Result<T, InterfaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_errors_pass_through() {
        let err: InterfaceError = FunctionError::UnknownFunction("Fuel.Pump".to_string()).into();
        assert_eq!(err.to_string(), "Unknown function 'Fuel.Pump'");
    }

    #[test]
    fn test_configuration_message() {
        let err = InterfaceError::invalid_configuration("retry_interval_ms must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid interface configuration: retry_interval_ms must be positive"
        );
    }
}
