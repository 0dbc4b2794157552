//! Error types for building and addressing network functions.
//!
//! Runtime decode problems are never errors: malformed scalars and unknown
//! ids are logged and ignored. Errors here are construction-time defects and
//! lookups of things that do not exist.

use thiserror::Error;

use flightdeck_calibration::CalibrationError;

/// Errors raised while building functions or the registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    /// Two functions claim the same wire element.
    #[error("Wire element '{id}' is claimed by both '{first}' and '{second}'")]
    DuplicateElementId {
        /// The contested element id.
        id: String,
        /// Local key of the function registered first.
        first: String,
        /// Local key of the function that collided.
        second: String,
    },

    /// A single function lists the same element twice.
    #[error("Function '{function}' lists wire element '{id}' more than once")]
    RepeatedElementId {
        /// Local key of the function.
        function: String,
        /// The repeated element id.
        id: String,
    },

    /// A configuration record is not usable.
    #[error("Invalid configuration for '{function}': {reason}")]
    InvalidConfiguration {
        /// Local key of the function being built.
        function: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Calibration table could not be built.
    #[error("Invalid calibration for '{function}': {source}")]
    Calibration {
        /// Local key of the function being built.
        function: String,
        /// Underlying calibration failure.
        #[source]
        source: CalibrationError,
    },

    /// No function is registered under the given local key.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// Binding address text could not be parsed.
    #[error("Invalid binding address '{0}'")]
    InvalidAddress(String),
}

impl FunctionError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for function construction and lookup.
pub type FunctionResult<T> = Result<T, FunctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_names_both_owners() {
        let err = FunctionError::DuplicateElementId {
            id: "3001".to_string(),
            first: "Fuel.Pump".to_string(),
            second: "Fuel.Valve".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3001"));
        assert!(text.contains("Fuel.Pump"));
        assert!(text.contains("Fuel.Valve"));
    }

    #[test]
    fn test_invalid_helper() {
        let err = FunctionError::invalid("Panel.Knob", "no positions");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'Panel.Knob': no positions"
        );
    }
}
