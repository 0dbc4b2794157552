//! Calibration tables for simulator gauges
//!
//! Raw values exported by the simulator are rarely in engineering units. A
//! needle argument of `0.35` might mean 140 knots on one gauge and 3500 feet on
//! another, and the mapping is usually non-linear. This crate provides the
//! piecewise-linear table used to convert those raw scalars.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod points;

pub use points::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration table has no points")]
    Empty,

    #[error("Calibration point {index} is not finite")]
    NonFinite { index: usize },

    #[error("Calibration input {input} appears more than once")]
    DuplicateInput { input: f64 },
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;
