use crate::types::variable::{ThresholdRange, Variable};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid parameter: {0}")]
    UnsupportedVariable(String),

    #[error("Threshold {value} for {variable} is out of range: must be {range}")]
    ThresholdOutOfRange {
        variable: Variable,
        value: f64,
        range: ThresholdRange,
    },

    #[error("At least one parameter must be requested")]
    NoVariables,

    #[error("Invalid coordinate: {reason}")]
    InvalidCoordinate { reason: String },

    #[error("Date '{0}' must be in YYYYMMDD format")]
    InvalidDateFormat(String),

    #[error("Date {date} is out of range: {reason}")]
    DateOutOfRange { date: NaiveDate, reason: String },
}
