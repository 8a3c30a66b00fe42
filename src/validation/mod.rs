//! Input checks that run before any cache lookup or network call.

pub mod error;

use crate::types::coordinate::Coordinate;
use crate::types::series::DATE_FORMAT;
use crate::types::variable::Variable;
use chrono::{Duration, NaiveDate};
use error::ValidationError;
use std::collections::BTreeMap;

/// Parses variable codes and checks each threshold against its variable's
/// range. Stops at the first violation; values are never clamped.
pub fn validate_variables(
    parameters: &BTreeMap<String, f64>,
) -> Result<BTreeMap<Variable, f64>, ValidationError> {
    let mut thresholds = BTreeMap::new();
    for (code, &value) in parameters {
        let variable: Variable = code
            .parse()
            .map_err(|_| ValidationError::UnsupportedVariable(code.clone()))?;
        thresholds.insert(variable, value);
    }
    validate_thresholds(&thresholds)?;
    Ok(thresholds)
}

/// Range checks for already-typed thresholds.
pub fn validate_thresholds(thresholds: &BTreeMap<Variable, f64>) -> Result<(), ValidationError> {
    if thresholds.is_empty() {
        return Err(ValidationError::NoVariables);
    }
    for (&variable, &value) in thresholds {
        let range = variable.threshold_range();
        if !range.contains(value) {
            return Err(ValidationError::ThresholdOutOfRange {
                variable,
                value,
                range,
            });
        }
    }
    Ok(())
}

/// Parses a `YYYYMMDD` date and checks it is strictly after `today` and no
/// more than `horizon_days` ahead of it.
pub fn validate_date(
    date: &str,
    today: NaiveDate,
    horizon_days: i64,
) -> Result<NaiveDate, ValidationError> {
    // chrono accepts shorter fields ("2027011"), the wire format does not.
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidDateFormat(date.to_string()));
    }
    let parsed = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDateFormat(date.to_string()))?;
    validate_target_date(parsed, today, horizon_days)?;
    Ok(parsed)
}

/// Checks `date` is strictly after `today` and within `horizon_days` of it.
pub fn validate_target_date(
    date: NaiveDate,
    today: NaiveDate,
    horizon_days: i64,
) -> Result<(), ValidationError> {
    if date <= today {
        return Err(ValidationError::DateOutOfRange {
            date,
            reason: "date cannot be in the past nor today".to_string(),
        });
    }
    let horizon = today + Duration::days(horizon_days);
    if date > horizon {
        return Err(ValidationError::DateOutOfRange {
            date,
            reason: format!("date cannot be later than {}", horizon),
        });
    }
    Ok(())
}

pub fn validate_coordinate(coordinate: &Coordinate) -> Result<(), ValidationError> {
    let Coordinate {
        longitude,
        latitude,
    } = *coordinate;
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::InvalidCoordinate {
            reason: format!("longitude {} must be between -180 and 180", longitude),
        });
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::InvalidCoordinate {
            reason: format!("latitude {} must be between -90 and 90", latitude),
        });
    }
    Ok(())
}
