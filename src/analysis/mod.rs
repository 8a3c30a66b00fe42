pub mod calendar_day;
pub mod forecast;
pub mod statistics;

use crate::analysis::calendar_day::{extract, CalendarDaySample};
use crate::types::response::VariableResult;
use crate::types::series::SeriesMap;
use crate::types::variable::Variable;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Not enough observations for {statistic}: need {required}, have {available}")]
    InsufficientData {
        statistic: &'static str,
        required: usize,
        available: usize,
    },
}

/// Computes every statistic for one calendar-day sample. Statistics the
/// sample is too small for come back as `None`.
pub fn analyze(sample: &CalendarDaySample, threshold: f64) -> VariableResult {
    VariableResult {
        mean: statistics::mean(sample).ok(),
        probability: statistics::exceedance_probability(sample, threshold),
        forecast_prediction: forecast::predict_next(sample).ok(),
        previous_dates: sample.by_date_string(),
        min_value: statistics::min(sample).ok(),
        max_value: statistics::max(sample).ok(),
        sample_size: sample.len(),
    }
}

/// Analyzes each thresholded variable on `target`'s month and day.
///
/// A variable absent from `series` yields an empty-sample result rather than
/// failing the whole request.
pub fn analyze_all(
    series: &SeriesMap,
    target: NaiveDate,
    thresholds: &BTreeMap<Variable, f64>,
) -> BTreeMap<Variable, VariableResult> {
    thresholds
        .iter()
        .map(|(variable, threshold)| {
            let sample = series
                .get(variable)
                .map(|s| extract(s, target))
                .unwrap_or_default();
            debug!(
                "{} on {}: {} observations",
                variable,
                target.format("%m-%d"),
                sample.len()
            );
            (*variable, analyze(&sample, *threshold))
        })
        .collect()
}
