use crate::analysis::calendar_day::CalendarDaySample;
use crate::analysis::AnalysisError;
use ordered_float::OrderedFloat;

pub fn mean(sample: &CalendarDaySample) -> Result<f64, AnalysisError> {
    let values = non_empty(sample, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Share of observations strictly above `threshold`; `0` for an empty sample.
pub fn exceedance_probability(sample: &CalendarDaySample, threshold: f64) -> f64 {
    let total = sample.len();
    if total == 0 {
        return 0.0;
    }
    let above = sample
        .points()
        .iter()
        .filter(|(_, v)| *v > threshold)
        .count();
    above as f64 / total as f64
}

pub fn min(sample: &CalendarDaySample) -> Result<f64, AnalysisError> {
    non_empty(sample, "min")?
        .into_iter()
        .map(OrderedFloat)
        .min()
        .map(|v| v.into_inner())
        .ok_or(AnalysisError::InsufficientData {
            statistic: "min",
            required: 1,
            available: 0,
        })
}

pub fn max(sample: &CalendarDaySample) -> Result<f64, AnalysisError> {
    non_empty(sample, "max")?
        .into_iter()
        .map(OrderedFloat)
        .max()
        .map(|v| v.into_inner())
        .ok_or(AnalysisError::InsufficientData {
            statistic: "max",
            required: 1,
            available: 0,
        })
}

fn non_empty(sample: &CalendarDaySample, statistic: &'static str) -> Result<Vec<f64>, AnalysisError> {
    if sample.is_empty() {
        return Err(AnalysisError::InsufficientData {
            statistic,
            required: 1,
            available: 0,
        });
    }
    Ok(sample.values())
}
