use crate::types::variable::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The statistics computed for one variable on the requested calendar day.
///
/// `None` means the sample was too small for that statistic (insufficient
/// data); it serializes as `null`. `probability` is always defined and is `0`
/// for an empty sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableResult {
    pub mean: Option<f64>,
    pub probability: f64,
    /// Sent as `foreCastPrediction`, the key the dashboard reads.
    #[serde(rename = "foreCastPrediction")]
    pub forecast_prediction: Option<f64>,
    /// The cleaned calendar-day sample, `YYYYMMDD` to value.
    pub previous_dates: BTreeMap<String, f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub sample_size: usize,
}

impl VariableResult {
    /// True when the sample held no usable observation at all.
    pub fn is_insufficient(&self) -> bool {
        self.sample_size == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeatherResponse {
    pub data: BTreeMap<Variable, VariableResult>,
    pub success: bool,
}

impl WeatherResponse {
    pub fn new(data: BTreeMap<Variable, VariableResult>) -> Self {
        Self {
            data,
            success: true,
        }
    }
}
