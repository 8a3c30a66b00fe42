//! Defines the set of NASA POWER daily variables this crate can analyze,
//! together with the plausible range a caller's threshold must fall in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A climate variable served by the NASA POWER daily point API.
///
/// Each variant corresponds to one upstream parameter code (e.g. `T2M`). The
/// code is used verbatim on the wire, in cache entries, and in responses.
///
/// # Examples
///
/// ```
/// use power_outlook::Variable;
///
/// let v: Variable = "RH2M".parse().unwrap();
/// assert_eq!(v, Variable::RelativeHumidity);
/// assert_eq!(v.to_string(), "RH2M");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Temperature at 2 meters (°C).
    #[serde(rename = "T2M")]
    Temperature,
    /// Wind speed at 2 meters (m/s).
    #[serde(rename = "WS2M")]
    WindSpeed,
    /// Bias-corrected total precipitation, rain and snowfall (mm/day).
    #[serde(rename = "PRECTOTCORR")]
    Precipitation,
    /// Relative humidity at 2 meters (%).
    #[serde(rename = "RH2M")]
    RelativeHumidity,
    /// Cloud amount (%).
    #[serde(rename = "CLOUD_AMT")]
    CloudAmount,
    /// Aerosol optical depth at 550 nm: dust, haze, smoke, fog.
    #[serde(rename = "AOD_55")]
    AerosolOpticalDepth,
    /// Snow depth (cm).
    #[serde(rename = "SNODP")]
    SnowDepth,
}

/// The closed interval a threshold must lie in for a given [`Variable`].
///
/// `None` on either side means the bound is open in that direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ThresholdRange {
    const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    const fn non_negative() -> Self {
        Self {
            min: Some(0.0),
            max: None,
        }
    }

    /// Whether `value` lies inside the range. `NaN` never does.
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "between {} and {}", min, max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, Some(max)) => write!(f, "<= {}", max),
            (None, None) => write!(f, "any value"),
        }
    }
}

impl Variable {
    /// All supported variables, in a stable order.
    pub const ALL: [Variable; 7] = [
        Variable::Temperature,
        Variable::WindSpeed,
        Variable::Precipitation,
        Variable::RelativeHumidity,
        Variable::CloudAmount,
        Variable::AerosolOpticalDepth,
        Variable::SnowDepth,
    ];

    /// The upstream parameter code.
    pub fn code(&self) -> &'static str {
        match self {
            Variable::Temperature => "T2M",
            Variable::WindSpeed => "WS2M",
            Variable::Precipitation => "PRECTOTCORR",
            Variable::RelativeHumidity => "RH2M",
            Variable::CloudAmount => "CLOUD_AMT",
            Variable::AerosolOpticalDepth => "AOD_55",
            Variable::SnowDepth => "SNODP",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature at 2 meters",
            Variable::WindSpeed => "Wind speed at 2 meters",
            Variable::Precipitation => "Precipitation (rainfall and snowfall)",
            Variable::RelativeHumidity => "Relative humidity at 2 meters",
            Variable::CloudAmount => "Cloud amount",
            Variable::AerosolOpticalDepth => "Aerosol optical depth (dust, haze, smoke, fog)",
            Variable::SnowDepth => "Snow depth",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Temperature => "°C",
            Variable::WindSpeed => "m/s",
            Variable::Precipitation => "mm/day",
            Variable::RelativeHumidity | Variable::CloudAmount => "%",
            Variable::AerosolOpticalDepth => "",
            Variable::SnowDepth => "cm",
        }
    }

    /// The range a caller-supplied threshold must lie in.
    pub fn threshold_range(&self) -> ThresholdRange {
        match self {
            Variable::RelativeHumidity | Variable::CloudAmount => {
                ThresholdRange::between(0.0, 100.0)
            }
            Variable::Temperature => ThresholdRange::between(-100.0, 60.0),
            Variable::WindSpeed | Variable::Precipitation | Variable::SnowDepth => {
                ThresholdRange::non_negative()
            }
            Variable::AerosolOpticalDepth => ThresholdRange::between(0.0, 10.0),
        }
    }
}

/// Formats a `Variable` as its upstream parameter code.
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when parsing an unknown parameter code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariable(pub String);

impl fmt::Display for UnknownVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variable '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariable {}

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.code() == s)
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}
