use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deserialized outlook request as handed over by the web layer.
///
/// Field names follow the wire format (`FutureDate`, `Longitude`, ...);
/// camelCase spellings are accepted as aliases.
///
/// # Examples
///
/// ```
/// use power_outlook::WeatherRequest;
///
/// let request: WeatherRequest = serde_json::from_str(
///     r#"{"FutureDate": "20270704", "Longitude": -74.006, "Latitude": 40.7128,
///         "Parameters": {"T2M": 30.0, "RH2M": 80.0}}"#,
/// ).unwrap();
/// assert_eq!(request.parameters["T2M"], 30.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeatherRequest {
    /// Target date, `YYYYMMDD`.
    #[serde(alias = "futureDate")]
    pub future_date: String,
    #[serde(alias = "longitude")]
    pub longitude: f64,
    #[serde(alias = "latitude")]
    pub latitude: f64,
    /// Variable code to exceedance threshold.
    #[serde(alias = "parameters")]
    pub parameters: BTreeMap<String, f64>,
}
