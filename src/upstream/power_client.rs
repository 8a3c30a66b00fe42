use crate::types::series::{DailySeries, SeriesMap, SeriesValue, DATE_FORMAT};
use crate::types::variable::Variable;
use crate::upstream::error::UpstreamError;
use crate::upstream::{SeriesRequest, SeriesSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/";
pub const DEFAULT_COMMUNITY: &str = "ag";

/// Client for the NASA POWER daily point endpoint.
pub struct PowerClient {
    base_url: String,
    community: String,
    client: Client,
}

impl PowerClient {
    pub fn new(
        base_url: impl Into<String>,
        community: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("power_outlook/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            community: community.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/daily/point", self.base_url.trim_end_matches('/'))
    }

    /// Query string for one request, in the provider's parameter order.
    pub fn query_pairs(&self, request: &SeriesRequest) -> Vec<(&'static str, String)> {
        vec![
            ("start", request.window.start_param()),
            ("end", request.window.end_param()),
            ("community", self.community.clone()),
            ("longitude", request.coordinate.longitude.to_string()),
            ("latitude", request.coordinate.latitude.to_string()),
            ("parameters", request.parameters_param()),
            ("format", "JSON".to_string()),
        ]
    }
}

#[async_trait]
impl SeriesSource for PowerClient {
    async fn fetch(&self, request: &SeriesRequest) -> Result<SeriesMap, UpstreamError> {
        let url = self.endpoint();
        info!(
            "Requesting {} at {} for {} from {}",
            request.parameters_param(),
            request.coordinate,
            request.window,
            url
        );
        debug!("Query: {:?}", self.query_pairs(request));

        let response = self
            .client
            .get(&url)
            .query(&self.query_pairs(request))
            .send()
            .await
            .map_err(|e| UpstreamError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    UpstreamError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    UpstreamError::NetworkRequest(url, e)
                });
            }
        };

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(url.clone(), e))?;

        let series = parse_parameter_block(&body)?;
        ensure_requested_present(&series, request)?;
        info!(
            "Received {} series ({} days each) for {}",
            series.len(),
            series.values().map(DailySeries::len).max().unwrap_or(0),
            request.coordinate
        );
        Ok(series)
    }

    fn name(&self) -> &str {
        "nasa-power"
    }
}

/// Extracts `properties.parameter` into typed series.
///
/// Parameter codes this crate does not know are skipped.
pub fn parse_parameter_block(body: &Value) -> Result<SeriesMap, UpstreamError> {
    let block = body
        .pointer("/properties/parameter")
        .and_then(Value::as_object)
        .ok_or(UpstreamError::MissingParameterBlock)?;

    let mut series_map = SeriesMap::new();
    for (code, raw_series) in block {
        let Ok(variable) = code.parse::<Variable>() else {
            debug!("Skipping unrequested parameter {}", code);
            continue;
        };
        let points = raw_series
            .as_object()
            .ok_or_else(|| UpstreamError::MalformedSeries {
                variable: code.clone(),
            })?;

        let mut series = DailySeries::new();
        for (key, raw) in points {
            let date = NaiveDate::parse_from_str(key, DATE_FORMAT).map_err(|_| {
                UpstreamError::InvalidDateKey {
                    variable: code.clone(),
                    key: key.clone(),
                }
            })?;
            let value = match raw {
                Value::Null => SeriesValue::Missing,
                Value::Number(n) => SeriesValue::from_raw(n.as_f64()),
                _ => {
                    return Err(UpstreamError::MalformedSeries {
                        variable: code.clone(),
                    })
                }
            };
            series.insert(date, value);
        }
        series_map.insert(variable, series);
    }
    Ok(series_map)
}

/// Fails when the answer lacks a variable that was asked for.
pub fn ensure_requested_present(
    series: &SeriesMap,
    request: &SeriesRequest,
) -> Result<(), UpstreamError> {
    match request.variables.iter().find(|v| !series.contains_key(*v)) {
        Some(missing) => Err(UpstreamError::MissingVariable(*missing)),
        None => Ok(()),
    }
}
