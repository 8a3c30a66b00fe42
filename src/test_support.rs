//! Shared fixtures for unit tests.

use crate::types::coordinate::CacheKey;
use crate::types::series::{DailySeries, SeriesMap, SeriesValue};
use crate::types::variable::Variable;
use crate::upstream::error::UpstreamError;
use crate::upstream::{SeriesRequest, SeriesSource};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn key(raw: &str) -> CacheKey {
    CacheKey::new(raw)
}

/// One series per variable holding a single `1.0` on 2020-06-01.
pub(crate) fn series_for(variables: &[Variable]) -> SeriesMap {
    let day = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
    variables
        .iter()
        .map(|v| {
            let series: DailySeries = [(day, SeriesValue::Value(1.0))].into_iter().collect();
            (*v, series)
        })
        .collect()
}

/// A daily series from `start` to `end` where each value is `year - 2000 + offset`.
pub(crate) fn yearly_ramp(start: NaiveDate, end: NaiveDate, offset: f64) -> DailySeries {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| (d, SeriesValue::Value(f64::from(d.year() - 2000) + offset)))
        .collect()
}

/// A [`SeriesSource`] that records every request and answers with
/// deterministic ramps over the requested window.
pub(crate) struct RecordingSource {
    requests: Mutex<Vec<SeriesRequest>>,
    delay: Duration,
    fail: bool,
}

impl RecordingSource {
    pub(crate) fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requested(&self) -> Vec<BTreeSet<Variable>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.variables.clone())
            .collect()
    }

    pub(crate) fn last_request(&self) -> Option<SeriesRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SeriesSource for RecordingSource {
    async fn fetch(&self, request: &SeriesRequest) -> Result<SeriesMap, UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(UpstreamError::Unavailable("connection refused".to_string()));
        }
        Ok(request
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| {
                (
                    *v,
                    yearly_ramp(request.window.start, request.window.end, i as f64 * 100.0),
                )
            })
            .collect())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
