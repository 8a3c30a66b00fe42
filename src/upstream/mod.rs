//! Fetching historical daily series from the data provider.

pub mod error;
pub mod power_client;

use crate::types::coordinate::Coordinate;
use crate::types::series::{SeriesMap, DATE_FORMAT};
use crate::types::variable::Variable;
use async_trait::async_trait;
use chrono::{Datelike, Duration, Months, NaiveDate};
use error::UpstreamError;
use std::collections::BTreeSet;
use std::fmt;

/// The inclusive date range requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// Picks the history window for a request targeting `target`.
    ///
    /// The provider lags `reporting_lag_days` behind `today`, so the window
    /// normally ends on that day. When the target falls in today's month and
    /// is not earlier than that lagged day, the end moves one more year back
    /// so the most recent years line up with the target's calendar day.
    pub fn for_target(
        target: NaiveDate,
        today: NaiveDate,
        history_start: NaiveDate,
        reporting_lag_days: i64,
    ) -> Self {
        let lagged = today - Duration::days(reporting_lag_days);
        let end = if target.month() == today.month() && target >= lagged {
            lagged.checked_sub_months(Months::new(12)).unwrap_or(lagged)
        } else {
            lagged
        };
        Self {
            start: history_start,
            end,
        }
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// One batched request for several variables at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub coordinate: Coordinate,
    pub window: FetchWindow,
    pub variables: BTreeSet<Variable>,
}

impl SeriesRequest {
    /// The comma-joined variable list the provider expects.
    pub fn parameters_param(&self) -> String {
        self.variables
            .iter()
            .map(Variable::code)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A provider of historical daily series.
///
/// Implementations must answer a request with one upstream call, returning a
/// series for every requested variable.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, request: &SeriesRequest) -> Result<SeriesMap, UpstreamError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}
