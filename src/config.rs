use crate::types::coordinate::CoordinatePolicy;
use crate::upstream::power_client::{DEFAULT_BASE_URL, DEFAULT_COMMUNITY};
use bon::Builder;
use chrono::NaiveDate;
use std::time::Duration;

/// Earliest day of history requested from the provider.
pub fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Tunables for a [`PowerOutlook`](crate::PowerOutlook) client.
///
/// Every field has a default, so only the ones that differ need setting.
///
/// # Examples
///
/// ```
/// use power_outlook::{CoordinatePolicy, OutlookConfig};
/// use std::time::Duration;
///
/// let config = OutlookConfig::builder()
///     .cache_ttl(Duration::from_secs(600))
///     .coordinate_policy(CoordinatePolicy::FixedPrecision(3))
///     .build();
/// assert_eq!(config.reporting_lag_days, 10);
/// assert_eq!(config.community, "ag");
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct OutlookConfig {
    /// Root of the provider's temporal API; `daily/point` is appended.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(into, default = DEFAULT_COMMUNITY.to_string())]
    pub community: String,
    #[builder(default = default_history_start())]
    pub history_start: NaiveDate,
    /// How many days the provider's data trails the current date.
    #[builder(default = 10)]
    pub reporting_lag_days: i64,
    /// How far ahead of today a target date may be.
    #[builder(default = 365)]
    pub horizon_days: i64,
    /// Lifetime of a cache entry, counted from its creation.
    #[builder(default = Duration::from_secs(3600))]
    pub cache_ttl: Duration,
    #[builder(default)]
    pub coordinate_policy: CoordinatePolicy,
    #[builder(default = Duration::from_secs(60))]
    pub request_timeout: Duration,
}

impl Default for OutlookConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
