//! Storage of fetched series, keyed by coordinate.
//!
//! - **SeriesCache**: trait over get / put / merge
//! - **MemorySeriesCache**: process-local map
//! - **FileSeriesCache**: one bincode file per coordinate
//! - **SeriesCompleter**: serves a variable set, fetching only what the cache lacks

pub mod completion;
pub mod error;
pub mod file;
pub mod memory;

use crate::types::coordinate::CacheKey;
use crate::types::series::SeriesMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error::CacheError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The series stored for one coordinate and the moment they go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub series: SeriesMap,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(series: SeriesMap, ttl: Duration) -> Self {
        Self {
            series,
            expires_at: expiry_from_now(ttl),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub(crate) fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A store of per-coordinate series with an entry-wide time-to-live.
///
/// Expired entries behave exactly like absent ones. A merge must be visible
/// to readers all at once.
#[async_trait]
pub trait SeriesCache: Send + Sync {
    /// The live entry for `key`, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Stores `series` under `key`, replacing any entry and restarting its clock.
    async fn put(&self, key: &CacheKey, series: SeriesMap, ttl: Duration)
        -> Result<(), CacheError>;

    /// Adds the variables of `series` that the entry lacks, keeping its
    /// expiry. Creates the entry with the default time-to-live when absent.
    async fn merge_variables(&self, key: &CacheKey, series: SeriesMap) -> Result<(), CacheError>;

    /// Store name for logging.
    fn name(&self) -> &str;
}
