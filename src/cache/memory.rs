use crate::cache::error::CacheError;
use crate::cache::{CacheEntry, SeriesCache};
use crate::types::coordinate::CacheKey;
use crate::types::series::{merge_new_variables, SeriesMap};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory series cache.
///
/// Merges run under the write lock, so a reader sees an entry either before
/// or after a merge, never in between.
#[derive(Debug)]
pub struct MemorySeriesCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    default_ttl: Duration,
}

impl MemorySeriesCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SeriesCache for MemorySeriesCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .cloned())
    }

    async fn put(
        &self,
        key: &CacheKey,
        series: SeriesMap,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.clone(), CacheEntry::new(series, ttl));
        Ok(())
    }

    async fn merge_variables(&self, key: &CacheKey, series: SeriesMap) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(Utc::now()) => {
                let added = merge_new_variables(&mut entry.series, series);
                debug!("Merged {:?} into cache entry {}", added, key);
            }
            _ => {
                entries.insert(key.clone(), CacheEntry::new(series, self.default_ttl));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
