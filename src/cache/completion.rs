use crate::cache::SeriesCache;
use crate::error::OutlookError;
use crate::types::coordinate::{CacheKey, Coordinate};
use crate::types::series::{restrict, SeriesMap};
use crate::types::variable::Variable;
use crate::upstream::{FetchWindow, SeriesRequest, SeriesSource};
use log::{info, warn};
use std::collections::{hash_map::Entry, BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;

type InFlight = Arc<StdMutex<HashMap<CacheKey, Arc<Mutex<()>>>>>;

/// How a request was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Everything came from the cache.
    Hit,
    /// Some variables were cached, these were fetched and merged.
    PartialHit { fetched: BTreeSet<Variable> },
    /// Nothing usable was cached; every requested variable was fetched.
    Miss,
}

#[derive(Debug, Clone)]
pub struct Completion {
    /// Exactly the requested variables.
    pub series: SeriesMap,
    pub outcome: CacheOutcome,
}

/// Serves a set of variables for a coordinate from the cache, fetching only
/// the variables the cache lacks in a single upstream call.
///
/// Completions for one cache key run one at a time: a request that arrives
/// while another is fetching for the same key waits, then re-reads the cache
/// and only fetches what is still missing. The fetch runs on its own task, so
/// dropping a waiting caller does not cancel it.
pub struct SeriesCompleter {
    cache: Arc<dyn SeriesCache>,
    source: Arc<dyn SeriesSource>,
    ttl: Duration,
    in_flight: InFlight,
}

impl SeriesCompleter {
    pub fn new(cache: Arc<dyn SeriesCache>, source: Arc<dyn SeriesSource>, ttl: Duration) -> Self {
        Self {
            cache,
            source,
            ttl,
            in_flight: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &Arc<dyn SeriesCache> {
        &self.cache
    }

    pub async fn complete(
        &self,
        key: &CacheKey,
        coordinate: Coordinate,
        variables: &BTreeSet<Variable>,
        window: FetchWindow,
    ) -> Result<Completion, OutlookError> {
        // --- Fast path: full hit, no lock ---
        if let Some(entry) = self.cache.get(key).await? {
            if variables.iter().all(|v| entry.series.contains_key(v)) {
                info!("Cache hit for {} ({} variables)", key, variables.len());
                return Ok(Completion {
                    series: restrict(&entry.series, variables),
                    outcome: CacheOutcome::Hit,
                });
            }
        }

        // --- Slow path: serialize on the key and complete on a detached task ---
        let lock = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                in_flight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let task = tokio::spawn(complete_locked(
            Arc::clone(&self.cache),
            Arc::clone(&self.source),
            Arc::clone(&self.in_flight),
            lock,
            key.clone(),
            SeriesRequest {
                coordinate,
                window,
                variables: variables.clone(),
            },
            self.ttl,
        ));
        task.await?
    }
}

async fn complete_locked(
    cache: Arc<dyn SeriesCache>,
    source: Arc<dyn SeriesSource>,
    in_flight: InFlight,
    lock: Arc<Mutex<()>>,
    key: CacheKey,
    request: SeriesRequest,
    ttl: Duration,
) -> Result<Completion, OutlookError> {
    let flight = FlightGuard {
        in_flight,
        key: key.clone(),
        lock: Some(Arc::clone(&lock)),
    };
    let permit = lock.lock_owned().await;
    let result = fetch_missing(cache.as_ref(), source.as_ref(), &key, request, ttl).await;
    drop(permit);
    drop(flight);
    result
}

/// Forgets the key once no other completion is queued on it, also when the
/// completion unwinds. Clones of the lock are only taken while the map is
/// held, and each task releases its permit before its guard runs, so the
/// last guard for a key sees a count of one.
struct FlightGuard {
    in_flight: InFlight,
    key: CacheKey,
    lock: Option<Arc<Mutex<()>>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let ours = Arc::as_ptr(&lock);
        drop(lock);
        if let Entry::Occupied(slot) = map.entry(self.key.clone()) {
            if Arc::as_ptr(slot.get()) == ours && Arc::strong_count(slot.get()) == 1 {
                slot.remove();
            }
        }
    }
}

async fn fetch_missing(
    cache: &dyn SeriesCache,
    source: &dyn SeriesSource,
    key: &CacheKey,
    request: SeriesRequest,
    ttl: Duration,
) -> Result<Completion, OutlookError> {
    let requested = request.variables.clone();
    let cached = cache.get(key).await?;

    let Some(entry) = cached else {
        info!(
            "Cache miss for {}. Fetching {} from {}.",
            key,
            request.parameters_param(),
            source.name()
        );
        let fetched = source.fetch(&request).await.map_err(|e| {
            warn!("Fetch for {} failed: {}", key, e);
            OutlookError::from(e)
        })?;
        let series = restrict(&fetched, &requested);
        cache.put(key, series.clone(), ttl).await?;
        return Ok(Completion {
            series,
            outcome: CacheOutcome::Miss,
        });
    };

    let missing: BTreeSet<Variable> = requested
        .iter()
        .filter(|v| !entry.series.contains_key(*v))
        .copied()
        .collect();
    if missing.is_empty() {
        // Another completion filled the gap while this one waited.
        info!("Cache hit for {} after waiting on in-flight fetch", key);
        return Ok(Completion {
            series: restrict(&entry.series, &requested),
            outcome: CacheOutcome::Hit,
        });
    }

    let partial = SeriesRequest {
        variables: missing.clone(),
        ..request
    };
    info!(
        "Partial cache hit for {}. Fetching missing {} from {}.",
        key,
        partial.parameters_param(),
        source.name()
    );
    let fetched = source.fetch(&partial).await.map_err(|e| {
        warn!("Fetch for {} failed: {}", key, e);
        OutlookError::from(e)
    })?;
    let fetched = restrict(&fetched, &missing);
    cache.merge_variables(key, fetched.clone()).await?;

    let mut series = restrict(&entry.series, &requested);
    series.extend(fetched);
    Ok(Completion {
        series,
        outcome: CacheOutcome::PartialHit { fetched: missing },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemorySeriesCache;
    use crate::error::ErrorKind;
    use crate::test_support::{key, series_for, RecordingSource};
    use crate::upstream::error::UpstreamError;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct PanickingSource;

    #[async_trait]
    impl SeriesSource for PanickingSource {
        async fn fetch(&self, _request: &SeriesRequest) -> Result<SeriesMap, UpstreamError> {
            panic!("source crashed mid-fetch");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn window() -> FetchWindow {
        FetchWindow {
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    fn vars(list: &[Variable]) -> BTreeSet<Variable> {
        list.iter().copied().collect()
    }

    fn completer(source: Arc<RecordingSource>) -> (SeriesCompleter, Arc<MemorySeriesCache>) {
        let cache = Arc::new(MemorySeriesCache::new(Duration::from_secs(3600)));
        (
            SeriesCompleter::new(cache.clone(), source, Duration::from_secs(3600)),
            cache,
        )
    }

    fn coordinate() -> Coordinate {
        Coordinate::new(13.4, 52.5)
    }

    #[tokio::test]
    async fn test_first_request_fetches_everything_once() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::new());
        let (completer, cache) = completer(source.clone());
        let wanted = vars(&[Variable::Temperature, Variable::RelativeHumidity]);

        let completion = completer
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;

        assert_eq!(completion.outcome, CacheOutcome::Miss);
        assert_eq!(source.requested(), vec![wanted.clone()]);
        let entry = cache.get(&key("k")).await?.unwrap();
        assert_eq!(entry.series.keys().copied().collect::<BTreeSet<_>>(), wanted);
        assert_eq!(completion.series.keys().copied().collect::<BTreeSet<_>>(), wanted);
        Ok(())
    }

    #[tokio::test]
    async fn test_subset_of_cached_is_served_without_upstream() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::new());
        let (completer, cache) = completer(source.clone());
        cache
            .put(
                &key("k"),
                series_for(&[Variable::Temperature, Variable::WindSpeed, Variable::SnowDepth]),
                Duration::from_secs(60),
            )
            .await?;

        let wanted = vars(&[Variable::Temperature, Variable::SnowDepth]);
        let completion = completer
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;

        assert_eq!(completion.outcome, CacheOutcome::Hit);
        assert_eq!(source.calls(), 0);
        assert_eq!(completion.series.keys().copied().collect::<BTreeSet<_>>(), wanted);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_hit_fetches_only_the_difference() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::new());
        let (completer, cache) = completer(source.clone());
        cache
            .put(
                &key("k"),
                series_for(&[Variable::Temperature, Variable::WindSpeed]),
                Duration::from_secs(60),
            )
            .await?;

        let wanted = vars(&[
            Variable::Temperature,
            Variable::RelativeHumidity,
            Variable::CloudAmount,
        ]);
        let completion = completer
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;

        let difference = vars(&[Variable::RelativeHumidity, Variable::CloudAmount]);
        assert_eq!(
            completion.outcome,
            CacheOutcome::PartialHit {
                fetched: difference.clone()
            }
        );
        assert_eq!(source.requested(), vec![difference]);
        assert_eq!(completion.series.keys().copied().collect::<BTreeSet<_>>(), wanted);

        let entry = cache.get(&key("k")).await?.unwrap();
        assert_eq!(
            entry.series.keys().copied().collect::<BTreeSet<_>>(),
            vars(&[
                Variable::Temperature,
                Variable::WindSpeed,
                Variable::RelativeHumidity,
                Variable::CloudAmount,
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched_in_full() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::new());
        let (completer, cache) = completer(source.clone());
        cache
            .put(&key("k"), series_for(&[Variable::Temperature]), Duration::ZERO)
            .await?;

        let wanted = vars(&[Variable::Temperature, Variable::WindSpeed]);
        let completion = completer
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;

        assert_eq!(completion.outcome, CacheOutcome::Miss);
        assert_eq!(source.requested(), vec![wanted]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::failing());
        let (completer, cache) = completer(source.clone());
        cache
            .put(&key("k"), series_for(&[Variable::Temperature]), Duration::from_secs(60))
            .await?;
        let before = cache.get(&key("k")).await?.unwrap();

        let err = completer
            .complete(
                &key("k"),
                coordinate(),
                &vars(&[Variable::Temperature, Variable::SnowDepth]),
                window(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(cache.get(&key("k")).await?.unwrap(), before);
        assert!(cache.get(&key("other")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_requests_share_one_fetch() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::with_delay(Duration::from_millis(50)));
        let (completer, _cache) = completer(source.clone());
        let completer = Arc::new(completer);
        let wanted = vars(&[Variable::Temperature, Variable::Precipitation]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let completer = Arc::clone(&completer);
            let wanted = wanted.clone();
            handles.push(tokio::spawn(async move {
                completer
                    .complete(&key("k"), coordinate(), &wanted, window())
                    .await
            }));
        }
        for handle in handles {
            let completion = handle.await??;
            assert_eq!(completion.series.len(), 2);
        }

        assert_eq!(source.calls(), 1);
        assert!(completer.in_flight.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_waiter_fetches_only_what_the_first_flight_lacked() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::with_delay(Duration::from_millis(50)));
        let (completer, _cache) = completer(source.clone());
        let completer = Arc::new(completer);

        let first = {
            let completer = Arc::clone(&completer);
            tokio::spawn(async move {
                completer
                    .complete(&key("k"), coordinate(), &vars(&[Variable::Temperature]), window())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = completer
            .complete(
                &key("k"),
                coordinate(),
                &vars(&[Variable::Temperature, Variable::WindSpeed]),
                window(),
            )
            .await?;
        first.await??;

        assert_eq!(
            source.requested(),
            vec![vars(&[Variable::Temperature]), vars(&[Variable::WindSpeed])]
        );
        assert_eq!(
            second.outcome,
            CacheOutcome::PartialHit {
                fetched: vars(&[Variable::WindSpeed])
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_the_fetch() -> Result<(), OutlookError> {
        let source = Arc::new(RecordingSource::with_delay(Duration::from_millis(50)));
        let (completer, cache) = completer(source.clone());
        let wanted = vars(&[Variable::CloudAmount]);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            completer.complete(&key("k"), coordinate(), &wanted, window()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&key("k")).await?.is_some());

        let completion = completer
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;
        assert_eq!(completion.outcome, CacheOutcome::Hit);
        assert_eq!(source.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_panicking_fetch_releases_the_key() -> Result<(), OutlookError> {
        let cache = Arc::new(MemorySeriesCache::new(Duration::from_secs(3600)));
        let crashing =
            SeriesCompleter::new(cache.clone(), Arc::new(PanickingSource), Duration::from_secs(3600));
        let wanted = vars(&[Variable::Temperature]);

        let err = crashing
            .complete(&key("k"), coordinate(), &wanted, window())
            .await
            .unwrap_err();

        assert!(matches!(err, OutlookError::TaskJoin(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(crashing.in_flight.lock().unwrap().is_empty());
        assert!(cache.get(&key("k")).await?.is_none());

        // The key is free for the next completion on the same map.
        let source = Arc::new(RecordingSource::new());
        let healthy = SeriesCompleter {
            cache: crashing.cache.clone(),
            source: source.clone(),
            ttl: crashing.ttl,
            in_flight: Arc::clone(&crashing.in_flight),
        };
        let completion = healthy
            .complete(&key("k"), coordinate(), &wanted, window())
            .await?;
        assert_eq!(completion.outcome, CacheOutcome::Miss);
        assert_eq!(source.calls(), 1);
        assert!(healthy.in_flight.lock().unwrap().is_empty());
        Ok(())
    }
}
