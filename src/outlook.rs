//! The main entry point: turns a target date, a location and per-variable
//! thresholds into calendar-day statistics drawn from NASA POWER history.

use crate::analysis::analyze_all;
use crate::analysis::calendar_day::{extract, CalendarDaySample};
use crate::cache::completion::{CacheOutcome, SeriesCompleter};
use crate::cache::file::FileSeriesCache;
use crate::cache::memory::MemorySeriesCache;
use crate::cache::SeriesCache;
use crate::config::OutlookConfig;
use crate::error::OutlookError;
use crate::export::samples_to_csv;
use crate::types::coordinate::Coordinate;
use crate::types::request::WeatherRequest;
use crate::types::response::WeatherResponse;
use crate::types::series::SeriesMap;
use crate::types::variable::Variable;
use crate::upstream::power_client::PowerClient;
use crate::upstream::{FetchWindow, SeriesSource};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::validation::error::ValidationError;
use crate::validation::{
    validate_coordinate, validate_date, validate_target_date, validate_thresholds,
    validate_variables,
};
use bon::bon;
use chrono::{Local, NaiveDate};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Client answering "what do past years say about this day?" questions.
///
/// Historical series are fetched from the provider once per coordinate and
/// kept in a [`SeriesCache`]; later requests only fetch the variables the
/// cache does not hold yet.
///
/// # Examples
///
/// ```rust,no_run
/// # use power_outlook::{Coordinate, OutlookError, PowerOutlook, Variable};
/// # use std::collections::BTreeMap;
/// # use chrono::{Duration, Local};
/// # async fn run() -> Result<(), OutlookError> {
/// let client = PowerOutlook::new().await?;
/// let response = client
///     .outlook()
///     .date(Local::now().date_naive() + Duration::days(30))
///     .location(Coordinate::new(13.405, 52.52))
///     .thresholds(BTreeMap::from([(Variable::Temperature, 25.0)]))
///     .call()
///     .await?;
/// println!("{:?}", response.data[&Variable::Temperature].probability);
/// # Ok(())
/// # }
/// ```
pub struct PowerOutlook {
    config: OutlookConfig,
    completer: SeriesCompleter,
}

#[bon]
impl PowerOutlook {
    /// Creates a client with a file cache in the platform cache directory
    /// (e.g. `~/.cache/power_outlook_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`OutlookError::CacheDirResolution`] if there is no cache
    /// directory for this platform and [`OutlookError::CacheDirCreation`] if it
    /// cannot be created.
    pub async fn new() -> Result<Self, OutlookError> {
        let cache_folder = get_cache_dir().map_err(OutlookError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Creates a client with a file cache in `cache_folder`, creating the
    /// folder if needed.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, OutlookError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| OutlookError::CacheDirCreation(cache_folder.clone(), e))?;
        let config = OutlookConfig::default();
        let cache = FileSeriesCache::new(&cache_folder, config.cache_ttl).await?;
        Self::from_parts()
            .cache(Arc::new(cache))
            .config(config)
            .call()
    }

    /// Creates a client whose cache lives only as long as the client.
    pub fn in_memory() -> Result<Self, OutlookError> {
        let config = OutlookConfig::default();
        Self::from_parts()
            .cache(Arc::new(MemorySeriesCache::new(config.cache_ttl)))
            .config(config)
            .call()
    }

    /// Assembles a client from its components. Without a `source`, NASA POWER
    /// is queried at `config.base_url`.
    #[builder]
    pub fn from_parts(
        cache: Arc<dyn SeriesCache>,
        source: Option<Arc<dyn SeriesSource>>,
        config: Option<OutlookConfig>,
    ) -> Result<Self, OutlookError> {
        let config = config.unwrap_or_default();
        let source: Arc<dyn SeriesSource> = match source {
            Some(source) => source,
            None => Arc::new(
                PowerClient::new(
                    config.base_url.clone(),
                    config.community.clone(),
                    config.request_timeout,
                )
                .map_err(OutlookError::HttpClient)?,
            ),
        };
        info!(
            "Using {} cache with {} source",
            cache.name(),
            source.name()
        );
        Ok(Self {
            completer: SeriesCompleter::new(cache, source, config.cache_ttl),
            config,
        })
    }

    pub fn config(&self) -> &OutlookConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn SeriesCache> {
        self.completer.cache()
    }

    /// Answers a wire-format request, judging the date against the local
    /// calendar day.
    ///
    /// # Errors
    ///
    /// Validation failures ([`OutlookError::Validation`]) are raised before any
    /// cache or network access. Upstream failures abort the whole request and
    /// leave the cache as it was. Use [`OutlookError::kind`] to classify.
    pub async fn query(&self, request: &WeatherRequest) -> Result<WeatherResponse, OutlookError> {
        self.query_as_of(request, Local::now().date_naive()).await
    }

    /// [`query`](Self::query) with an explicit current date.
    pub async fn query_as_of(
        &self,
        request: &WeatherRequest,
        today: NaiveDate,
    ) -> Result<WeatherResponse, OutlookError> {
        let target = validate_date(&request.future_date, today, self.config.horizon_days)?;
        let coordinate = Coordinate::new(request.longitude, request.latitude);
        validate_coordinate(&coordinate)?;
        let thresholds = validate_variables(&request.parameters)?;
        self.run(target, coordinate, thresholds, today).await
    }

    /// Typed variant of [`query`](Self::query).
    ///
    /// `today` defaults to the local calendar day.
    #[builder]
    pub async fn outlook(
        &self,
        date: NaiveDate,
        location: Coordinate,
        thresholds: BTreeMap<Variable, f64>,
        today: Option<NaiveDate>,
    ) -> Result<WeatherResponse, OutlookError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        validate_target_date(date, today, self.config.horizon_days)?;
        validate_coordinate(&location)?;
        validate_thresholds(&thresholds)?;
        self.run(date, location, thresholds, today).await
    }

    /// The calendar-day samples behind an outlook as CSV: a `date` column
    /// (`YYYYMMDD`) and one column per variable, empty where a year has no
    /// observation.
    #[builder]
    pub async fn history_csv(
        &self,
        date: NaiveDate,
        location: Coordinate,
        variables: &[Variable],
        today: Option<NaiveDate>,
    ) -> Result<String, OutlookError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        validate_target_date(date, today, self.config.horizon_days)?;
        validate_coordinate(&location)?;
        if variables.is_empty() {
            return Err(ValidationError::NoVariables.into());
        }

        let variables: BTreeSet<Variable> = variables.iter().copied().collect();
        let series = self.history(date, location, &variables, today).await?;
        let samples: BTreeMap<Variable, CalendarDaySample> = variables
            .iter()
            .map(|v| {
                let sample = series.get(v).map(|s| extract(s, date)).unwrap_or_default();
                (*v, sample)
            })
            .collect();
        samples_to_csv(&samples).map_err(OutlookError::Export)
    }

    async fn run(
        &self,
        target: NaiveDate,
        coordinate: Coordinate,
        thresholds: BTreeMap<Variable, f64>,
        today: NaiveDate,
    ) -> Result<WeatherResponse, OutlookError> {
        let variables: BTreeSet<Variable> = thresholds.keys().copied().collect();
        let series = self.history(target, coordinate, &variables, today).await?;
        Ok(WeatherResponse::new(analyze_all(
            &series,
            target,
            &thresholds,
        )))
    }

    async fn history(
        &self,
        target: NaiveDate,
        coordinate: Coordinate,
        variables: &BTreeSet<Variable>,
        today: NaiveDate,
    ) -> Result<SeriesMap, OutlookError> {
        let window = FetchWindow::for_target(
            target,
            today,
            self.config.history_start,
            self.config.reporting_lag_days,
        );
        let key = self.config.coordinate_policy.cache_key(&coordinate);
        let completion = self
            .completer
            .complete(&key, coordinate, variables, window)
            .await?;
        match &completion.outcome {
            CacheOutcome::Hit => info!("Served {} from cache", key),
            CacheOutcome::PartialHit { fetched } => {
                info!("Completed {} by fetching {:?}", key, fetched)
            }
            CacheOutcome::Miss => info!("Fetched {} ({})", key, window),
        }
        Ok(completion.series)
    }
}
