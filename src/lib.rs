mod analysis;
mod cache;
mod config;
mod error;
mod export;
mod outlook;
mod types;
mod upstream;
mod utils;
mod validation;

#[cfg(test)]
mod test_support;

pub use config::OutlookConfig;
pub use error::{ErrorKind, OutlookError};
pub use outlook::PowerOutlook;

pub use types::coordinate::{CacheKey, Coordinate, CoordinatePolicy};
pub use types::request::WeatherRequest;
pub use types::response::{VariableResult, WeatherResponse};
pub use types::series::{DailySeries, SeriesMap, SeriesValue, MISSING_SENTINEL};
pub use types::variable::{ThresholdRange, UnknownVariable, Variable};

pub use analysis::calendar_day::{extract as extract_calendar_day, CalendarDaySample};
pub use analysis::forecast::predict_next;
pub use analysis::{analyze, analyze_all, AnalysisError};

pub use cache::completion::{CacheOutcome, Completion, SeriesCompleter};
pub use cache::error::CacheError;
pub use cache::file::FileSeriesCache;
pub use cache::memory::MemorySeriesCache;
pub use cache::{CacheEntry, SeriesCache};

pub use export::{samples_to_csv, samples_to_frame};

pub use upstream::error::UpstreamError;
pub use upstream::power_client::PowerClient;
pub use upstream::{FetchWindow, SeriesRequest, SeriesSource};

pub use validation::error::ValidationError;
