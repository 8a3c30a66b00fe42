use crate::cache::error::CacheError;
use crate::upstream::error::UpstreamError;
use crate::validation::error::ValidationError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutlookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to export history as CSV")]
    Export(#[source] PolarsError),
}

/// The caller-facing category of an [`OutlookError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown variable, out-of-range threshold, or bad coordinate.
    InvalidParameter,
    InvalidDateFormat,
    /// Date is today, in the past, or beyond the horizon.
    DateOutOfRange,
    /// Network failure, timeout, or non-success status from the provider.
    UpstreamUnavailable,
    /// The provider answered, but not with the expected shape.
    UpstreamMalformed,
    Internal,
}

impl ErrorKind {
    /// HTTP status a web layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidParameter
            | ErrorKind::InvalidDateFormat
            | ErrorKind::DateOutOfRange => 400,
            ErrorKind::UpstreamUnavailable | ErrorKind::UpstreamMalformed => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl OutlookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OutlookError::Validation(e) => match e {
                ValidationError::InvalidDateFormat(_) => ErrorKind::InvalidDateFormat,
                ValidationError::DateOutOfRange { .. } => ErrorKind::DateOutOfRange,
                ValidationError::UnsupportedVariable(_)
                | ValidationError::ThresholdOutOfRange { .. }
                | ValidationError::NoVariables
                | ValidationError::InvalidCoordinate { .. } => ErrorKind::InvalidParameter,
            },
            OutlookError::Upstream(e) if e.is_unavailable() => ErrorKind::UpstreamUnavailable,
            OutlookError::Upstream(_) => ErrorKind::UpstreamMalformed,
            OutlookError::Cache(_)
            | OutlookError::TaskJoin(_)
            | OutlookError::CacheDirCreation(..)
            | OutlookError::CacheDirResolution(_)
            | OutlookError::HttpClient(_)
            | OutlookError::Export(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::variable::Variable;
    use chrono::NaiveDate;

    #[test]
    fn test_validation_errors_map_to_client_errors() {
        let cases = [
            (
                ValidationError::UnsupportedVariable("PS".to_string()),
                ErrorKind::InvalidParameter,
            ),
            (
                ValidationError::ThresholdOutOfRange {
                    variable: Variable::RelativeHumidity,
                    value: 150.0,
                    range: Variable::RelativeHumidity.threshold_range(),
                },
                ErrorKind::InvalidParameter,
            ),
            (
                ValidationError::InvalidDateFormat("2027-01-01".to_string()),
                ErrorKind::InvalidDateFormat,
            ),
            (
                ValidationError::DateOutOfRange {
                    date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    reason: "past".to_string(),
                },
                ErrorKind::DateOutOfRange,
            ),
        ];
        for (error, kind) in cases {
            let error = OutlookError::from(error);
            assert_eq!(error.kind(), kind);
            assert_eq!(error.kind().status_code(), 400);
        }
    }

    #[test]
    fn test_upstream_errors_split_by_cause() {
        let unavailable = OutlookError::from(UpstreamError::Unavailable("timeout".to_string()));
        assert_eq!(unavailable.kind(), ErrorKind::UpstreamUnavailable);

        let malformed = OutlookError::from(UpstreamError::MissingParameterBlock);
        assert_eq!(malformed.kind(), ErrorKind::UpstreamMalformed);
        assert_eq!(malformed.kind().status_code(), 502);
    }

    #[test]
    fn test_cache_failures_are_internal() {
        let error = OutlookError::from(CacheError::CacheRead(
            PathBuf::from("/tmp/x.bin"),
            std::io::Error::other("disk"),
        ));
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.kind().status_code(), 500);
    }
}
