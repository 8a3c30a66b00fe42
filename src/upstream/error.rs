use crate::types::variable::Variable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode response body from {0}")]
    Decode(String, #[source] reqwest::Error),

    #[error("Response is missing 'properties.parameter'")]
    MissingParameterBlock,

    #[error("Series for {variable} is not a date-to-number mapping")]
    MalformedSeries { variable: String },

    #[error("Series for {variable} has an invalid date key '{key}'")]
    InvalidDateKey { variable: String, key: String },

    #[error("Response did not include requested variable {0}")]
    MissingVariable(Variable),

    /// Returned by sources that stand in for the real provider.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

impl UpstreamError {
    /// True for transport failures, false when the provider answered with an
    /// unexpected shape.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            UpstreamError::NetworkRequest(..)
                | UpstreamError::HttpStatus { .. }
                | UpstreamError::Unavailable(_)
        )
    }
}
