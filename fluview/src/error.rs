//! Error types.

use crate::endpoint::Endpoint;

#[derive(thiserror::Error, Debug)]
pub enum FluviewError {
    #[error("Invalid endpoint: {0}. Valid options are: {valid}", valid = Endpoint::valid_names())]
    InvalidEndpoint(String),
    #[error("start_week and end_week are required for endpoint {0}.")]
    MissingTimeRange(Endpoint),
    #[error("Missing required parameter: {parameter} for endpoint {endpoint}.")]
    MissingMainParameter {
        parameter: &'static str,
        endpoint: Endpoint,
    },
    #[error("Invalid epiweek '{0}': expected YYYYWW with a week between 01 and 53.")]
    InvalidEpiweek(String),
    #[error("Invalid time range: start week {start} is after end week {end}.")]
    InvalidTimeRange { start: String, end: String },
    #[error("Error fetching data from {endpoint}: {message}")]
    TransportFailure { endpoint: Endpoint, message: String },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Wrapped reqwest error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

pub type FluviewResult<T> = Result<T, FluviewError>;
