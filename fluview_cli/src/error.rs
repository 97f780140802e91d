use fluview::error::FluviewError;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum FluviewCliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("fluview error: {0}")]
    FluviewError(#[from] FluviewError),
    #[error("invalid config file: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type FluviewCliResult<T> = Result<T, FluviewCliError>;

impl FluviewCliError {
    /// Whether the error comes from writing to a pipe whose reader has gone away.
    pub fn is_broken_pipe(&self) -> bool {
        let io_error = match self {
            FluviewCliError::IOError(err) => Some(err),
            FluviewCliError::Anyhow(err) => err.downcast_ref::<std::io::Error>(),
            _ => None,
        };
        io_error.is_some_and(|err| err.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
