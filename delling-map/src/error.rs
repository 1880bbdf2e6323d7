use std::io;

use crate::config::ConfigFileError;

/// A convenience [`Result`] for the Delling map server.
pub type DellingResult<T> = Result<T, DellingError>;

/// Errors that stop the server from starting. Request handling never produces these.
#[derive(thiserror::Error, Debug)]
pub enum DellingError {
    #[error("Unable to bind to {1}: {0}")]
    BindingError(#[source] io::Error, String),

    #[error("Live-position upstream URL '{1}' is not valid: {0}")]
    InvalidUpstreamUrl(#[source] url::ParseError, String),

    #[error("Unable to create the live-position HTTP client: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error(transparent)]
    ConfigFileError(#[from] ConfigFileError),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
