//! Error types for Smartcar client operations.

use thiserror::Error;

use smartcar_core::SmartcarApiError;

/// Result type alias for Smartcar client operations
pub type Result<T> = std::result::Result<T, SmartcarError>;

/// Errors that can occur during Smartcar client operations.
///
/// Transport failures ([`SmartcarError::Transport`]) mean no usable HTTP
/// response arrived and are kept distinct from [`SmartcarError::Api`],
/// which always wraps a response the API actually sent.
#[derive(Error, Debug)]
pub enum SmartcarError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied an invalid or missing argument; raised before any
    /// network call is made
    #[error("Invalid parameter value: {0}")]
    InvalidParameterValue(String),

    /// Required environment configuration is absent
    #[error("Environment variable {0} not found")]
    ConfigNotFound(String),

    /// The API answered with a non-2xx response
    #[error(transparent)]
    Api(Box<SmartcarApiError>),
}

impl From<SmartcarApiError> for SmartcarError {
    fn from(error: SmartcarApiError) -> Self {
        SmartcarError::Api(Box::new(error))
    }
}

impl SmartcarError {
    /// The structured API error, when this is an API-level failure.
    pub fn as_api(&self) -> Option<&SmartcarApiError> {
        match self {
            SmartcarError::Api(error) => Some(error),
            _ => None,
        }
    }
}
