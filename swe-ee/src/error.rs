/// Error types for the Earth Engine client
use thiserror::Error;

/// Main error type for Earth Engine operations
#[derive(Error, Debug)]
pub enum EeError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// The service answered with an error status
    #[error("Earth Engine returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Credentials are missing, unreadable, or were refused
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Failed to read a credentials file
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to sign a service account assertion
    #[cfg(feature = "api")]
    #[error("Failed to sign service account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The interactive login flow could not be completed
    #[error("Interactive authentication failed: {0}")]
    InteractiveLogin(String),

    /// Failed to encode or decode JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response did not have the expected shape
    #[error("Unexpected response: {0}")]
    ResponseShape(String),

    /// A record in the response could not be converted
    #[error(transparent)]
    Data(#[from] swe_data::DataError),

    /// Session parameters are unusable
    #[error("Invalid session configuration: {0}")]
    InvalidSession(String),
}

/// Type alias for Results using EeError
pub type Result<T> = std::result::Result<T, EeError>;
