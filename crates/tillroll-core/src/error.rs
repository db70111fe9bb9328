//! Error types for Tillroll

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The backend could not be reached (connection refused, DNS, timeout)
    #[error("Cannot connect to server: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The backend answered 401; the local session is no longer valid
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid response from server: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not logged in. Run `tillroll login` first")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the session must be discarded
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
