use std::io;
use thiserror::Error;

/// Unified error type for tchat
#[derive(Error, Debug)]
pub enum TchatError {
    /// No usable config file yet; the caller runs first-time setup
    #[error("Configuration not found")]
    ConfigNotFound,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// API errors reported by the chat server
    #[error("API error: {0}")]
    Api(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Line editor failures
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for TchatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TchatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            TchatError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            TchatError::Api(format!("API returned error status: {}", err))
        } else {
            TchatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for TchatError {
    fn from(err: serde_json::Error) -> Self {
        TchatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<rustyline::error::ReadlineError> for TchatError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        TchatError::Input(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TchatError>;
