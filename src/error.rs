//! Error types for Snippetropolis.

use thiserror::Error;

/// Library-level error type for Snippetropolis operations.
#[derive(Error, Debug)]
pub enum SnipError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call to the video understanding API failed.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Render error: {0}")]
    Render(#[from] askama::Error),
}

impl SnipError {
    /// Build an API error without an HTTP status (transport or decode failure).
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        SnipError::Api {
            operation,
            status: None,
            message: message.into(),
        }
    }

    /// True when the external service reported the entity as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnipError::Api { status: Some(404), .. })
    }
}

/// Result type alias for Snippetropolis operations.
pub type Result<T> = std::result::Result<T, SnipError>;
