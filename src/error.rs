//! Error types for the WeatherHub data-access layer

use thiserror::Error;

/// Main error type surfaced by the API clients.
///
/// Every fallible operation in the crate returns this type. The UI layer
/// only consumes `user_message()`; the variants exist so the retry logic
/// and tests can inspect what actually went wrong.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The provider answered with a non-2xx status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The request never produced a response (DNS, connect, timeout)
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// The provider answered 2xx but the payload was not what we expect
    #[error("Malformed provider response: {message}")]
    Malformed { message: String },

    /// Input validation errors (coordinates out of range etc.)
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl ApiError {
    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status code carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status } => Some(*status),
            ApiError::Network { source } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { status: 404 } => {
                "Location not found. Please check the coordinates or place name.".to_string()
            }
            ApiError::Http { .. } | ApiError::Network { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            ApiError::Malformed { .. } => {
                "The weather service returned unexpected data. Please try again later.".to_string()
            }
            ApiError::Validation { message } => format!("Invalid input: {message}"),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ApiError>;
