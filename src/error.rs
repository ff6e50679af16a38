// src/error.rs

//! Unified error handling for the monitor.
//!
//! `AppError` covers failures that affect a whole run (configuration, store
//! writes). Per-page failures are `FetchError` values and never abort a run.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot store could not be persisted
    #[error("Failed to save snapshots to {path}: {message}")]
    StoreWrite { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a store write error with the target location.
    pub fn store_write(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StoreWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failure to turn raw page bytes into text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("page body is not valid UTF-8")]
    InvalidEncoding,

    #[error("no text content")]
    Empty,
}

/// Failure to fetch one monitored page.
///
/// Closed set: every outcome the fetcher can report maps to exactly one
/// variant, so reports can tell "unreachable" apart from "unparseable".
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// Request exceeded the per-request timeout
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String, transient: bool },

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Page was fetched but no usable text could be extracted
    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),
}

impl FetchError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::ConnectionFailed { transient, .. } => *transient,
            FetchError::HttpStatus(code) => *code == 429 || (500..=599).contains(code),
            FetchError::ExtractionFailed(_) => false,
        }
    }

    /// Short label used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::ConnectionFailed { .. } => "connection",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::ExtractionFailed(_) => "extraction",
        }
    }
}

impl From<ExtractError> for FetchError {
    fn from(err: ExtractError) -> Self {
        FetchError::ExtractionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(FetchError::HttpStatus(429).is_transient());
        assert!(FetchError::HttpStatus(500).is_transient());
        assert!(FetchError::HttpStatus(503).is_transient());
        assert!(!FetchError::HttpStatus(404).is_transient());
        assert!(!FetchError::HttpStatus(403).is_transient());
    }

    #[test]
    fn test_connection_failures_follow_flag() {
        let reset = FetchError::ConnectionFailed {
            reason: "connection reset".into(),
            transient: true,
        };
        let dns = FetchError::ConnectionFailed {
            reason: "dns error".into(),
            transient: false,
        };
        assert!(reset.is_transient());
        assert!(!dns.is_transient());
        assert!(FetchError::Timeout.is_transient());
    }

    #[test]
    fn test_extraction_is_distinct() {
        let err: FetchError = ExtractError::Empty.into();
        assert_eq!(err.kind(), "extraction");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "text extraction failed: no text content");
    }
}
