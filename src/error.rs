//! Error types for gql-harvest
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for gql-harvest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No token found in '{path}'")]
    MissingToken { path: String },

    #[error("Cannot find query document: {name}")]
    QueryNotFound { name: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Extraction Errors
    // ============================================================================
    #[error("Cannot resolve segment '{segment}' in {reached}")]
    PathNotFound { segment: String, reached: String },

    #[error("Unexpected value at '{path}': {message}")]
    Extraction { path: String, message: String },

    // ============================================================================
    // Cursor Tree Errors
    // ============================================================================
    #[error("Cursor tree error: {message}")]
    CursorTree { message: String },

    #[error("Duplicate cursor variable '{variable}' in tree")]
    DuplicateVariable { variable: String },

    // ============================================================================
    // Query / Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Query rejected by server: {message}")]
    Query { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Collector / State Errors
    // ============================================================================
    #[error("Collector error: {message}")]
    Collector { message: String },

    #[error("State error: {message}")]
    State { message: String },

    #[error("Sink error: {message}")]
    Sink { message: String },

    // ============================================================================
    // I/O and Generic Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a path-not-found error naming the failing segment and the
    /// partially-reached content
    pub fn path_not_found(segment: impl Into<String>, reached: &serde_json::Value) -> Self {
        Self::PathNotFound {
            segment: segment.into(),
            reached: truncate_for_display(reached),
        }
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a cursor tree error
    pub fn cursor_tree(message: impl Into<String>) -> Self {
        Self::CursorTree {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a query rejection error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a collector error
    pub fn collector(message: impl Into<String>) -> Self {
        Self::Collector {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Check whether this error indicates a response-shape mismatch
    pub fn is_extraction(&self) -> bool {
        matches!(self, Error::PathNotFound { .. } | Error::Extraction { .. })
    }
}

/// Render a JSON value for an error message, keeping it short
fn truncate_for_display(value: &serde_json::Value) -> String {
    const MAX: usize = 200;
    let rendered = value.to_string();
    if rendered.len() > MAX {
        let mut shortened: String = rendered.chars().take(MAX).collect();
        shortened.push_str("...");
        return shortened;
    }
    rendered
}

/// Result type alias for gql-harvest
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::query("rate limited");
        assert_eq!(err.to_string(), "Query rejected by server: rate limited");
    }

    #[test]
    fn test_path_not_found_names_segment_and_content() {
        let err = Error::path_not_found("pageInfo", &json!({"nodes": []}));
        let rendered = err.to_string();
        assert!(rendered.contains("pageInfo"));
        assert!(rendered.contains("nodes"));
    }

    #[test]
    fn test_path_not_found_truncates_large_content() {
        let big = json!(vec!["x"; 500]);
        let err = Error::path_not_found("edges", &big);
        assert!(err.to_string().len() < 300);
    }

    #[test]
    fn test_is_extraction() {
        assert!(Error::path_not_found("a", &json!({})).is_extraction());
        assert!(Error::extraction("a/b", "not a string").is_extraction());
        assert!(!Error::config("nope").is_extraction());
    }
}
