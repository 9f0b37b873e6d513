//! # Error Handling Module
//!
//! This module provides comprehensive error handling for the content gateway
//! using the `thiserror` crate. It defines all error classes that can occur
//! while resolving a request or talking to the content API, and provides
//! proper HTTP status code mappings for client responses.
//!
//! The taxonomy matters for control flow, not just reporting:
//! - `is_retryable()` drives the transport client's retry loop — transient
//!   transport failures are retried, validation-class failures abort
//!   immediately.
//! - `NotFound` is a distinct typed condition so handlers can map it to a
//!   404 without string matching.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the gateway
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Comprehensive error types for the content gateway
///
/// Each variant represents a different category of failure. The
/// `#[error("...")]` attribute from `thiserror` implements `Display` with
/// the specified message.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Requested content path has no matching route
    #[error("content not found: {path} (site: {site})")]
    NotFound { path: String, site: String },

    /// Network-level failure talking to the content endpoint
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Non-2xx status from the content endpoint
    #[error("content API returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// Structurally valid response carrying a GraphQL error envelope
    #[error("GraphQL error: {message}")]
    GraphQl { message: String },

    /// Caller-supplied input is malformed (never retried)
    #[error("validation error for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Editing secret missing or mismatched
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// Disallowed cross-origin request
    #[error("origin not allowed: {origin}")]
    CorsRejected { origin: String },

    /// Invalid or incomplete configuration
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The caller-supplied deadline elapsed
    #[error("request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// JSON encoding/decoding failure at the wire boundary
    #[error("JSON error: {message}")]
    Json { message: String },

    /// The retry budget was exhausted; wraps the last attempt's error
    #[error("request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Create a not-found error for a content path
    pub fn not_found<S: Into<String>>(path: S, site: S) -> Self {
        Self::NotFound {
            path: path.into(),
            site: site.into(),
        }
    }

    /// Create a transport error with a custom message
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field
    pub fn validation<S: Into<String>>(field: S, reason: S) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an authentication error with a custom reason
    pub fn auth<S: Into<String>>(reason: S) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Transport { .. } => StatusCode::BAD_GATEWAY,
            Self::Http { .. } => StatusCode::BAD_GATEWAY,
            Self::GraphQl { .. } => StatusCode::BAD_GATEWAY,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::CorsRejected { .. } => StatusCode::FORBIDDEN,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Json { .. } => StatusCode::BAD_GATEWAY,
            Self::RetriesExhausted { source, .. } => source.status_code(),
        }
    }

    /// Check if this error should be retried
    ///
    /// Transient failures from the content endpoint (network errors, non-2xx
    /// statuses, GraphQL error envelopes, undecodable responses) are
    /// retryable. Validation-class and authentication failures are terminal,
    /// as is an elapsed caller deadline.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Http { .. } | Self::GraphQl { .. } | Self::Json { .. }
        )
    }

    /// Get a string representation of the error class for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Transport { .. } => "transport_error",
            Self::Http { .. } => "http_error",
            Self::GraphQl { .. } => "graphql_error",
            Self::Validation { .. } => "validation_error",
            Self::Authentication { .. } => "authentication_error",
            Self::CorsRejected { .. } => "cors_rejected",
            Self::Configuration { .. } => "configuration_error",
            Self::Timeout { .. } => "timeout",
            Self::Json { .. } => "json_error",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

/// Convert errors escaping the middleware chain into HTTP responses
///
/// 5xx-class errors deliberately carry a generic message so internal error
/// text never reaches production clients; the full error is logged at the
/// point of failure.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
                "type": self.error_type(),
            }
        });

        (status, Json(body)).into_response()
    }
}
