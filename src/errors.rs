//! Centralized error handling.
//!
//! Provides a unified error type for the whole crate. The GitHub API
//! client is the only place that constructs the HTTP-derived variants;
//! everything above it propagates them unchanged.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Application error types.
///
/// `Clone` is required because the query cache keeps the latest failure
/// per key and lane snapshots replay it to every subscriber.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// HTTP 403: the GitHub rate limit was exhausted. Carries the reset
    /// time from the `x-ratelimit-reset` header when the API sent one.
    #[error("GitHub API rate limit exceeded.{}", reset_hint(reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// HTTP 404: the requested resource does not exist.
    #[error("{resource} not found.")]
    NotFound { resource: String },

    /// HTTP 401: the configured token was rejected.
    #[error("Authentication failed. Please check your GitHub token.")]
    Unauthorized,

    /// Transport-level failure or an unexpected status code. No raw
    /// `reqwest` error ever crosses this boundary.
    #[error("{0} Please check your connection and try again.")]
    Connectivity(String),

    /// Invalid caller input (e.g. an empty username).
    #[error("{0}")]
    Validation(String),
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        AppError::Connectivity(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

/// Human-readable retry hint for rate-limit errors.
fn reset_hint(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(" Try again after {}.", at.format("%H:%M:%S UTC")),
        None => " Please try again later.".to_string(),
    }
}
