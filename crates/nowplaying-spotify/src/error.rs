//! Errors returned by the music API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MusicError {
    /// The access token was rejected (401).
    #[error("access token expired or invalid")]
    Unauthorized,

    /// The token lacks a scope the endpoint needs (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl MusicError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after
        .map(|s| format!(", retry after {s} seconds"))
        .unwrap_or_default()
}

pub type MusicResult<T> = Result<T, MusicError>;
