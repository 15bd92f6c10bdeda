//! Error types for the credential lifecycle.
//!
//! Token stores never return these: they normalise their own failures to
//! `false` / `None`. Errors only come out of the lifecycle manager, the
//! OAuth client and the authorization bootstrap.

use std::fmt;
use thiserror::Error;

/// The category of an authorization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// No token record has ever been saved; the authorization flow must run first.
    NoCredentials,
    /// The provider rejected the refresh, or the refresh request failed in transit.
    RefreshFailed,
    /// Object storage could not be reached or refused the request.
    StorageUnavailable,
    /// The provider rejected the credentials or the authorization code.
    AuthenticationFailed,
    /// Connection failure, timeout, DNS resolution.
    Network,
    /// The provider answered with something we cannot decode.
    InvalidResponse,
    /// The caller passed an unusable argument.
    BadRequest,
    /// Missing or invalid configuration.
    Configuration,
    /// Unexpected state.
    Internal,
}

impl AuthErrorCode {
    /// Returns true if the failure is transient and the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::StorageUnavailable)
    }

    /// Returns true if the user has to go through the consent page again.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, Self::NoCredentials | Self::RefreshFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredentials => "no_credentials",
            Self::RefreshFailed => "refresh_failed",
            Self::StorageUnavailable => "storage_unavailable",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Network => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::BadRequest => "bad_request",
            Self::Configuration => "configuration_error",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while obtaining or minting credentials.
#[derive(Debug, Error)]
pub struct AuthError {
    code: AuthErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn no_credentials(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::NoCredentials, message)
    }

    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::RefreshFailed, message)
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::StorageUnavailable, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::AuthenticationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Network, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidResponse, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Configuration, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Internal, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn requires_reauthorization(&self) -> bool {
        self.code.requires_reauthorization()
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;
