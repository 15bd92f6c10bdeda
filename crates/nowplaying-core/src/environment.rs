//! Deployment environment detection.
//!
//! The `ENVIRONMENT` variable decides where tokens are persisted and whether
//! callers must present the shared access secret.

use std::fmt;

use thiserror::Error;

/// Name of the environment variable holding the deployment environment.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// The environment the process is deployed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Developer machine. Access-secret checks are skipped.
    Dev,
    /// Local run against real credentials, tokens on local disk.
    Local,
    /// Deployed service. Tokens live in object storage.
    #[default]
    Production,
}

/// Rejection of a caller's access secret.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessSecretError {
    /// No secret was presented.
    #[error("access secret is required")]
    Missing,
    /// The presented secret does not match.
    #[error("invalid access secret")]
    Mismatch,
}

impl Environment {
    /// Parses an `ENVIRONMENT` value. Unknown or absent values mean production.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("dev") => Self::Dev,
            Some("local") => Self::Local,
            _ => Self::Production,
        }
    }

    /// Reads the environment from the process environment.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Returns true when tokens should be kept on the local filesystem.
    pub fn uses_local_storage(&self) -> bool {
        matches!(self, Self::Dev | Self::Local)
    }

    /// Checks a caller-supplied secret against the expected one.
    ///
    /// Always succeeds in [`Environment::Dev`].
    pub fn validate_access_secret(
        &self,
        presented: Option<&str>,
        expected: &str,
    ) -> Result<(), AccessSecretError> {
        if self.is_dev() {
            return Ok(());
        }
        match presented {
            None => Err(AccessSecretError::Missing),
            Some(secret) if secret == expected => Ok(()),
            Some(_) => Err(AccessSecretError::Mismatch),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
