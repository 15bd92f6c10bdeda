//! CLI error types.

use nowplaying_auth::AuthError;
use nowplaying_core::AccessSecretError;
use nowplaying_spotify::MusicError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller did not present the right access secret.
    #[error("forbidden: {0}")]
    Forbidden(#[from] AccessSecretError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("spotify error: {0}")]
    Music(#[from] MusicError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// A follow-up instruction for the user, if there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Auth(e) if e.requires_reauthorization() => {
                Some("run `nowplaying auth url` and complete the authorization again")
            }
            Self::Music(MusicError::Unauthorized) => {
                Some("the access token was rejected; run `nowplaying token` to refresh it")
            }
            Self::Forbidden(_) => Some("set NOWPLAYING_ACCESS_SECRET or pass --access-secret"),
            _ => None,
        }
    }
}
