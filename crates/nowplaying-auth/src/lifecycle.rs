//! Refresh-on-read access token management.
//!
//! There is no background refresher: every call to
//! [`TokenLifecycleManager::access_token`] loads the stored record, compares
//! its expiry with the current time and refreshes it if needed. The refreshed
//! record is persisted before the token is handed out so that later calls
//! (in this process or another one) pick it up instead of refreshing again.
//!
//! Two concurrent callers that both observe an expired record will both
//! refresh and both save. The last save wins; either record is valid.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, AuthResult};
use crate::oauth::OAuthClient;
use crate::store::TokenStore;

/// Hands out a usable access token, refreshing the stored record when it
/// has expired.
#[derive(Clone)]
pub struct TokenLifecycleManager {
    store: Arc<dyn TokenStore>,
    oauth: Arc<dyn OAuthClient>,
    clock: Arc<dyn Clock>,
}

impl TokenLifecycleManager {
    pub fn new(store: Arc<dyn TokenStore>, oauth: Arc<dyn OAuthClient>) -> Self {
        Self {
            store,
            oauth,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns an access token that has not expired.
    ///
    /// # Errors
    ///
    /// - `NoCredentials` if nothing was ever stored. No refresh is attempted.
    /// - `RefreshFailed` if the stored token expired and the provider would
    ///   not mint a new one. Not retried.
    pub async fn access_token(&self) -> AuthResult<String> {
        let record = self.store.load().await.ok_or_else(|| {
            AuthError::no_credentials(format!(
                "no token record in {} store; run the authorization flow first",
                self.store.name()
            ))
        })?;

        let now = self.clock.now();
        if !record.is_expired_at(now) {
            debug!(expires_at = %record.expires_at, "stored access token still valid");
            return Ok(record.access_token);
        }

        info!(
            expires_at = %record.expires_at,
            now = now.timestamp(),
            "access token expired, refreshing"
        );
        let refreshed = self
            .oauth
            .refresh(&record.refresh_token)
            .await
            .map_err(|e| AuthError::refresh_failed("could not refresh access token").with_source(e))?;

        if !self.store.save(&refreshed).await {
            warn!(
                backend = self.store.name(),
                "refreshed token could not be persisted; the next call will refresh again"
            );
        }

        Ok(refreshed.access_token)
    }
}

impl std::fmt::Debug for TokenLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycleManager")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}
