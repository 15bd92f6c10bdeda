//! One-time interactive authorization.
//!
//! The user visits [`AuthorizationFlow::authorize_url`], approves access and
//! is redirected back with a `code`. [`AuthorizationFlow::handle_callback`]
//! exchanges that code and seeds the token store, after which
//! [`TokenLifecycleManager`](crate::TokenLifecycleManager) can take over.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::{AuthError, AuthResult};
use crate::oauth::OAuthClient;
use crate::record::TokenRecord;
use crate::store::TokenStore;

#[derive(Clone)]
pub struct AuthorizationFlow {
    oauth: Arc<dyn OAuthClient>,
    store: Arc<dyn TokenStore>,
}

impl AuthorizationFlow {
    pub fn new(oauth: Arc<dyn OAuthClient>, store: Arc<dyn TokenStore>) -> Self {
        Self { oauth, store }
    }

    pub fn authorize_url(&self) -> String {
        self.oauth.authorize_url()
    }

    /// Exchanges `code` and persists the resulting record.
    ///
    /// # Errors
    ///
    /// - `BadRequest` if `code` is empty. Nothing is sent to the provider.
    /// - Whatever the exchange returns if the provider rejects the code.
    /// - `StorageUnavailable` if the record could not be saved.
    pub async fn handle_callback(&self, code: &str) -> AuthResult<TokenRecord> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::bad_request("authorization callback is missing the code"));
        }

        let record = self.oauth.exchange_code(code).await?;

        if !self.store.save(&record).await {
            error!(backend = self.store.name(), "could not persist initial token record");
            return Err(AuthError::storage_unavailable(format!(
                "authorized, but the token could not be saved to the {} store",
                self.store.name()
            )));
        }

        info!(
            backend = self.store.name(),
            expires_at = %record.expires_at,
            "authorization complete"
        );
        Ok(record)
    }
}

impl std::fmt::Debug for AuthorizationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationFlow")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}
