//! Wiring of store, OAuth client, lifecycle manager and bootstrap flow.

use std::sync::Arc;
use std::time::Duration;

use nowplaying_auth::{
    AuthConfig, AuthorizationFlow, OAuthClient, SpotifyOAuth, TokenLifecycleManager, TokenStore,
    open_store,
};
use nowplaying_core::Environment;
use nowplaying_spotify::SpotifyClient;
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// Everything a command needs. The store backend is chosen once, here.
pub struct App {
    environment: Environment,
    client_secret: String,
    timeout: Duration,
    store: Arc<dyn TokenStore>,
    lifecycle: TokenLifecycleManager,
    flow: AuthorizationFlow,
}

impl App {
    /// Builds the app from process environment variables.
    pub fn from_env() -> CliResult<Self> {
        let config =
            AuthConfig::from_env().map_err(|e| CliError::Config(e.message().to_string()))?;
        Self::from_config(config)
    }

    pub fn from_config(config: AuthConfig) -> CliResult<Self> {
        config
            .validate()
            .map_err(|e| CliError::Config(e.message().to_string()))?;
        let store = open_store(&config.store_backend())?;
        let oauth: Arc<dyn OAuthClient> = Arc::new(SpotifyOAuth::new(&config)?);
        Ok(Self::with_parts(&config, store, oauth))
    }

    /// Assembles the app from already-built parts.
    pub fn with_parts(
        config: &AuthConfig,
        store: Arc<dyn TokenStore>,
        oauth: Arc<dyn OAuthClient>,
    ) -> Self {
        info!(
            environment = %config.environment,
            backend = store.name(),
            "nowplaying ready"
        );
        Self {
            environment: config.environment,
            client_secret: config.client_secret.clone(),
            timeout: config.timeout,
            lifecycle: TokenLifecycleManager::new(store.clone(), oauth.clone()),
            flow: AuthorizationFlow::new(oauth, store.clone()),
            store,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn lifecycle(&self) -> &TokenLifecycleManager {
        &self.lifecycle
    }

    pub fn flow(&self) -> &AuthorizationFlow {
        &self.flow
    }

    /// Rejects callers without the shared secret. No-op in dev.
    pub fn check_access(&self, presented: Option<&str>) -> CliResult<()> {
        self.environment
            .validate_access_secret(presented, &self.client_secret)
            .map_err(CliError::from)
    }

    /// A Spotify client carrying a freshly validated access token.
    pub async fn music_client(&self) -> CliResult<SpotifyClient> {
        let token = self.lifecycle.access_token().await?;
        debug!("building spotify client");
        Ok(SpotifyClient::new(token, self.timeout)?)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("environment", &self.environment)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}
