//! OAuth 2.0 authorization-code flow against the Spotify accounts service.
//!
//! The service is a confidential client: the consent URL carries no PKCE
//! challenge and token requests authenticate with the client secret over
//! HTTP basic auth.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::BoxFuture;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::record::{ExpiresAt, TokenDocument, TokenRecord};

/// Spotify accounts endpoints.
pub const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// The provider's authorization capability.
pub trait OAuthClient: Send + Sync {
    /// The consent page the user must visit.
    fn authorize_url(&self) -> String;

    /// Trades a one-time authorization code for the first token record.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>>;

    /// Mints a new record from a refresh token.
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>>;
}

/// [`OAuthClient`] for Spotify.
pub struct SpotifyOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    authorize_endpoint: String,
    token_endpoint: String,
    http_client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl SpotifyOAuth {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AuthError::configuration("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            authorize_endpoint: SPOTIFY_AUTHORIZE_URL.to_string(),
            token_endpoint: SPOTIFY_TOKEN_URL.to_string(),
            http_client,
            clock: Arc::new(SystemClock),
        })
    }

    /// Points the client at different accounts endpoints.
    pub fn with_endpoints(
        mut self,
        authorize_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        self.authorize_endpoint = authorize_endpoint.into();
        self.token_endpoint = token_endpoint.into();
        self
    }

    /// Replaces the HTTP client used for token requests.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Replaces the clock used to stamp `expires_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
        action: &str,
    ) -> AuthResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("{action} request timed out")
                } else {
                    format!("{action} request failed")
                };
                AuthError::network(message).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthError::network(format!("failed to read {action} response")).with_source(e)
        })?;

        if !status.is_success() {
            return Err(AuthError::authentication(format!(
                "{action} failed ({status}): {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            AuthError::invalid_response(format!("invalid {action} response")).with_source(e)
        })
    }
}

impl std::fmt::Debug for SpotifyOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyOAuth")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("token_endpoint", &self.token_endpoint)
            .finish_non_exhaustive()
    }
}

impl OAuthClient for SpotifyOAuth {
    fn authorize_url(&self) -> String {
        build_authorize_url(
            &self.authorize_endpoint,
            &self.client_id,
            &self.redirect_uri,
            &self.scopes,
        )
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>> {
        Box::pin(async move {
            let params = [
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ];
            let response = self.request_token(&params, "token exchange").await?;
            let record = response.into_record(self.clock.now().timestamp(), None)?;
            info!("obtained initial token pair");
            Ok(record)
        })
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, AuthResult<TokenRecord>> {
        Box::pin(async move {
            let params = [
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ];
            let response = self.request_token(&params, "token refresh").await?;
            let record = response.into_record(self.clock.now().timestamp(), Some(refresh_token))?;
            info!(expires_at = %record.expires_at, "refreshed access token");
            Ok(record)
        })
    }
}

/// Builds the consent URL. Scopes are joined with spaces.
pub fn build_authorize_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
) -> String {
    let scope = scopes.join(" ");
    match Url::parse_with_params(
        endpoint,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
        ],
    ) {
        Ok(url) => url.into(),
        Err(e) => {
            warn!(endpoint, error = %e, "authorize endpoint is not a valid URL");
            endpoint.to_string()
        }
    }
}

/// Body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(flatten)]
    extra: TokenDocument,
}

impl TokenResponse {
    /// Stamps `expires_at` relative to `issued_at`.
    ///
    /// `previous_refresh_token` is carried forward when the provider does not
    /// rotate it.
    fn into_record(
        self,
        issued_at: i64,
        previous_refresh_token: Option<&str>,
    ) -> AuthResult<TokenRecord> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string))
            .ok_or_else(|| AuthError::invalid_response("token response has no refresh_token"))?;

        let mut extra = self.extra;
        for key in TokenRecord::REQUIRED_FIELDS {
            extra.remove(key);
        }
        extra.insert("expires_in".to_string(), Value::from(self.expires_in));

        Ok(TokenRecord {
            access_token: self.access_token,
            refresh_token,
            expires_at: ExpiresAt::from_secs(issued_at.saturating_add(self.expires_in)),
            extra,
        })
    }
}
