//! Configuration for the credential subsystem.

use std::path::PathBuf;
use std::time::Duration;

use nowplaying_core::Environment;

use crate::error::{AuthError, AuthResult};
use crate::store::{LocalTokenStore, StoreBackend, TOKEN_FILE_NAME};

/// Everything needed to talk to the accounts service and persist tokens.
#[derive(Clone)]
pub struct AuthConfig {
    /// Where the process runs. Decides the store backend and the default
    /// redirect URI.
    pub environment: Environment,

    /// OAuth client ID from the Spotify developer dashboard.
    pub client_id: String,

    /// OAuth client secret. Also the shared secret callers present.
    pub client_secret: String,

    /// Callback URL registered with the provider.
    pub redirect_uri: String,

    /// Scopes requested on the consent page.
    pub scopes: Vec<String>,

    /// Local token file. Defaults to `<temp dir>/token_info.json`.
    pub token_path: PathBuf,

    /// Bucket holding the token object outside dev/local.
    pub token_bucket: String,

    /// Object key of the token record.
    pub token_object_key: String,

    /// Timeout for each request to the accounts service.
    pub timeout: Duration,

    pub user_agent: String,
}

impl AuthConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Redirect URI used in `dev` when none is configured.
    pub const DEV_REDIRECT_URI: &'static str = "http://localhost:10120/authorize_callback";

    pub const DEFAULT_BUCKET: &'static str = "nowplaying-tokens";

    pub const DEFAULT_SCOPES: &'static [&'static str] = &[
        "user-library-read",
        "user-library-modify",
        "user-top-read",
        "user-read-currently-playing",
    ];

    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            environment: Environment::default(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: Self::DEV_REDIRECT_URI.to_string(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_path: LocalTokenStore::default_path(),
            token_bucket: Self::DEFAULT_BUCKET.to_string(),
            token_object_key: TOKEN_FILE_NAME.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("nowplaying/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Reads the configuration from process environment variables.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `ENVIRONMENT` | `production` |
    /// | `SPOTIFY_CLIENT_ID` | required |
    /// | `SPOTIFY_CLIENT_SECRET` | required |
    /// | `SPOTIFY_REDIRECT_URI` | localhost callback in `dev`, required otherwise |
    /// | `SPOTIFY_SCOPES` | [`AuthConfig::DEFAULT_SCOPES`] |
    /// | `TOKEN_FILE` | `<temp dir>/token_info.json` |
    /// | `TOKEN_BUCKET` | [`AuthConfig::DEFAULT_BUCKET`] |
    /// | `TOKEN_OBJECT_KEY` | `token_info.json` |
    /// | `HTTP_TIMEOUT_SECS` | 30 |
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| AuthError::configuration(format!("{key} is required")))
        };

        let environment = Environment::parse(get("ENVIRONMENT").as_deref());
        let mut config = Self::new(require("SPOTIFY_CLIENT_ID")?, require("SPOTIFY_CLIENT_SECRET")?)
            .with_environment(environment);

        config.redirect_uri = match get("SPOTIFY_REDIRECT_URI") {
            Some(uri) => uri,
            None if environment.is_dev() => Self::DEV_REDIRECT_URI.to_string(),
            None => require("SPOTIFY_REDIRECT_URI")?,
        };
        if let Some(scopes) = get("SPOTIFY_SCOPES") {
            config.scopes = parse_scopes(&scopes);
        }
        if let Some(path) = get("TOKEN_FILE") {
            config.token_path = PathBuf::from(path);
        }
        if let Some(bucket) = get("TOKEN_BUCKET") {
            config.token_bucket = bucket;
        }
        if let Some(key) = get("TOKEN_OBJECT_KEY") {
            config.token_object_key = key;
        }
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                AuthError::configuration(format!("HTTP_TIMEOUT_SECS is not a number: {secs}"))
                    .with_source(e)
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_token_object(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.token_bucket = bucket.into();
        self.token_object_key = key.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The store backend for this environment: local disk in `dev`/`local`,
    /// object storage everywhere else.
    pub fn store_backend(&self) -> StoreBackend {
        if self.environment.uses_local_storage() {
            StoreBackend::Local {
                path: self.token_path.clone(),
            }
        } else {
            StoreBackend::Object {
                bucket: self.token_bucket.clone(),
                key: self.token_object_key.clone(),
            }
        }
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::configuration("client_id is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AuthError::configuration("client_secret is required"));
        }
        url::Url::parse(&self.redirect_uri).map_err(|e| {
            AuthError::configuration(format!("redirect_uri is not a URL: {}", self.redirect_uri))
                .with_source(e)
        })?;
        if self.scopes.is_empty() {
            return Err(AuthError::configuration("at least one scope is required"));
        }
        if self.timeout.is_zero() {
            return Err(AuthError::configuration("timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("environment", &self.environment)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("token_path", &self.token_path)
            .field("token_bucket", &self.token_bucket)
            .field("token_object_key", &self.token_object_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Splits a scope list on commas and whitespace.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
