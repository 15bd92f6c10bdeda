//! OAuth token lifecycle for the Spotify backend.
//!
//! - [`TokenStore`] persists the single live [`TokenRecord`], on local disk
//!   ([`LocalTokenStore`]) or in object storage ([`ObjectTokenStore`])
//! - [`OAuthClient`] talks to the accounts service ([`SpotifyOAuth`])
//! - [`TokenLifecycleManager`] hands out access tokens, refreshing on read
//! - [`AuthorizationFlow`] runs the one-time interactive bootstrap
//!
//! # Flow
//!
//! ```text
//!  authorize_url ─► user consents ─► handle_callback(code)
//!                                          │ exchange_code
//!                                          ▼
//!                                   TokenStore::save
//!                                          │
//!  access_token() ─► TokenStore::load ─────┘
//!        │ expired?
//!        ├── no ──► access_token
//!        └── yes ─► OAuthClient::refresh ─► TokenStore::save ─► access_token
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nowplaying_auth::{AuthConfig, SpotifyOAuth, TokenLifecycleManager, open_store};
//!
//! let config = AuthConfig::from_env()?;
//! let store = open_store(&config.store_backend())?;
//! let oauth = Arc::new(SpotifyOAuth::new(&config)?);
//! let token = TokenLifecycleManager::new(store, oauth).access_token().await?;
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod oauth;
pub mod record;
pub mod store;

#[cfg(test)]
mod testing;

/// A boxed future that is Send, used for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export main types at crate root
pub use bootstrap::AuthorizationFlow;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AuthConfig;
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use lifecycle::TokenLifecycleManager;
pub use oauth::{OAuthClient, SpotifyOAuth};
pub use record::{ExpiresAt, TokenDocument, TokenRecord};
pub use store::{
    LocalTokenStore, ObjectTokenStore, StoreBackend, TOKEN_FILE_NAME, TokenStore, open_store,
};
