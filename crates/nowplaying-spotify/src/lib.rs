//! Spotify Web API access for the nowplaying backend.
//!
//! - [`MusicApi`] - capability trait the use cases depend on
//! - [`SpotifyClient`] - reqwest implementation bound to one access token
//! - [`Track`] - track model with display helpers
//! - [`love_track`] - save a track unless it is already in the library

use std::future::Future;
use std::pin::Pin;

pub mod api;
pub mod client;
pub mod error;
pub mod track;
pub mod usecase;

/// A boxed future that is Send, used for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use api::MusicApi;
pub use client::{SPOTIFY_API_BASE, SpotifyClient};
pub use error::{MusicError, MusicResult};
pub use track::{Album, Artist, Image, Track, TrackSummary};
pub use usecase::{LoveTrackResult, love_track};
