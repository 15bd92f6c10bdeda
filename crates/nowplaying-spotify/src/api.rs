//! The music service capability.

use crate::BoxFuture;
use crate::error::MusicResult;
use crate::track::Track;

/// Read and write access to one user's Spotify library.
///
/// Implemented by [`SpotifyClient`](crate::SpotifyClient); use cases take
/// `&dyn MusicApi` so they can run against a double in tests.
pub trait MusicApi: Send + Sync {
    /// Looks up a track. `None` if the ID is unknown.
    fn track<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<Option<Track>>>;

    /// The track currently playing. `None` if playback is idle.
    fn now_playing(&self) -> BoxFuture<'_, MusicResult<Option<Track>>>;

    fn is_track_saved<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<bool>>;

    /// Adds a track to the user's library.
    fn save_track<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<()>>;
}
