//! Library operations built on [`MusicApi`].

use serde::Serialize;
use tracing::info;

use crate::api::MusicApi;
use crate::error::MusicResult;

/// Outcome of [`love_track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoveTrackResult {
    Success,
    AlreadyLoved,
}

impl LoveTrackResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyLoved => "already_loved",
        }
    }
}

/// Saves `track_id` to the library unless it is already there.
pub async fn love_track(api: &dyn MusicApi, track_id: &str) -> MusicResult<LoveTrackResult> {
    if api.is_track_saved(track_id).await? {
        info!(track_id, "track already in library");
        return Ok(LoveTrackResult::AlreadyLoved);
    }
    api.save_track(track_id).await?;
    info!(track_id, "saved track to library");
    Ok(LoveTrackResult::Success)
}
