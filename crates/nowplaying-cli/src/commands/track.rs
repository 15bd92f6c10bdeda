//! Token and track commands.

use nowplaying_spotify::{MusicApi, love_track};
use serde_json::json;

use crate::app::App;
use crate::error::CliResult;

/// A valid access token, refreshed if the stored one has expired.
pub async fn token(app: &App, access_secret: Option<&str>) -> CliResult<String> {
    app.check_access(access_secret)?;
    Ok(app.lifecycle().access_token().await?)
}

/// The track as pretty JSON, or `null` if it does not exist.
pub async fn show(app: &App, access_secret: Option<&str>, track_id: &str) -> CliResult<String> {
    app.check_access(access_secret)?;
    let client = app.music_client().await?;
    let track = client.track(track_id).await?;
    Ok(serde_json::to_string_pretty(&json!({
        "data": track.map(|t| t.summary())
    }))?)
}

/// The playing track as pretty JSON, or `null` if playback is idle.
pub async fn now_playing(app: &App, access_secret: Option<&str>) -> CliResult<String> {
    app.check_access(access_secret)?;
    let client = app.music_client().await?;
    let track = client.now_playing().await?;
    Ok(serde_json::to_string_pretty(&json!({
        "data": track.map(|t| json!({
            "title": t.display_title(),
            "track": t.summary(),
        }))
    }))?)
}

pub async fn love(app: &App, access_secret: Option<&str>, track_id: &str) -> CliResult<String> {
    app.check_access(access_secret)?;
    let client = app.music_client().await?;
    let result = love_track(&client, track_id).await?;
    Ok(serde_json::to_string_pretty(&json!({
        "data": { "result": result }
    }))?)
}
