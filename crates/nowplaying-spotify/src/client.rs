//! Spotify Web API client.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::BoxFuture;
use crate::api::MusicApi;
use crate::error::{MusicError, MusicResult};
use crate::track::Track;

/// Base URL for Spotify Web API v1.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// A client bound to one access token.
///
/// Tokens are short lived; build a new client from
/// `TokenLifecycleManager::access_token` for each unit of work.
#[derive(Debug)]
pub struct SpotifyClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: Url,
}

impl SpotifyClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> MusicResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MusicError::Network(format!("failed to create HTTP client: {e}")))?;

        Self::with_client(http_client, access_token, SPOTIFY_API_BASE)
    }

    pub fn with_client(
        http_client: reqwest::Client,
        access_token: impl Into<String>,
        base_url: &str,
    ) -> MusicResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MusicError::InvalidResponse(format!("invalid base URL {base_url}: {e}")))?;
        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url,
        })
    }

    /// `base_url` joined with `segments`, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends `request` and returns the body, or `None` for 204 / 404.
    async fn send(&self, request: reqwest::RequestBuilder) -> MusicResult<Option<String>> {
        let response = request.bearer_auth(&self.access_token).send().await.map_err(|e| {
            if e.is_timeout() {
                MusicError::Network("request timeout".to_string())
            } else if e.is_connect() {
                MusicError::Network(format!("connection failed: {e}"))
            } else {
                MusicError::Network(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        debug!(%status, url = %response.url(), "spotify response");

        match status {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED => return Err(MusicError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());
                return Err(MusicError::RateLimited { retry_after });
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| MusicError::Network(format!("failed to read response: {e}")))?;

        if status == StatusCode::FORBIDDEN {
            return Err(MusicError::Forbidden(body));
        }
        if !status.is_success() {
            return Err(MusicError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(Some(body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> MusicResult<Option<T>> {
        match self.send(self.http_client.get(url)).await? {
            Some(body) if !body.trim().is_empty() => parse(&body).map(Some),
            _ => Ok(None),
        }
    }

    pub async fn get_track(&self, track_id: &str) -> MusicResult<Option<Track>> {
        let track = self.get_json(self.endpoint(&["tracks", track_id])).await?;
        if track.is_none() {
            debug!(track_id, "track not found");
        }
        Ok(track)
    }

    /// The track playing right now, or `None` if nothing is playing or an
    /// episode/ad is playing.
    pub async fn currently_playing(&self) -> MusicResult<Option<Track>> {
        let playing: Option<CurrentlyPlaying> = self
            .get_json(self.endpoint(&["me", "player", "currently-playing"]))
            .await?;
        match playing {
            Some(CurrentlyPlaying {
                item: Some(item),
                currently_playing_type,
            }) if currently_playing_type.as_deref().unwrap_or("track") == "track" => {
                serde_json::from_value(item).map(Some).map_err(|e| {
                    MusicError::InvalidResponse(format!("failed to parse playing track: {e}"))
                })
            }
            Some(playing) => {
                debug!(kind = ?playing.currently_playing_type, "no track playing");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn contains_saved_track(&self, track_id: &str) -> MusicResult<bool> {
        let url = self.endpoint(&["me", "tracks", "contains"]);
        let request = self.http_client.get(url).query(&[("ids", track_id)]);
        let body = self
            .send(request)
            .await?
            .ok_or_else(|| MusicError::NotFound(format!("track {track_id}")))?;
        let saved: Vec<bool> = parse(&body)?;
        Ok(saved.first().copied().unwrap_or(false))
    }

    pub async fn save_tracks(&self, track_ids: &[&str]) -> MusicResult<()> {
        let url = self.endpoint(&["me", "tracks"]);
        let ids = track_ids.join(",");
        let request = self.http_client.put(url).query(&[("ids", ids.as_str())]);
        self.send(request).await?;
        debug!(count = track_ids.len(), "saved tracks to library");
        Ok(())
    }
}

impl MusicApi for SpotifyClient {
    fn track<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<Option<Track>>> {
        Box::pin(self.get_track(track_id))
    }

    fn now_playing(&self) -> BoxFuture<'_, MusicResult<Option<Track>>> {
        Box::pin(self.currently_playing())
    }

    fn is_track_saved<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<bool>> {
        Box::pin(self.contains_saved_track(track_id))
    }

    fn save_track<'a>(&'a self, track_id: &'a str) -> BoxFuture<'a, MusicResult<()>> {
        Box::pin(async move { self.save_tracks(&[track_id]).await })
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> MusicResult<T> {
    serde_json::from_str(body)
        .map_err(|e| MusicError::InvalidResponse(format!("failed to parse response: {e}")))
}

/// Body of `GET /me/player/currently-playing`.
#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    item: Option<serde_json::Value>,
    #[serde(default)]
    currently_playing_type: Option<String>,
}
