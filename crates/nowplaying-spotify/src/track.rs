//! Track model as returned by the Web API.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Album,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Track {
    pub fn artist_names(&self) -> Vec<&str> {
        self.artists.iter().map(|a| a.name.as_str()).collect()
    }

    /// `"Artist A, Artist B - Name"`
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.artist_names().join(", "), self.name)
    }

    pub fn spotify_url(&self) -> Option<&str> {
        self.external_urls.get("spotify").map(String::as_str)
    }

    /// The first (largest) album image.
    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }

    /// Album release date, if it is a full `YYYY-MM-DD` date.
    ///
    /// Albums with year or month precision return `None`.
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.album
            .release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            artists: self.artists.iter().map(|a| a.name.clone()).collect(),
            spotify_url: self.spotify_url().map(str::to_string),
            cover_url: self.cover_url().map(str::to_string),
            release_date: self.release_date().map(|d| d.to_string()),
        }
    }
}

/// The flattened view printed to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub spotify_url: Option<String>,
    pub cover_url: Option<String>,
    pub release_date: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const TRACK_JSON: &str = r#"{
        "album": {
            "id": "2noRn2Aes5aoNVsU6iWThc",
            "name": "Discovery",
            "release_date": "2001-03-12",
            "release_date_precision": "day",
            "images": [
                {"url": "https://i.scdn.co/image/large", "width": 640, "height": 640},
                {"url": "https://i.scdn.co/image/small", "width": 64, "height": 64}
            ]
        },
        "artists": [
            {"id": "4tZwfgrHOc3mvqYlEYSvVi", "name": "Daft Punk"},
            {"id": "0mc1MwS1Bz5twpBjKjp8qQ", "name": "Romanthony"}
        ],
        "available_markets": ["JP", "US"],
        "disc_number": 1,
        "duration_ms": 320357,
        "explicit": false,
        "external_ids": {"isrc": "GBDUW0000053"},
        "external_urls": {"spotify": "https://open.spotify.com/track/0DiWol3AO6WpXZgp0goxAV"},
        "href": "https://api.spotify.com/v1/tracks/0DiWol3AO6WpXZgp0goxAV",
        "id": "0DiWol3AO6WpXZgp0goxAV",
        "is_local": false,
        "name": "One More Time",
        "popularity": 77,
        "preview_url": null,
        "track_number": 1,
        "type": "track",
        "uri": "spotify:track:0DiWol3AO6WpXZgp0goxAV"
    }"#;
}
