//! JSON contracts of the backend relay and the music catalog.

use serde::{Deserialize, Deserializer, Serialize};

/// `GET /api/pi/spotify-credentials/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MirrorStatus {
    pub success: bool,
    pub mirror_enabled: bool,
    pub credentials_sent: bool,
    pub credentials_expired: bool,
}

/// `POST /api/pi/spotify-mirror`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableMirrorRequest {
    pub mirror_enabled: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnableMirrorResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// `GET /api/spotify/current-song`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentSongResponse {
    pub success: bool,
    pub track: Option<SpotifyTrack>,
}

/// `POST /api/pi/spotify-credentials`
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPush {
    pub access_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<SpotifyArtist>,
    pub album: SpotifyAlbum,
    #[serde(deserialize_with = "whole_millis")]
    pub duration_ms: u64,
    pub is_playing: bool,
    #[serde(deserialize_with = "whole_millis")]
    pub progress_ms: u64,
}

/// Millisecond counts arrive as integers, floats or `null`; floored, with
/// `null` and negatives read as zero.
fn whole_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let ms = Option::<f64>::deserialize(deserializer)?;
    Ok(ms
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map_or(0, |ms| ms.floor() as u64))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpotifyAlbum {
    pub name: String,
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpotifyImage {
    pub url: String,
}

/// Client-credential grant response; only the bearer token is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// `GET /browse/featured-playlists?limit=1`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeaturedPlaylists {
    pub playlists: Page<PlaylistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
}

/// `GET /playlists/{id}/tracks?limit=1`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}
