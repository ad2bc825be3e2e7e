use std::fmt;
use std::future::Future;

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::{BackendSettings, SpotifySettings};

use super::error::RemoteError;
use super::wire::{
    CredentialPush, CurrentSongResponse, EnableMirrorRequest, EnableMirrorResponse,
    FeaturedPlaylists, MirrorStatus, Page, PlaylistItem, SpotifyTrack, TokenResponse,
};

const STATUS_PATH: &str = "/api/pi/spotify-credentials/status";
const ENABLE_PATH: &str = "/api/pi/spotify-mirror";
const CURRENT_SONG_PATH: &str = "/api/spotify/current-song";
const CREDENTIALS_PATH: &str = "/api/pi/spotify-credentials";

/// Bearer credential obtained through the client-credential grant.
///
/// Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The backend that reports mirror status and relays the companion device.
pub trait MirrorBackend: Send + Sync + 'static {
    fn mirror_status(&self) -> impl Future<Output = Result<MirrorStatus, RemoteError>> + Send;

    fn enable_mirror(
        &self,
        request: &EnableMirrorRequest,
    ) -> impl Future<Output = Result<EnableMirrorResponse, RemoteError>> + Send;

    fn current_song(
        &self,
    ) -> impl Future<Output = Result<CurrentSongResponse, RemoteError>> + Send;

    fn push_credentials(
        &self,
        push: &CredentialPush,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// The third-party music catalog.
pub trait MusicCatalog: Send + Sync + 'static {
    fn request_token(&self) -> impl Future<Output = Result<Credential, RemoteError>> + Send;

    fn featured_playlist_id(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<Option<String>, RemoteError>> + Send;

    fn first_playlist_track(
        &self,
        credential: &Credential,
        playlist_id: &str,
    ) -> impl Future<Output = Result<Option<SpotifyTrack>, RemoteError>> + Send;

    /// Client id/secret forwarded to the companion device with the token.
    fn client_credentials(&self) -> (String, String);
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// HTTP implementation of [`MirrorBackend`], also used to fetch audio assets.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: Client, settings: &BackendSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a backend-relative path (e.g. `/api/audio/track/1`) to a full URL.
    /// Absolute `http(s)` URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Download an audio or cover asset.
    pub async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.client.get(self.resolve(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                endpoint: "asset",
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl MirrorBackend for HttpBackend {
    async fn mirror_status(&self) -> Result<MirrorStatus, RemoteError> {
        let response = self.client.get(self.resolve(STATUS_PATH)).send().await?;
        decode("mirror status", response).await
    }

    async fn enable_mirror(
        &self,
        request: &EnableMirrorRequest,
    ) -> Result<EnableMirrorResponse, RemoteError> {
        let response = self
            .client
            .post(self.resolve(ENABLE_PATH))
            .json(request)
            .send()
            .await?;
        // A refusal still carries a `{ success: false, error }` body.
        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<EnableMirrorResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(RemoteError::Status {
                endpoint: "mirror enable",
                status: status.as_u16(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn current_song(&self) -> Result<CurrentSongResponse, RemoteError> {
        let response = self
            .client
            .get(self.resolve(CURRENT_SONG_PATH))
            .send()
            .await?;
        decode("current song", response).await
    }

    async fn push_credentials(&self, push: &CredentialPush) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.resolve(CREDENTIALS_PATH))
            .json(push)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                endpoint: "credential push",
                status: status.as_u16(),
            })
        }
    }
}

/// HTTP implementation of [`MusicCatalog`] against the Spotify Web API.
#[derive(Clone)]
pub struct SpotifyCatalog {
    client: Client,
    settings: SpotifySettings,
}

impl SpotifyCatalog {
    pub fn new(client: Client, settings: &SpotifySettings) -> Self {
        Self {
            client,
            settings: settings.clone(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }
}

impl MusicCatalog for SpotifyCatalog {
    async fn request_token(&self) -> Result<Credential, RemoteError> {
        if self.settings.client_id.is_empty() || self.settings.client_secret.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let response = self
            .client
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: TokenResponse = decode("token", response).await?;
        Ok(Credential::new(token.access_token))
    }

    async fn featured_playlist_id(
        &self,
        credential: &Credential,
    ) -> Result<Option<String>, RemoteError> {
        let response = self
            .client
            .get(self.api("/browse/featured-playlists"))
            .query(&[("limit", "1")])
            .bearer_auth(credential.access_token())
            .send()
            .await?;
        let featured: FeaturedPlaylists = decode("featured playlists", response).await?;
        Ok(featured.playlists.items.into_iter().next().map(|p| p.id))
    }

    async fn first_playlist_track(
        &self,
        credential: &Credential,
        playlist_id: &str,
    ) -> Result<Option<SpotifyTrack>, RemoteError> {
        let response = self
            .client
            .get(self.api(&format!("/playlists/{playlist_id}/tracks")))
            .query(&[("limit", "1")])
            .bearer_auth(credential.access_token())
            .send()
            .await?;
        let page: Page<PlaylistItem> = decode("playlist tracks", response).await?;
        Ok(page.items.into_iter().next().and_then(|item| item.track))
    }

    fn client_credentials(&self) -> (String, String) {
        (
            self.settings.client_id.clone(),
            self.settings.client_secret.clone(),
        )
    }
}
