use crate::library::{Track, TrackMeta};

use super::wire::SpotifyTrack;

/// A mirrored track together with the session's transport state.
#[derive(Debug, Clone, PartialEq)]
pub struct MirroredSnapshot {
    pub track: Track,
    pub is_playing: bool,
    pub position_secs: u64,
    pub duration_secs: u64,
}

/// Normalize a now-playing track reported by the companion device.
pub fn normalize_relay(track: &SpotifyTrack, default_cover: &str) -> MirroredSnapshot {
    MirroredSnapshot {
        track: Track::mirrored(track_meta(track, default_cover)),
        is_playing: track.is_playing,
        position_secs: track.progress_ms / 1000,
        duration_secs: track.duration_ms / 1000,
    }
}

/// Normalize a catalog track picked from featured content.
///
/// This is not the user's session, so the transport is reported as paused at
/// the start regardless of what the payload says.
pub fn normalize_featured(track: &SpotifyTrack, default_cover: &str) -> MirroredSnapshot {
    MirroredSnapshot {
        track: Track::mirrored(track_meta(track, default_cover)),
        is_playing: false,
        position_secs: 0,
        duration_secs: track.duration_ms / 1000,
    }
}

fn track_meta(track: &SpotifyTrack, default_cover: &str) -> TrackMeta {
    TrackMeta {
        id: track.id.clone(),
        title: track.name.clone(),
        artist: track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        album: track.album.name.clone(),
        duration: track.duration_ms / 1000,
        cover_url: track
            .album
            .images
            .first()
            .map(|i| i.url.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_cover.to_string()),
    }
}
