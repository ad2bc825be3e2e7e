//! Track model and playlist sources.
//!
//! Local playlists come either from the built-in sample set served by the
//! backend or from a scanned music directory.

mod display;
mod model;
mod sample;
mod scan;

pub use display::{format_mmss, now_playing_line};
pub use model::{Track, TrackMeta};
pub use sample::sample_playlist;
pub use scan::scan;

use crate::config::LibrarySettings;

/// Build the local fallback playlist: the scanned directory when configured
/// and non-empty, the sample playlist otherwise.
pub fn local_playlist(settings: &LibrarySettings) -> Vec<Track> {
    if let Some(dir) = &settings.dir {
        let tracks = scan(dir, settings);
        if !tracks.is_empty() {
            tracing::info!(dir = %dir.display(), count = tracks.len(), "using scanned playlist");
            return tracks;
        }
        tracing::warn!(dir = %dir.display(), "no audio files found, using sample playlist");
    }
    sample_playlist()
}

#[cfg(test)]
mod tests;
