use crate::config::TrackField;

use super::model::Track;

/// Format whole seconds as `m:ss`.
pub fn format_mmss(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Build the line shown under the title according to the configured `fields`.
///
/// Blank fields are skipped; an empty result falls back to the artist.
pub fn now_playing_line(track: &Track, fields: &[TrackField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        let part = match f {
            TrackField::Title => track.title.trim().to_string(),
            TrackField::Artist => track.artist.trim().to_string(),
            TrackField::Album => track.album.trim().to_string(),
            TrackField::Duration => {
                if track.duration == 0 {
                    String::new()
                } else {
                    format_mmss(track.duration as f64)
                }
            }
        };
        if !part.is_empty() {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        track.artist.clone()
    } else {
        parts.join(sep)
    }
}
