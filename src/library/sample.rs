use super::model::{Track, TrackMeta};

/// The fixed fallback playlist served by the backend's asset routes.
pub fn sample_playlist() -> Vec<Track> {
    [
        (
            "1",
            "Neon Dreams",
            "SynthWave Pro",
            "Digital Nights",
            234,
            "neon-dreams",
        ),
        (
            "2",
            "Electric Pulse",
            "CyberBeats",
            "Future Waves",
            198,
            "electric-pulse",
        ),
        (
            "3",
            "Party Lights",
            "Bass Master",
            "Club Hits",
            256,
            "party-lights",
        ),
    ]
    .into_iter()
    .filter_map(|(id, title, artist, album, duration, cover)| {
        Track::local(
            TrackMeta {
                id: id.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
                album: album.to_string(),
                duration,
                cover_url: format!("/api/covers/{cover}.jpg"),
            },
            format!("/api/audio/track/{id}"),
        )
    })
    .collect()
}
