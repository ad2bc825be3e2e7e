use super::model::TrackSource;
use super::*;
use crate::config::TrackField;

fn meta(id: &str) -> TrackMeta {
    TrackMeta {
        id: id.to_string(),
        title: "Song".to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        duration: 125,
        cover_url: String::new(),
    }
}

#[test]
fn local_tracks_require_a_source_url() {
    assert!(Track::local(meta("a"), "").is_none());
    assert!(Track::local(meta("a"), "   ").is_none());

    let t = Track::local(meta("a"), "/api/audio/track/1").unwrap();
    assert!(!t.is_mirrored());
    assert_eq!(t.source_url(), "/api/audio/track/1");
}

#[test]
fn mirrored_tracks_have_no_source_url() {
    let t = Track::mirrored(meta("m"));
    assert!(t.is_mirrored());
    assert_eq!(t.source_url(), "");
    assert_eq!(t.source(), &TrackSource::Mirrored);
}

#[test]
fn sample_playlist_is_three_local_tracks() {
    let tracks = sample_playlist();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0].title, "Neon Dreams");
    assert_eq!(tracks[0].source_url(), "/api/audio/track/1");
    assert_eq!(tracks[2].cover_url, "/api/covers/party-lights.jpg");
    assert!(tracks.iter().all(|t| !t.is_mirrored()));
}

#[test]
fn local_playlist_falls_back_to_samples_for_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    let settings = crate::config::LibrarySettings {
        dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert_eq!(local_playlist(&settings), sample_playlist());
}

#[test]
fn format_mmss_floors_and_pads() {
    assert_eq!(format_mmss(0.0), "0:00");
    assert_eq!(format_mmss(59.9), "0:59");
    assert_eq!(format_mmss(125.0), "2:05");
    assert_eq!(format_mmss(f64::NAN), "0:00");
}

#[test]
fn now_playing_line_joins_configured_fields() {
    let t = Track::local(meta("a"), "/x.mp3").unwrap();
    assert_eq!(
        now_playing_line(&t, &[TrackField::Artist, TrackField::Album], " • "),
        "Artist • Album"
    );
    assert_eq!(
        now_playing_line(&t, &[TrackField::Duration], " • "),
        "2:05"
    );

    let mut blank = t.clone();
    blank.album = "  ".to_string();
    assert_eq!(now_playing_line(&blank, &[TrackField::Album], " • "), "Artist");
}
