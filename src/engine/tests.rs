use super::*;
use crate::audio::AudioElement;
use crate::library::{Track, TrackMeta, sample_playlist};
use crate::mirror::MirrorResolution;
use crate::remote::MirroredSnapshot;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String, bool),
    Play,
    Pause,
    Seek(f64),
    Volume(f32),
    Stop,
}

#[derive(Default)]
struct FakeElement {
    calls: Vec<Call>,
}

impl AudioElement for FakeElement {
    fn load(&mut self, track: &Track, autoplay: bool) {
        self.calls.push(Call::Load(track.id.clone(), autoplay));
    }
    fn play(&mut self) {
        self.calls.push(Call::Play);
    }
    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }
    fn seek(&mut self, seconds: f64) {
        self.calls.push(Call::Seek(seconds));
    }
    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::Volume(volume));
    }
    fn stop(&mut self) {
        self.calls.push(Call::Stop);
    }
}

fn local(id: &str) -> Track {
    Track::local(
        TrackMeta {
            id: id.into(),
            title: format!("Song {id}"),
            duration: 120,
            ..TrackMeta::default()
        },
        format!("/api/audio/track/{id}"),
    )
    .unwrap()
}

fn snapshot(id: &str, position: u64, duration: u64, playing: bool) -> MirroredSnapshot {
    MirroredSnapshot {
        track: Track::mirrored(TrackMeta {
            id: id.into(),
            title: format!("Remote {id}"),
            artist: "Someone".into(),
            duration,
            ..TrackMeta::default()
        }),
        is_playing: playing,
        position_secs: position,
        duration_secs: duration,
    }
}

fn resolution(mirror_enabled: bool, pi_connected: bool) -> MirrorResolution {
    MirrorResolution {
        stay_local: true,
        mirror_enabled,
        pi_connected,
        enable_requested: !mirror_enabled,
        enable_error: None,
    }
}

fn engine_with(tracks: Vec<Track>) -> Reconciler<FakeElement> {
    let mut engine = Reconciler::new(Playlist::new(tracks), FakeElement::default(), 0.7);
    engine.mount();
    engine
}

fn local_engine(tracks: Vec<Track>) -> Reconciler<FakeElement> {
    let mut engine = engine_with(tracks);
    engine.handle(EngineEvent::MirrorResolved(resolution(true, false)));
    engine.handle(EngineEvent::TokenAcquired(true));
    engine.handle(EngineEvent::InitialTrack(None));
    assert_eq!(engine.state().authoritative(), Some(Authority::Local));
    engine
}

fn mirrored_engine() -> Reconciler<FakeElement> {
    let mut engine = engine_with(vec![local("a"), local("b"), local("c")]);
    engine.handle(EngineEvent::MirrorResolved(resolution(true, true)));
    engine.handle(EngineEvent::TokenAcquired(true));
    engine.handle(EngineEvent::InitialTrack(Some(snapshot("m1", 10, 100, true))));
    assert_eq!(engine.state().authoritative(), Some(Authority::Mirrored));
    engine
}

fn current_id(engine: &Reconciler<FakeElement>) -> Option<String> {
    engine.player().track.as_ref().map(|t| t.id.clone())
}

#[test]
fn mount_enters_resolving_and_shows_loading() {
    let mut engine = Reconciler::new(Playlist::default(), FakeElement::default(), 0.5);
    assert_eq!(engine.state(), &EngineState::Uninitialized);
    assert!(!engine.is_mounted());

    engine.mount();
    assert!(engine.is_mounted());
    assert!(engine.state().is_loading());
    assert!(!engine.state().mirror_resolved());
    assert!(!engine.state().wants_polling());

    engine.handle(EngineEvent::MirrorResolved(resolution(true, false)));
    assert!(engine.state().is_loading());
    assert!(engine.state().mirror_resolved());
}

#[test]
fn enable_then_token_failure_falls_back_to_first_sample() {
    let samples = sample_playlist();
    let mut engine = engine_with(samples.clone());

    engine.handle(EngineEvent::MirrorResolved(resolution(true, false)));
    assert!(matches!(
        engine.state(),
        EngineState::ResolvingMirror { .. }
    ));
    assert!(engine.state().mirror_enabled());

    engine.handle(EngineEvent::TokenAcquired(false));
    engine.handle(EngineEvent::InitialTrack(None));

    assert!(matches!(
        engine.state(),
        EngineState::LocalAuthoritative { .. }
    ));
    assert!(!engine.state().spotify_connected());
    assert!(!engine.state().wants_polling());
    assert_eq!(engine.player().track.as_ref(), Some(&samples[0]));
    assert!(!engine.player().is_playing);
    assert_eq!(engine.player().duration_secs, samples[0].duration as f64);
    assert!(
        engine
            .element()
            .calls
            .contains(&Call::Load(samples[0].id.clone(), false))
    );
}

#[test]
fn already_enabled_mirror_reports_pi_connected() {
    let mut engine = engine_with(sample_playlist());
    engine.handle(EngineEvent::MirrorResolved(resolution(true, true)));
    assert!(engine.state().pi_connected());
    assert!(engine.state().mirror_enabled());
}

#[test]
fn next_wraps_around_three_tracks() {
    let mut engine = local_engine(vec![local("A"), local("B"), local("C")]);
    engine.select_track("B");
    assert_eq!(current_id(&engine).as_deref(), Some("B"));

    engine.next();
    assert_eq!(current_id(&engine).as_deref(), Some("C"));
    engine.next();
    assert_eq!(current_id(&engine).as_deref(), Some("A"));
    engine.previous();
    assert_eq!(current_id(&engine).as_deref(), Some("C"));
}

#[test]
fn next_then_previous_returns_to_start_for_every_index() {
    for len in 2..6 {
        let tracks: Vec<Track> = (0..len).map(|i| local(&i.to_string())).collect();
        let mut engine = local_engine(tracks.clone());
        for start in &tracks {
            engine.select_track(&start.id);
            engine.next();
            assert_ne!(current_id(&engine), Some(start.id.clone()));
            engine.previous();
            assert_eq!(current_id(&engine), Some(start.id.clone()));

            engine.previous();
            engine.next();
            assert_eq!(current_id(&engine), Some(start.id.clone()));
        }
    }
}

#[test]
fn single_track_playlist_cannot_advance() {
    let mut engine = local_engine(vec![local("solo")]);
    let before = engine.player().clone();
    engine.next();
    engine.previous();
    assert_eq!(engine.player(), &before);
}

#[test]
fn selection_resets_position_and_keeps_play_intent() {
    let mut engine = local_engine(vec![local("a"), local("b")]);
    engine.play_pause();
    engine.handle(EngineEvent::TimeUpdate {
        position: 42.0,
        duration: 120.0,
    });
    engine.select_track("b");

    let player = engine.player();
    assert_eq!(player.position_secs, 0.0);
    assert!(player.is_playing);
    assert_eq!(
        engine.element().calls.last(),
        Some(&Call::Load("b".into(), true))
    );

    engine.select_track("missing");
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
}

#[test]
fn transport_is_inert_while_mirrored() {
    let mut engine = mirrored_engine();
    let before = engine.player().clone();
    let calls = engine.element().calls.len();

    engine.play_pause();
    engine.seek(30.0);
    engine.seek_by(10.0);
    engine.next();
    engine.previous();
    engine.select_track("a");

    assert_eq!(engine.player(), &before);
    assert_eq!(engine.element().calls.len(), calls);
    assert!(engine.view_mut().1.is_none());
}

#[test]
fn volume_in_range_is_exact_and_out_of_range_is_clamped() {
    let mut engine = local_engine(sample_playlist());
    for v in [0.0, 0.25, 0.5, 0.7, 1.0] {
        assert!(engine.set_volume(v));
        assert_eq!(engine.player().volume, v);
    }
    assert!(engine.set_volume(1.5));
    assert_eq!(engine.player().volume, 1.0);
    assert!(engine.set_volume(-0.2));
    assert_eq!(engine.player().volume, 0.0);

    assert!(!engine.set_volume(f32::NAN));
    assert_eq!(engine.player().volume, 0.0);
    assert_eq!(engine.element().calls.last(), Some(&Call::Volume(0.0)));
}

#[test]
fn volume_is_recorded_but_not_forwarded_while_mirrored() {
    let mut engine = mirrored_engine();
    let calls = engine.element().calls.len();
    assert!(engine.set_volume(0.3));
    assert_eq!(engine.player().volume, 0.3);
    assert_eq!(engine.element().calls.len(), calls);
}

#[test]
fn mirrored_mode_is_sticky() {
    let mut engine = mirrored_engine();
    let events = vec![
        EngineEvent::PollTick(Ok(None)),
        EngineEvent::PollTick(Err("timeout".into())),
        EngineEvent::InitialTrack(None),
        EngineEvent::TokenAcquired(false),
        EngineEvent::MirrorResolved(resolution(false, false)),
        EngineEvent::Ended,
        EngineEvent::LoadFailed("gone".into()),
        EngineEvent::TimeUpdate {
            position: 1.0,
            duration: 2.0,
        },
        EngineEvent::InitFailed("late".into()),
        EngineEvent::PollTick(Ok(Some(snapshot("m2", 0, 50, false)))),
    ];
    for event in events {
        engine.handle(event);
        assert_eq!(engine.state().authoritative(), Some(Authority::Mirrored));
    }
    assert_eq!(current_id(&engine).as_deref(), Some("m2"));
}

#[test]
fn poll_ticks_replace_the_track_wholesale_or_not_at_all() {
    let mut engine = mirrored_engine();
    let ticks = vec![
        Ok(Some(snapshot("x", 5, 100, true))),
        Err("boom".to_string()),
        Ok(Some(snapshot("y", 70, 180, false))),
        Ok(None),
        Ok(Some(snapshot("z", 1, 10, true))),
    ];
    for tick in ticks {
        let before = engine.player().clone();
        let expected = match &tick {
            Ok(Some(s)) => Some(PlayerState::mirrored(s.clone(), before.volume)),
            _ => None,
        };
        engine.handle(EngineEvent::PollTick(tick));
        match expected {
            Some(expected) => assert_eq!(engine.player(), &expected),
            None => assert_eq!(engine.player(), &before),
        }
    }
}

#[test]
fn relay_snapshot_sets_position_duration_and_play_flag() {
    let mut engine = engine_with(sample_playlist());
    engine.handle(EngineEvent::MirrorResolved(resolution(true, true)));
    engine.handle(EngineEvent::TokenAcquired(true));
    engine.handle(EngineEvent::InitialTrack(Some(snapshot("r", 45, 200, true))));

    let player = engine.player();
    assert_eq!(player.position_secs, 45.0);
    assert_eq!(player.duration_secs, 200.0);
    assert!(player.is_playing);
    assert!(player.is_mirrored());
    assert!(engine.state().wants_polling());
}

#[test]
fn poll_tick_promotes_local_to_mirrored_and_stops_audio() {
    let mut engine = local_engine(sample_playlist());
    assert!(engine.state().wants_polling());
    engine.play_pause();

    engine.handle(EngineEvent::PollTick(Ok(Some(snapshot("m", 3, 30, true)))));

    assert_eq!(engine.state().authoritative(), Some(Authority::Mirrored));
    assert_eq!(engine.element().calls.last(), Some(&Call::Stop));
    assert_eq!(current_id(&engine).as_deref(), Some("m"));
}

#[test]
fn time_updates_only_apply_to_local_playback() {
    let mut engine = local_engine(sample_playlist());
    engine.handle(EngineEvent::TimeUpdate {
        position: 12.5,
        duration: 233.9,
    });
    assert_eq!(engine.player().position_secs, 12.5);
    assert_eq!(engine.player().duration_secs, 233.9);

    // An unknown duration keeps the previous one.
    engine.handle(EngineEvent::TimeUpdate {
        position: 13.0,
        duration: 0.0,
    });
    assert_eq!(engine.player().duration_secs, 233.9);

    let mut mirrored = mirrored_engine();
    let before = mirrored.player().clone();
    mirrored.handle(EngineEvent::TimeUpdate {
        position: 99.0,
        duration: 300.0,
    });
    assert_eq!(mirrored.player(), &before);
}

#[test]
fn seek_is_clamped_to_the_track() {
    let mut engine = local_engine(vec![local("a"), local("b")]);
    engine.seek(500.0);
    assert_eq!(engine.player().position_secs, 120.0);
    engine.seek_by(-1000.0);
    assert_eq!(engine.player().position_secs, 0.0);
    engine.seek(f64::NAN);
    assert_eq!(engine.player().position_secs, 0.0);
    assert_eq!(engine.element().calls.last(), Some(&Call::Seek(0.0)));
}

#[test]
fn end_of_track_advances_and_keeps_playing() {
    let mut engine = local_engine(vec![local("a"), local("b")]);
    engine.play_pause();
    engine.handle(EngineEvent::Ended);
    assert_eq!(current_id(&engine).as_deref(), Some("b"));
    assert!(engine.player().is_playing);
    assert_eq!(
        engine.element().calls.last(),
        Some(&Call::Load("b".into(), true))
    );

    let mut solo = local_engine(vec![local("solo")]);
    solo.play_pause();
    solo.handle(EngineEvent::Ended);
    assert!(!solo.player().is_playing);
    assert_eq!(current_id(&solo).as_deref(), Some("solo"));
}

#[test]
fn drained_single_track_is_recued_and_plays_again() {
    let mut engine = local_engine(vec![local("solo")]);
    engine.play_pause();
    engine.handle(EngineEvent::TimeUpdate {
        position: 119.0,
        duration: 120.0,
    });
    engine.handle(EngineEvent::Ended);

    assert!(!engine.player().is_playing);
    assert_eq!(engine.player().position_secs, 0.0);
    assert_eq!(
        engine.element().calls.last(),
        Some(&Call::Load("solo".into(), false))
    );

    engine.play_pause();
    assert!(engine.player().is_playing);
    assert_eq!(engine.element().calls.last(), Some(&Call::Play));
    let loads = engine
        .element()
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Load(id, _) if id == "solo"))
        .count();
    assert_eq!(loads, 2);
}

#[test]
fn play_after_failed_load_reloads_the_track() {
    let mut engine = local_engine(vec![local("a"), local("b")]);
    engine.handle(EngineEvent::LoadFailed("404".into()));
    assert!(!engine.player().is_playing);

    engine.play_pause();
    assert!(engine.player().is_playing);
    assert_eq!(
        engine.element().calls.last(),
        Some(&Call::Load("a".into(), true))
    );

    engine.play_pause();
    assert!(!engine.player().is_playing);
    assert_eq!(engine.element().calls.last(), Some(&Call::Pause));
}

#[test]
fn play_pause_toggles_the_element() {
    let mut engine = local_engine(sample_playlist());
    engine.play_pause();
    assert!(engine.player().is_playing);
    engine.play_pause();
    assert!(!engine.player().is_playing);
    let calls = &engine.element().calls;
    assert_eq!(&calls[calls.len() - 2..], &[Call::Play, Call::Pause]);
}

#[test]
fn enable_failure_is_terminal() {
    let mut engine = engine_with(sample_playlist());
    engine.handle(EngineEvent::MirrorResolved(MirrorResolution {
        enable_error: Some("Error connecting to Pi".into()),
        ..resolution(false, false)
    }));
    assert_eq!(
        engine.state().error(),
        Some(&EngineError::MirrorEnable("Error connecting to Pi".into()))
    );

    engine.handle(EngineEvent::InitialTrack(None));
    engine.handle(EngineEvent::PollTick(Ok(Some(snapshot("m", 0, 1, true)))));
    assert!(engine.state().error().is_some());
    assert!(engine.player().track.is_none());
}

#[test]
fn empty_playlist_without_mirror_is_an_error() {
    let mut engine = engine_with(Vec::new());
    engine.handle(EngineEvent::MirrorResolved(resolution(true, false)));
    engine.handle(EngineEvent::InitialTrack(None));
    assert_eq!(
        engine.state().error(),
        Some(&EngineError::NoPlayableTrack)
    );
}

#[test]
fn init_failure_moves_to_error_only_while_loading() {
    let mut engine = engine_with(sample_playlist());
    engine.handle(EngineEvent::InitFailed("network".into()));
    assert!(matches!(engine.state().error(), Some(EngineError::Init(_))));

    let mut settled = local_engine(sample_playlist());
    settled.handle(EngineEvent::InitFailed("late".into()));
    assert_eq!(settled.state().authoritative(), Some(Authority::Local));
}

#[test]
fn events_after_unmount_are_dropped() {
    let mut engine = engine_with(sample_playlist());
    engine.unmount();
    assert_eq!(engine.element().calls, vec![Call::Stop]);

    engine.handle(EngineEvent::MirrorResolved(resolution(true, true)));
    engine.handle(EngineEvent::InitialTrack(Some(snapshot("m", 0, 1, true))));
    assert!(matches!(
        engine.state(),
        EngineState::ResolvingMirror { link: None, .. }
    ));
    assert!(engine.player().track.is_none());
    assert!(!engine.is_mounted());
}

#[test]
fn playlist_navigation_edges() {
    let playlist = Playlist::new(vec![local("a"), local("b"), local("c")]);
    assert_eq!(playlist.next_after(None).map(|t| t.id.as_str()), Some("a"));
    assert_eq!(
        playlist.previous_before(Some("zzz")).map(|t| t.id.as_str()),
        Some("c")
    );
    assert_eq!(
        playlist.previous_before(Some("a")).map(|t| t.id.as_str()),
        Some("c")
    );

    let mixed = Playlist::new(vec![local("a"), Track::mirrored(TrackMeta::default())]);
    assert_eq!(mixed.len(), 1);
    assert!(mixed.next_after(Some("a")).is_none());
}

#[test]
fn player_progress_handles_unknown_duration() {
    let mut player = PlayerState::idle(0.5);
    assert_eq!(player.progress(), 0.0);
    player.duration_secs = 200.0;
    player.position_secs = 50.0;
    assert_eq!(player.progress(), 0.25);
    player.position_secs = 500.0;
    assert_eq!(player.progress(), 1.0);
}
