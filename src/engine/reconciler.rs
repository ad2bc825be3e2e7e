use tracing::{debug, info, warn};

use crate::audio::AudioElement;
use crate::library::Track;
use crate::mirror::MirrorResolution;
use crate::remote::MirroredSnapshot;

use super::playlist::Playlist;
use super::state::{Authority, EngineError, EngineState, MirrorLink, PlayerState};

/// Inputs the engine reacts to, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MirrorResolved(MirrorResolution),
    /// Whether the client-credential grant succeeded.
    TokenAcquired(bool),
    /// The first lookup after the token request; `None` falls back to local.
    InitialTrack(Option<MirroredSnapshot>),
    /// A poll tick. Errors are carried as text and never change state.
    PollTick(Result<Option<MirroredSnapshot>, String>),
    TimeUpdate { position: f64, duration: f64 },
    Ended,
    LoadFailed(String),
    InitFailed(String),
}

/// Borrowed view of everything the screen draws from.
#[derive(Debug, Clone, Copy)]
pub struct EngineView<'a> {
    pub state: &'a EngineState,
    pub player: &'a PlayerState,
    pub playlist: &'a Playlist,
}

/// The playback mode state machine plus the local transport.
///
/// Owns the local audio element; every update replaces [`PlayerState`] as a
/// whole.
pub struct Reconciler<E> {
    state: EngineState,
    player: PlayerState,
    playlist: Playlist,
    element: E,
    /// The element holds no media since the last load failed.
    load_failed: bool,
    unmounted: bool,
}

impl<E: AudioElement> Reconciler<E> {
    pub fn new(playlist: Playlist, element: E, volume: f32) -> Self {
        Self {
            state: EngineState::Uninitialized,
            player: PlayerState::idle(clamp_volume(volume).unwrap_or(1.0)),
            playlist,
            element,
            load_failed: false,
            unmounted: false,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// The drawable state alongside the authoritative local element.
    pub fn view_mut(&mut self) -> (EngineView<'_>, Option<&mut E>) {
        let local = self.is_local();
        let view = EngineView {
            state: &self.state,
            player: &self.player,
            playlist: &self.playlist,
        };
        (view, local.then_some(&mut self.element))
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmounted && self.state != EngineState::Uninitialized
    }

    pub fn mount(&mut self) {
        if self.unmounted || self.state != EngineState::Uninitialized {
            return;
        }
        self.transition(EngineState::ResolvingMirror {
            link: None,
            spotify_connected: false,
        });
    }

    /// Stop local audio and ignore everything that arrives afterwards.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.unmounted = true;
        self.element.stop();
        info!(state = self.state.name(), "engine unmounted");
    }

    pub fn handle(&mut self, event: EngineEvent) {
        if self.unmounted {
            debug!(?event, "event after unmount dropped");
            return;
        }
        match event {
            EngineEvent::MirrorResolved(resolution) => self.on_mirror_resolved(resolution),
            EngineEvent::TokenAcquired(ok) => {
                if let EngineState::ResolvingMirror { link, .. } = self.state {
                    self.state = EngineState::ResolvingMirror {
                        link,
                        spotify_connected: ok,
                    };
                }
            }
            EngineEvent::InitialTrack(snapshot) => self.on_initial_track(snapshot),
            EngineEvent::PollTick(tick) => self.on_poll_tick(tick),
            EngineEvent::TimeUpdate { position, duration } => {
                if self.is_local() && self.player.track.is_some() {
                    let duration_secs = if duration > 0.0 && duration.is_finite() {
                        duration
                    } else {
                        self.player.duration_secs
                    };
                    self.player = PlayerState {
                        position_secs: position.max(0.0),
                        duration_secs,
                        ..self.player.clone()
                    };
                }
            }
            EngineEvent::Ended => {
                if self.is_local() && !self.advance(true) {
                    // Nothing to advance to: rewind the drained track, paused.
                    if let Some(track) = self.player.track.clone() {
                        self.cue(track, false);
                    }
                }
            }
            EngineEvent::LoadFailed(error) => {
                if self.is_local() {
                    warn!(%error, "local track unavailable");
                    self.load_failed = true;
                    self.player = PlayerState {
                        is_playing: false,
                        ..self.player.clone()
                    };
                }
            }
            EngineEvent::InitFailed(error) => {
                if self.state.is_loading() {
                    self.transition(EngineState::Error(EngineError::Init(error)));
                }
            }
        }
    }

    fn on_mirror_resolved(&mut self, resolution: MirrorResolution) {
        let EngineState::ResolvingMirror {
            spotify_connected, ..
        } = self.state
        else {
            return;
        };
        if let Some(message) = resolution.enable_error {
            self.transition(EngineState::Error(EngineError::MirrorEnable(message)));
            return;
        }
        self.state = EngineState::ResolvingMirror {
            link: Some(MirrorLink {
                enabled: resolution.mirror_enabled,
                pi_connected: resolution.pi_connected,
            }),
            spotify_connected,
        };
        info!(
            mirror_enabled = resolution.mirror_enabled,
            pi_connected = resolution.pi_connected,
            "mirror status resolved"
        );
    }

    fn on_initial_track(&mut self, snapshot: Option<MirroredSnapshot>) {
        let EngineState::ResolvingMirror {
            link,
            spotify_connected,
        } = self.state
        else {
            return;
        };
        let link = link.unwrap_or_default();
        match snapshot {
            Some(snapshot) => self.enter_mirrored(link, snapshot),
            None => {
                let Some(first) = self.playlist.first().cloned() else {
                    self.transition(EngineState::Error(EngineError::NoPlayableTrack));
                    return;
                };
                self.transition(EngineState::LocalAuthoritative {
                    link,
                    spotify_connected,
                });
                self.element.set_volume(self.player.volume);
                self.cue(first, false);
            }
        }
    }

    fn on_poll_tick(&mut self, tick: Result<Option<MirroredSnapshot>, String>) {
        let snapshot = match tick {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("poll tick found nothing, keeping current state");
                return;
            }
            Err(error) => {
                warn!(%error, "poll tick failed, keeping current state");
                return;
            }
        };
        match self.state {
            EngineState::MirroredAuthoritative { .. } => {
                self.player = PlayerState::mirrored(snapshot, self.player.volume);
            }
            EngineState::LocalAuthoritative { link, .. } => {
                self.element.stop();
                self.enter_mirrored(link, snapshot);
            }
            _ => {}
        }
    }

    fn enter_mirrored(&mut self, link: MirrorLink, snapshot: MirroredSnapshot) {
        info!(track = %snapshot.track, "mirroring remote session");
        self.transition(EngineState::MirroredAuthoritative { link });
        self.player = PlayerState::mirrored(snapshot, self.player.volume);
    }

    fn transition(&mut self, next: EngineState) {
        info!(from = self.state.name(), to = next.name(), "engine transition");
        if let EngineState::Error(error) = &next {
            warn!(%error, "engine entered error state");
        }
        self.state = next;
    }

    fn is_local(&self) -> bool {
        !self.unmounted && self.state.authoritative() == Some(Authority::Local)
    }

    /// Local transport is inert unless a local track is authoritative.
    fn controllable(&self) -> bool {
        self.is_local() && self.player.track.as_ref().is_some_and(|t| !t.is_mirrored())
    }

    fn cue(&mut self, track: Track, autoplay: bool) {
        self.load_failed = false;
        self.element.load(&track, autoplay);
        self.player = PlayerState::cued(track, autoplay, self.player.volume);
    }

    fn advance(&mut self, forward: bool) -> bool {
        let current = self.player.track.as_ref().map(|t| t.id.as_str());
        let target = if forward {
            self.playlist.next_after(current)
        } else {
            self.playlist.previous_before(current)
        };
        let Some(target) = target.cloned() else {
            return false;
        };
        let autoplay = self.player.is_playing;
        self.cue(target, autoplay);
        true
    }

    pub fn play_pause(&mut self) {
        if !self.controllable() {
            return;
        }
        let is_playing = !self.player.is_playing;
        if is_playing && self.load_failed {
            if let Some(track) = self.player.track.clone() {
                debug!(track = %track, "retrying failed load");
                self.cue(track, true);
                return;
            }
        }
        if is_playing {
            self.element.play();
        } else {
            self.element.pause();
        }
        self.player = PlayerState {
            is_playing,
            ..self.player.clone()
        };
    }

    /// Absolute seek, clamped to the known duration.
    pub fn seek(&mut self, seconds: f64) {
        if !self.controllable() || seconds.is_nan() {
            return;
        }
        let mut target = seconds.max(0.0);
        if self.player.duration_secs > 0.0 {
            target = target.min(self.player.duration_secs);
        }
        self.element.seek(target);
        self.player = PlayerState {
            position_secs: target,
            ..self.player.clone()
        };
    }

    pub fn seek_by(&mut self, delta: f64) {
        self.seek(self.player.position_secs + delta);
    }

    /// Values are clamped into `[0, 1]`; NaN is rejected. Returns whether the
    /// volume was recorded.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        let Some(volume) = clamp_volume(volume) else {
            return false;
        };
        if self.is_local() {
            self.element.set_volume(volume);
        }
        self.player = PlayerState {
            volume,
            ..self.player.clone()
        };
        true
    }

    pub fn next(&mut self) {
        if self.controllable() {
            self.advance(true);
        }
    }

    pub fn previous(&mut self) {
        if self.controllable() {
            self.advance(false);
        }
    }

    /// Cue the playlist entry `id` at its start, keeping the play/pause intent.
    pub fn select_track(&mut self, id: &str) {
        if !self.controllable() {
            return;
        }
        let Some(track) = self.playlist.find(id).cloned() else {
            return;
        };
        let autoplay = self.player.is_playing;
        self.cue(track, autoplay);
    }
}

fn clamp_volume(volume: f32) -> Option<f32> {
    (!volume.is_nan()).then(|| volume.clamp(0.0, 1.0))
}
