//! Engine state and the player value the view layer observes.
//!
//! Every flag the views show is derived from [`EngineState`]; there is no
//! separate boolean to fall out of sync with it.

use thiserror::Error;

use crate::library::Track;
use crate::remote::MirroredSnapshot;

/// Terminal failures shown as the full-page error view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    MirrorEnable(String),
    #[error("Failed to initialize music player: {0}")]
    Init(String),
    #[error("No playable track available")]
    NoPlayableTrack,
}

/// Mirror flags recorded by the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorLink {
    pub enabled: bool,
    pub pi_connected: bool,
}

/// Which source currently decides [`PlayerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Local,
    Mirrored,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    /// `link` is `None` until the mirror status has been resolved.
    ResolvingMirror {
        link: Option<MirrorLink>,
        spotify_connected: bool,
    },
    LocalAuthoritative {
        link: MirrorLink,
        spotify_connected: bool,
    },
    /// Only reachable with a credential, so Spotify is connected by construction.
    MirroredAuthoritative {
        link: MirrorLink,
    },
    Error(EngineError),
}

impl EngineState {
    fn link(&self) -> Option<MirrorLink> {
        match self {
            Self::ResolvingMirror { link, .. } => *link,
            Self::LocalAuthoritative { link, .. } | Self::MirroredAuthoritative { link } => {
                Some(*link)
            }
            Self::Uninitialized | Self::Error(_) => None,
        }
    }

    pub fn mirror_enabled(&self) -> bool {
        self.link().is_some_and(|l| l.enabled)
    }

    pub fn pi_connected(&self) -> bool {
        self.link().is_some_and(|l| l.pi_connected)
    }

    pub fn spotify_connected(&self) -> bool {
        match self {
            Self::ResolvingMirror {
                spotify_connected, ..
            }
            | Self::LocalAuthoritative {
                spotify_connected, ..
            } => *spotify_connected,
            Self::MirroredAuthoritative { .. } => true,
            Self::Uninitialized | Self::Error(_) => false,
        }
    }

    /// Whether the mirror status check has answered yet.
    pub fn mirror_resolved(&self) -> bool {
        !matches!(
            self,
            Self::Uninitialized | Self::ResolvingMirror { link: None, .. }
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::ResolvingMirror { .. })
    }

    pub fn error(&self) -> Option<&EngineError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn authoritative(&self) -> Option<Authority> {
        match self {
            Self::LocalAuthoritative { .. } => Some(Authority::Local),
            Self::MirroredAuthoritative { .. } => Some(Authority::Mirrored),
            _ => None,
        }
    }

    /// Credential present, mirror enabled and the initial track settled.
    pub fn wants_polling(&self) -> bool {
        self.authoritative().is_some() && self.spotify_connected() && self.mirror_enabled()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::ResolvingMirror { .. } => "resolving-mirror",
            Self::LocalAuthoritative { .. } => "local",
            Self::MirroredAuthoritative { .. } => "mirrored",
            Self::Error(_) => "error",
        }
    }
}

/// The single value the view layer observes. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub track: Option<Track>,
    pub is_playing: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    /// Always within `[0, 1]`.
    pub volume: f32,
}

impl PlayerState {
    pub fn idle(volume: f32) -> Self {
        Self {
            track: None,
            is_playing: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume,
        }
    }

    /// A local track cued at its start.
    pub fn cued(track: Track, is_playing: bool, volume: f32) -> Self {
        let duration_secs = track.duration as f64;
        Self {
            track: Some(track),
            is_playing,
            position_secs: 0.0,
            duration_secs,
            volume,
        }
    }

    pub fn mirrored(snapshot: MirroredSnapshot, volume: f32) -> Self {
        Self {
            track: Some(snapshot.track),
            is_playing: snapshot.is_playing,
            position_secs: snapshot.position_secs as f64,
            duration_secs: snapshot.duration_secs as f64,
            volume,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.track.as_ref().is_some_and(Track::is_mirrored)
    }

    /// Progress in `[0, 1]`; `0` when the duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
