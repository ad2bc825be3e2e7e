//! Playback mode reconciliation.
//!
//! The `Reconciler` decides whether the local element or the mirrored remote
//! session is authoritative and exposes one `PlayerState` either way. It also
//! carries the local transport (play/pause, seek, volume, next/previous).

mod playlist;
mod reconciler;
mod state;

pub use playlist::Playlist;
pub use reconciler::{EngineEvent, EngineView, Reconciler};
pub use state::{Authority, EngineError, EngineState, MirrorLink, PlayerState};

#[cfg(test)]
mod tests;
