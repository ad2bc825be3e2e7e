//! Commands, events and errors of the local audio element.

use std::path::PathBuf;

use thiserror::Error;

use crate::library::Track;
use crate::remote::RemoteError;

/// Encoded audio ready to be decoded by the audio thread.
#[derive(Debug)]
pub enum Media {
    /// A file on local disk.
    File(PathBuf),
    /// A downloaded asset.
    Bytes(Vec<u8>),
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Drop the current sink and expect media for `generation`.
    Prepare { generation: u64, autoplay: bool },
    /// Media for a prepared generation. Ignored when a newer one was prepared since.
    Load { generation: u64, media: Media },
    Play,
    Pause,
    /// Absolute position in seconds.
    Seek(f64),
    SetVolume(f32),
    Stop,
    Quit,
}

/// Reports from the audio thread. Each carries the generation it refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    TimeUpdate {
        generation: u64,
        position: f64,
        /// `0.0` while unknown.
        duration: f64,
    },
    Ended {
        generation: u64,
    },
    LoadFailed {
        generation: u64,
        error: String,
    },
}

impl AudioEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::TimeUpdate { generation, .. }
            | Self::Ended { generation }
            | Self::LoadFailed { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("no audio output device: {0}")]
    NoDevice(String),
    #[error("cannot fetch audio: {0}")]
    Fetch(#[from] RemoteError),
}

/// The transport surface the engine drives.
///
/// Implemented by [`super::AudioPlayer`]; tests use a recording fake.
pub trait AudioElement {
    /// Switch to `track`. Mirrored tracks are ignored.
    fn load(&mut self, track: &Track, autoplay: bool);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f32);
    fn stop(&mut self);
}
