//! Local audio playback.
//!
//! `AudioPlayer` owns a background thread that drives a rodio `Sink` and
//! reports time updates and end-of-track back over a channel. Every decoded
//! source passes through an `AnalyzerTap` feeding the frequency analyzer.

mod analyzer;
mod player;
mod sink;
mod thread;
mod types;

pub use analyzer::{Analyzer, AnalyzerFrame};
pub use player::{AssetFetcher, AudioPlayer};
pub use types::{AudioElement, AudioEvent};
