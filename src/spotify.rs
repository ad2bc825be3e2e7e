//! Spotify now-playing poller.
//!
//! `TrackPoller` owns the credential lifecycle and the relay-first lookup;
//! `PollTask` is the single cancellable interval task that drives it.

mod poller;

pub use poller::{PollTask, TrackPoller};
