use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::analyzer::SampleRing;
use super::sink::{LoadedSink, create_sink};
use super::types::{AudioCmd, AudioError, AudioEvent};

struct Current {
    sink: Sink,
    duration: Option<Duration>,
}

/// Per-thread playback state.
struct Playback {
    generation: u64,
    /// Whether the user wants sound; applied to sinks as they arrive.
    playing: bool,
    volume: f32,
    current: Option<Current>,
}

impl Playback {
    fn drop_sink(&mut self) {
        if let Some(current) = self.current.take() {
            current.sink.stop();
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<AudioEvent>,
    ring: SampleRing,
    volume: f32,
    time_update: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                let error = AudioError::NoDevice(e.to_string());
                warn!(%error, "audio thread cannot start");
                reject_loads(&rx, &events, &error);
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped; the terminal belongs to the UI.
        stream.log_on_drop(false);

        let mut state = Playback {
            generation: 0,
            playing: false,
            volume,
            current: None,
        };
        let mut next_update = Instant::now() + time_update;

        loop {
            let timeout = next_update.saturating_duration_since(Instant::now());
            match rx.recv_timeout(timeout) {
                Ok(AudioCmd::Prepare {
                    generation,
                    autoplay,
                }) => {
                    state.drop_sink();
                    state.generation = generation;
                    state.playing = autoplay;
                    ring.clear();
                }
                Ok(AudioCmd::Load { generation, media }) => {
                    if generation != state.generation {
                        debug!(generation, current = state.generation, "stale load dropped");
                        continue;
                    }
                    match create_sink(&stream, media, &ring, state.volume) {
                        Ok(LoadedSink { sink, duration }) => {
                            if state.playing {
                                sink.play();
                            }
                            state.current = Some(Current { sink, duration });
                        }
                        Err(error) => {
                            warn!(%error, generation, "audio load failed");
                            let _ = events.send(AudioEvent::LoadFailed {
                                generation,
                                error: error.to_string(),
                            });
                        }
                    }
                }
                Ok(AudioCmd::Play) => {
                    state.playing = true;
                    if let Some(current) = &state.current {
                        current.sink.play();
                    }
                }
                Ok(AudioCmd::Pause) => {
                    state.playing = false;
                    if let Some(current) = &state.current {
                        current.sink.pause();
                    }
                }
                Ok(AudioCmd::Seek(seconds)) => {
                    if let Some(current) = &state.current {
                        let mut target = Duration::from_secs_f64(seconds.max(0.0));
                        if let Some(total) = current.duration {
                            target = target.min(total);
                        }
                        if let Err(e) = current.sink.try_seek(target) {
                            warn!(error = %e, "seek failed");
                        }
                    }
                }
                Ok(AudioCmd::SetVolume(volume)) => {
                    state.volume = volume;
                    if let Some(current) = &state.current {
                        current.sink.set_volume(volume);
                    }
                }
                Ok(AudioCmd::Stop) => {
                    state.playing = false;
                    state.drop_sink();
                    ring.clear();
                }
                Ok(AudioCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    state.drop_sink();
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            if Instant::now() >= next_update {
                next_update = Instant::now() + time_update;
                report(&mut state, &events);
            }
        }
    })
}

/// Emit a time update, or `Ended` once a playing sink has drained.
fn report(state: &mut Playback, events: &Sender<AudioEvent>) {
    let Some(current) = &state.current else {
        return;
    };
    let generation = state.generation;
    if state.playing && current.sink.empty() {
        state.current = None;
        state.playing = false;
        let _ = events.send(AudioEvent::Ended { generation });
        return;
    }
    let _ = events.send(AudioEvent::TimeUpdate {
        generation,
        position: current.sink.get_pos().as_secs_f64(),
        duration: current.duration.map_or(0.0, |d| d.as_secs_f64()),
    });
}

/// Without an output device every load fails until the thread is told to quit.
fn reject_loads(rx: &Receiver<AudioCmd>, events: &Sender<AudioEvent>, error: &AudioError) {
    for cmd in rx.iter() {
        match cmd {
            AudioCmd::Load { generation, .. } => {
                let _ = events.send(AudioEvent::LoadFailed {
                    generation,
                    error: error.to_string(),
                });
            }
            AudioCmd::Quit => break,
            _ => {}
        }
    }
}
