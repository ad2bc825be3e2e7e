use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::AudioSettings;
use crate::library::Track;
use crate::remote::HttpBackend;

use super::analyzer::{Analyzer, SampleRing};
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, AudioElement, AudioError, AudioEvent, Media};

/// Downloads backend-hosted audio on the async runtime.
#[derive(Clone)]
pub struct AssetFetcher {
    runtime: Handle,
    backend: HttpBackend,
}

impl AssetFetcher {
    pub fn new(runtime: Handle, backend: HttpBackend) -> Self {
        Self { runtime, backend }
    }
}

struct Running {
    tx: Sender<AudioCmd>,
    join: JoinHandle<()>,
    analyzer: Analyzer,
}

/// The local audio element.
///
/// The rodio thread and the analyzer are created together on the first
/// local load, so a session that only mirrors never opens an output device.
pub struct AudioPlayer {
    settings: AudioSettings,
    fetcher: Option<AssetFetcher>,
    events: Sender<AudioEvent>,
    volume: f32,
    generation: u64,
    running: Option<Running>,
}

impl AudioPlayer {
    pub fn new(
        settings: AudioSettings,
        fetcher: Option<AssetFetcher>,
        events: Sender<AudioEvent>,
    ) -> Self {
        let volume = settings.volume;
        Self {
            settings,
            fetcher,
            events,
            volume,
            generation: 0,
            running: None,
        }
    }

    #[cfg(test)]
    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    /// Generation of the most recent load; older events are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn analyzer_mut(&mut self) -> Option<&mut Analyzer> {
        self.running.as_mut().map(|r| &mut r.analyzer)
    }

    fn ensure_started(&mut self) -> &Sender<AudioCmd> {
        let settings = &self.settings;
        let events = &self.events;
        let volume = self.volume;
        &self
            .running
            .get_or_insert_with(|| {
                let ring = SampleRing::new(settings.fft_size);
                let analyzer = Analyzer::new(ring.clone(), settings);
                let (tx, rx) = mpsc::channel();
                let join = spawn_audio_thread(
                    rx,
                    events.clone(),
                    ring,
                    volume,
                    Duration::from_millis(settings.time_update_ms),
                );
                info!(fft_size = settings.fft_size, "audio element started");
                Running { tx, join, analyzer }
            })
            .tx
    }

    fn send(&self, cmd: AudioCmd) {
        if let Some(running) = &self.running {
            if running.tx.send(cmd).is_err() {
                warn!("audio thread is gone");
            }
        }
    }

    fn fail(&self, generation: u64, error: AudioError) {
        warn!(%error, generation, "audio load failed");
        let _ = self.events.send(AudioEvent::LoadFailed {
            generation,
            error: error.to_string(),
        });
    }
}

impl AudioElement for AudioPlayer {
    fn load(&mut self, track: &Track, autoplay: bool) {
        if track.is_mirrored() {
            return;
        }
        let url = track.source_url().to_string();
        self.generation += 1;
        let generation = self.generation;
        let tx = self.ensure_started().clone();
        if tx.send(AudioCmd::Prepare { generation, autoplay }).is_err() {
            warn!("audio thread is gone");
            return;
        }
        debug!(generation, %url, autoplay, "loading track");

        let path = Path::new(&url);
        if path.is_file() {
            let _ = tx.send(AudioCmd::Load {
                generation,
                media: Media::File(path.to_path_buf()),
            });
            return;
        }

        let Some(fetcher) = self.fetcher.clone() else {
            self.fail(
                generation,
                AudioError::Open {
                    path: path.to_path_buf(),
                    source: std::io::ErrorKind::NotFound.into(),
                },
            );
            return;
        };
        let events = self.events.clone();
        fetcher.runtime.spawn(async move {
            match fetcher.backend.fetch_asset(&url).await {
                Ok(bytes) => {
                    let _ = tx.send(AudioCmd::Load {
                        generation,
                        media: Media::Bytes(bytes),
                    });
                }
                Err(e) => {
                    let error = AudioError::from(e);
                    warn!(%error, %url, "audio fetch failed");
                    let _ = events.send(AudioEvent::LoadFailed {
                        generation,
                        error: error.to_string(),
                    });
                }
            }
        });
    }

    fn play(&mut self) {
        self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(AudioCmd::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.send(AudioCmd::SetVolume(volume));
    }

    fn stop(&mut self) {
        self.send(AudioCmd::Stop);
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.tx.send(AudioCmd::Quit);
            if running.join.join().is_err() {
                warn!("audio thread panicked");
            }
        }
    }
}
