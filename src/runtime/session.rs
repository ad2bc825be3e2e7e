use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::audio::{AssetFetcher, AudioEvent, AudioPlayer};
use crate::config::Settings;
use crate::engine::{Authority, EngineEvent, Playlist, Reconciler};
use crate::library::local_playlist;
use crate::mirror;
use crate::remote::{
    Credential, HttpBackend, MirrorBackend, MusicCatalog, RemoteError, SpotifyCatalog, http_client,
};
use crate::spotify::{PollTask, TrackPoller};

/// Messages from the network tasks to the UI thread.
#[derive(Debug)]
pub enum SessionMsg {
    Engine(EngineEvent),
    /// Outcome of the client-credential grant.
    Token(Option<Credential>),
}

/// One page lifetime: the engine, the audio element and the network tasks.
///
/// A reload replaces the whole session; dropping it unmounts.
pub struct Session<B, C> {
    engine: Reconciler<AudioPlayer>,
    backend: Arc<B>,
    poller: Arc<TrackPoller<B, C>>,
    credential: Option<Credential>,
    poll: PollTask,
    period: Duration,
    init: Option<JoinHandle<()>>,
    runtime: Handle,
    tx: Sender<SessionMsg>,
    rx: Receiver<SessionMsg>,
    audio_rx: Receiver<AudioEvent>,
}

impl Session<HttpBackend, SpotifyCatalog> {
    /// Wire the HTTP collaborators and the local playlist from `settings`.
    pub fn new(settings: &Settings, runtime: Handle) -> Result<Self, RemoteError> {
        let client = http_client()?;
        let backend = HttpBackend::new(client.clone(), &settings.backend);
        let catalog = SpotifyCatalog::new(client, &settings.spotify);
        let fetcher = AssetFetcher::new(runtime.clone(), backend.clone());
        let playlist = Playlist::new(local_playlist(&settings.library));
        Ok(Self::with_parts(
            Arc::new(backend),
            Arc::new(catalog),
            playlist,
            Some(fetcher),
            settings,
            runtime,
        ))
    }
}

impl<B: MirrorBackend, C: MusicCatalog> Session<B, C> {
    pub fn with_parts(
        backend: Arc<B>,
        catalog: Arc<C>,
        playlist: Playlist,
        fetcher: Option<AssetFetcher>,
        settings: &Settings,
        runtime: Handle,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let (audio_tx, audio_rx) = mpsc::channel();
        let player = AudioPlayer::new(settings.audio.clone(), fetcher, audio_tx);
        let poller = Arc::new(TrackPoller::new(
            Arc::clone(&backend),
            catalog,
            settings.spotify.default_cover.clone(),
        ));
        Self {
            engine: Reconciler::new(playlist, player, settings.audio.volume),
            backend,
            poller,
            credential: None,
            poll: PollTask::new(),
            period: Duration::from_secs(settings.polling.interval_secs),
            init: None,
            runtime,
            tx,
            rx,
            audio_rx,
        }
    }

    pub fn engine(&self) -> &Reconciler<AudioPlayer> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Reconciler<AudioPlayer> {
        &mut self.engine
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.poll.is_armed()
    }

    /// Whether local transport applies, i.e. a local track is authoritative.
    pub fn controllable(&self) -> bool {
        self.engine.state().authoritative() == Some(Authority::Local)
            && !self.engine.player().is_mirrored()
    }

    /// Start resolution: mirror status, then token, then the first track.
    pub fn mount(&mut self) {
        if self.engine.is_mounted() || self.init.is_some() {
            return;
        }
        self.engine.mount();

        let backend = Arc::clone(&self.backend);
        let poller = Arc::clone(&self.poller);
        let tx = self.tx.clone();
        self.init = Some(self.runtime.spawn(async move {
            let resolution = mirror::resolve(backend.as_ref()).await;
            let failed = resolution.enable_error.is_some();
            let _ = tx.send(SessionMsg::Engine(EngineEvent::MirrorResolved(resolution)));
            if failed {
                return;
            }

            let credential = poller.acquire_token().await;
            let initial = match &credential {
                Some(credential) => match poller.fetch_current(credential).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        debug!(error = %e, "initial track lookup failed");
                        None
                    }
                },
                None => None,
            };
            let _ = tx.send(SessionMsg::Token(credential));
            let _ = tx.send(SessionMsg::Engine(EngineEvent::InitialTrack(initial)));
        }));
    }

    /// Apply everything the tasks and the audio thread reported, then re-check
    /// the polling gates. Returns whether anything arrived.
    pub fn pump(&mut self) -> bool {
        let init_done = self.init.as_ref().is_some_and(JoinHandle::is_finished);
        let mut changed = false;

        while let Ok(msg) = self.rx.try_recv() {
            changed = true;
            match msg {
                SessionMsg::Token(credential) => {
                    let ok = credential.is_some();
                    self.credential = credential;
                    self.engine.handle(EngineEvent::TokenAcquired(ok));
                }
                SessionMsg::Engine(event) => self.engine.handle(event),
            }
        }

        while let Ok(event) = self.audio_rx.try_recv() {
            if event.generation() != self.engine.element().generation() {
                debug!(?event, "stale audio event dropped");
                continue;
            }
            changed = true;
            self.engine.handle(match event {
                AudioEvent::TimeUpdate {
                    position, duration, ..
                } => EngineEvent::TimeUpdate { position, duration },
                AudioEvent::Ended { .. } => EngineEvent::Ended,
                AudioEvent::LoadFailed { error, .. } => EngineEvent::LoadFailed(error),
            });
        }

        if init_done {
            self.init = None;
            if self.engine.state().is_loading() {
                self.engine.handle(EngineEvent::InitFailed(
                    "initialization ended without a track".to_string(),
                ));
                changed = true;
            }
        }

        self.sync_polling();
        changed
    }

    fn sync_polling(&mut self) {
        let tx = self.tx.clone();
        self.poll.sync(
            &self.runtime,
            &self.poller,
            self.credential.as_ref(),
            self.engine.is_mounted() && self.engine.state().wants_polling(),
            self.period,
            move |tick| {
                let tick = tick.map_err(|e| e.to_string());
                let _ = tx.send(SessionMsg::Engine(EngineEvent::PollTick(tick)));
            },
        );
    }

    /// Abort the tasks and silence the element. Later reports are dropped.
    pub fn unmount(&mut self) {
        if let Some(init) = self.init.take() {
            init.abort();
        }
        self.poll.cancel();
        self.engine.unmount();
        info!("session unmounted");
    }
}

impl<B, C> Drop for Session<B, C> {
    fn drop(&mut self) {
        if let Some(init) = self.init.take() {
            init.abort();
        }
        self.poll.cancel();
        self.engine.unmount();
    }
}
