use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::remote::{
    Credential, CredentialPush, MirrorBackend, MirroredSnapshot, MusicCatalog, RemoteError,
    iso_timestamp, normalize_featured, normalize_relay,
};

/// What one poll yields: a snapshot, nothing to show, or a failed fetch.
pub type TickResult = Result<Option<MirroredSnapshot>, RemoteError>;

pub struct TrackPoller<B, C> {
    backend: Arc<B>,
    catalog: Arc<C>,
    default_cover: String,
    pushed: AtomicBool,
}

impl<B: MirrorBackend, C: MusicCatalog> TrackPoller<B, C> {
    pub fn new(backend: Arc<B>, catalog: Arc<C>, default_cover: impl Into<String>) -> Self {
        Self {
            backend,
            catalog,
            default_cover: default_cover.into(),
            pushed: AtomicBool::new(false),
        }
    }

    /// Client-credential grant. `None` on any failure; callers do not retry.
    pub async fn acquire_token(&self) -> Option<Credential> {
        match self.catalog.request_token().await {
            Ok(credential) => {
                self.pushed.store(false, Ordering::SeqCst);
                info!("spotify token acquired");
                Some(credential)
            }
            Err(RemoteError::NotConfigured) => {
                info!("spotify client credentials not configured");
                None
            }
            Err(e) => {
                warn!(error = %e, "spotify token request failed");
                None
            }
        }
    }

    /// Relay first, then the first track of the first featured playlist.
    ///
    /// Relay failures fall through to the catalog; catalog failures are
    /// returned to the caller.
    pub async fn fetch_current(&self, credential: &Credential) -> TickResult {
        match self.backend.current_song().await {
            Ok(response) if response.success => {
                if let Some(track) = response.track {
                    let snapshot = normalize_relay(&track, &self.default_cover);
                    debug!(track = %snapshot.track, "relay reported a track");
                    self.push_credential_once(credential);
                    return Ok(Some(snapshot));
                }
            }
            Ok(_) => debug!("relay has no current song"),
            Err(e) => debug!(error = %e, "relay unavailable"),
        }

        let Some(playlist_id) = self.catalog.featured_playlist_id(credential).await? else {
            debug!("no featured playlist");
            return Ok(None);
        };
        let Some(track) = self
            .catalog
            .first_playlist_track(credential, &playlist_id)
            .await?
        else {
            debug!(playlist = %playlist_id, "featured playlist is empty");
            return Ok(None);
        };

        let snapshot = normalize_featured(&track, &self.default_cover);
        debug!(track = %snapshot.track, "using featured track");
        self.push_credential_once(credential);
        Ok(Some(snapshot))
    }

    /// Forward the credential to the companion device on a detached task.
    fn push_credential_once(&self, credential: &Credential) {
        if self.pushed.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime, credential push skipped");
            return;
        };
        let (client_id, client_secret) = self.catalog.client_credentials();
        let push = CredentialPush {
            access_token: credential.access_token().to_string(),
            client_id,
            client_secret,
            timestamp: iso_timestamp(),
        };
        let backend = Arc::clone(&self.backend);
        runtime.spawn(async move {
            match backend.push_credentials(&push).await {
                Ok(()) => debug!("credentials forwarded to companion device"),
                Err(e) => warn!(error = %e, "credential push failed"),
            }
        });
    }
}

/// The single interval task that polls the current track.
#[derive(Default)]
pub struct PollTask {
    handle: Option<JoinHandle<()>>,
}

impl PollTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Arm the task when every gate holds, abort it otherwise.
    ///
    /// An already running task is left alone, so repeated calls never stack
    /// timers. The first tick fires one `period` after arming.
    pub fn sync<B, C, F>(
        &mut self,
        runtime: &Handle,
        poller: &Arc<TrackPoller<B, C>>,
        credential: Option<&Credential>,
        gates_hold: bool,
        period: Duration,
        on_tick: F,
    ) where
        B: MirrorBackend,
        C: MusicCatalog,
        F: Fn(TickResult) + Send + 'static,
    {
        let credential = match credential {
            Some(c) if gates_hold => c.clone(),
            _ => {
                self.cancel();
                return;
            }
        };
        if self.is_armed() {
            return;
        }

        let poller = Arc::clone(poller);
        info!(period_secs = period.as_secs(), "poll task armed");
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = poller.fetch_current(&credential).await;
                on_tick(result);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("poll task cancelled");
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
