//! MPRIS bridge so desktop media keys and `playerctl` can see and drive the
//! local player. While a remote session is mirrored the service reports the
//! mirrored track but refuses control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::engine::PlayerState;

pub const BUS_NAME: &str = "org.mpris.MediaPlayer2.mirrortune";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/track/";

/// Transport requests coming from the bus, applied on the UI thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Playback {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct SharedState {
    playback: Playback,
    controllable: bool,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<String>,
}

impl SharedState {
    fn from_player(player: &PlayerState, controllable: bool) -> Self {
        let Some(track) = &player.track else {
            return Self {
                controllable,
                ..Self::default()
            };
        };
        let playback = if player.is_playing {
            Playback::Playing
        } else {
            Playback::Paused
        };
        let length = if player.duration_secs > 0.0 {
            player.duration_secs
        } else {
            track.duration as f64
        };
        Self {
            playback,
            controllable,
            title: Some(track.title.clone()),
            artist: track
                .artist
                .split(", ")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            album: Some(track.album.clone()).filter(|a| !a.is_empty()),
            art_url: Some(track.cover_url.clone())
                .filter(|u| u.starts_with("http://") || u.starts_with("https://")),
            length_micros: (length > 0.0).then(|| (length * 1_000_000.0) as i64),
            track_id: Some(track_object_path(&track.id)),
        }
    }
}

/// Object path naming a track; ids are reduced to the characters D-Bus allows.
fn track_object_path(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let cleaned = if cleaned.is_empty() {
        "none".to_string()
    } else {
        cleaned
    };
    format!("{TRACK_PATH_PREFIX}{cleaned}")
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    /// Publish the player as seen by the bus. `controllable` is false while
    /// the mirrored session is authoritative.
    pub fn publish(&self, player: &PlayerState, controllable: bool) {
        let next = SharedState::from_player(player, controllable);
        if let Ok(mut s) = self.state.lock() {
            if *s != next {
                debug!(playback = ?next.playback, title = ?next.title, "mpris state updated");
                *s = next;
            }
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "mirrortune"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn controllable(&self) -> bool {
        self.state.lock().map(|s| s.controllable).unwrap_or(false)
    }

    fn send(&self, cmd: ControlCmd) {
        if self.controllable() {
            let _ = self.tx.send(cmd);
        } else {
            debug!(?cmd, "mpris control ignored while not controllable");
        }
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            Playback::Stopped => "Stopped",
            Playback::Playing => "Playing",
            Playback::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        self.controllable()
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.controllable()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.controllable()
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.controllable()
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.controllable()
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(path) = s
            .track_id
            .as_deref()
            .and_then(|p| ObjectPath::try_from(p).ok())
            .and_then(|p| owned(Value::from(p)))
        {
            map.insert("mpris:trackid".to_string(), path);
        }
        if let Some(v) = s.title.clone().and_then(|t| owned(Value::from(t))) {
            map.insert("xesam:title".to_string(), v);
        }
        if !s.artist.is_empty() {
            if let Some(v) = owned(Value::from(s.artist.clone())) {
                map.insert("xesam:artist".to_string(), v);
            }
        }
        if let Some(v) = s.album.clone().and_then(|a| owned(Value::from(a))) {
            map.insert("xesam:album".to_string(), v);
        }
        if let Some(v) = s.art_url.clone().and_then(|u| owned(Value::from(u))) {
            map.insert("mpris:artUrl".to_string(), v);
        }
        if let Some(v) = s.length_micros.and_then(|l| owned(Value::from(l))) {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

/// Register the service on the session bus from a dedicated thread. A missing
/// bus only disables the bridge.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "mpris: failed to connect to session bus");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                warn!(error = %e, "mpris: failed to acquire name");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                warn!(error = %e, "mpris: failed to register root iface");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!(error = %e, "mpris: failed to register player iface");
                return;
            }

            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}
