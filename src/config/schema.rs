use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/mirrortune/config.toml` or `~/.config/mirrortune/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `MIRRORTUNE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub spotify: SpotifySettings,
    pub polling: PollingSettings,
    pub audio: AudioSettings,
    pub visualizer: VisualizerSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the backend that reports mirror status, relays the
    /// companion device's current song and serves audio/cover assets.
    pub base_url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotifySettings {
    /// Client id used for the client-credential grant. Empty disables Spotify.
    pub client_id: String,
    /// Client secret used for the client-credential grant.
    pub client_secret: String,
    pub token_url: String,
    pub api_base: String,
    /// Cover shown when a catalog track carries no album art.
    pub default_cover: String,
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base: "https://api.spotify.com/v1".to_string(),
            default_cover: "/default-cover.jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Seconds between two "currently playing" fetches.
    pub interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Initial volume in `[0, 1]`.
    pub volume: f32,
    /// Transform size of the analyzer (power of two). Yields `fft_size / 2` bins.
    pub fft_size: usize,
    /// Smoothing constant applied between analyzer snapshots, in `[0, 1)`.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// How often the audio thread reports position and duration (milliseconds).
    pub time_update_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            time_update_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    /// Target frames per second of the UI/render loop.
    pub fps: u32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory to build the local playlist from. When unset, the built-in
    /// sample playlist served by the backend is used.
    pub dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            dir: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Title rendered in the header bar.
    pub header_text: String,

    /// Which track fields to show under the title, and in what order.
    ///
    /// Example: ["artist", "album"]
    pub now_playing_fields: Vec<TrackField>,

    /// Separator used to join `now_playing_fields` on a single line.
    pub now_playing_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: "SmartMonitor Music".to_string(),
            now_playing_fields: vec![TrackField::Artist, TrackField::Album],
            now_playing_separator: " • ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackField {
    Title,
    Artist,
    Album,
    #[serde(alias = "length")]
    Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/mirrortune/mirrortune.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
