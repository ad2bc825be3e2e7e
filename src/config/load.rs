use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `MIRRORTUNE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MIRRORTUNE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.polling.interval_secs == 0 {
            return Err("polling.interval_secs must be >= 1".to_string());
        }
        let fft = self.audio.fft_size;
        if !fft.is_power_of_two() || !(32..=32768).contains(&fft) {
            return Err("audio.fft_size must be a power of two in 32..=32768".to_string());
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err("audio.volume must be within [0, 1]".to_string());
        }
        if !(0.0..1.0).contains(&self.audio.smoothing) {
            return Err("audio.smoothing must be within [0, 1)".to_string());
        }
        if self.audio.min_decibels >= self.audio.max_decibels {
            return Err("audio.min_decibels must be below audio.max_decibels".to_string());
        }
        if self.audio.time_update_ms == 0 {
            return Err("audio.time_update_ms must be >= 1".to_string());
        }
        if self.visualizer.fps == 0 {
            return Err("visualizer.fps must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `MIRRORTUNE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MIRRORTUNE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/mirrortune/config.toml`
/// or `~/.config/mirrortune/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("mirrortune").join("config.toml"))
}

/// Compute the default log path under `$XDG_STATE_HOME/mirrortune/mirrortune.log`
/// or `~/.local/state/mirrortune/mirrortune.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("mirrortune").join("mirrortune.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
