use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{self, LoggingSettings};

/// Install the file subscriber. The terminal belongs to the UI, so nothing is
/// written to stdout or stderr; without a writable log file logging is off.
pub fn init(settings: &LoggingSettings) {
    let Some(file) = open_log_file(settings) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn open_log_file(settings: &LoggingSettings) -> Option<File> {
    let path = settings.file.clone().or_else(config::default_log_path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
