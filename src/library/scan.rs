use std::borrow::Cow;
use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;

use super::model::{Track, TrackMeta};

/// Which directory entries become tracks.
struct Filter<'a> {
    extensions: Vec<String>,
    settings: &'a LibrarySettings,
}

impl<'a> Filter<'a> {
    fn new(settings: &'a LibrarySettings) -> Self {
        let extensions = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            settings,
        }
    }

    fn max_depth(&self) -> Option<usize> {
        if self.settings.recursive {
            self.settings.max_depth
        } else {
            Some(1)
        }
    }

    /// Hidden directories are pruned; the root itself is always entered.
    fn descend(&self, entry: &DirEntry) -> bool {
        entry.depth() == 0 || self.settings.include_hidden || !is_hidden(entry.path())
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        path.is_file()
            && (self.settings.include_hidden || !is_hidden(path))
            && self.extensions.iter().any(|e| *e == ext)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Build a local playlist from the audio files under `dir`.
///
/// Tags fill in title/artist/album/duration when readable; the file stem is
/// the title otherwise. Track ids are the paths relative to `dir`, which keeps
/// them stable across scans.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let filter = Filter::new(settings);

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    if let Some(depth) = filter.max_depth() {
        walker = walker.max_depth(depth);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| filter.descend(e))
        .filter_map(Result::ok)
        .filter(|e| filter.accepts(e.path()))
        .filter_map(|e| {
            let path = e.path();
            let id = path.strip_prefix(dir).unwrap_or(path).to_string_lossy();
            Track::local(read_meta(path, &id), path.to_string_lossy())
        })
        .collect();

    tracks.sort_by_cached_key(|t| t.to_string().to_lowercase());
    tracks
}

/// Metadata for one file; unreadable tags leave the stem as the title.
fn read_meta(path: &Path, id: &str) -> TrackMeta {
    let mut meta = TrackMeta {
        id: id.to_string(),
        title: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string()),
        ..TrackMeta::default()
    };

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), "no readable tags: {e}");
            return meta;
        }
    };
    meta.duration = tagged.properties().duration().as_secs();

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return meta;
    };
    if let Some(title) = non_blank(tag.title()) {
        meta.title = title;
    }
    if let Some(artist) = non_blank(tag.artist()) {
        meta.artist = artist;
    }
    if let Some(album) = non_blank(tag.album()) {
        meta.album = album;
    }
    meta
}

fn non_blank(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
