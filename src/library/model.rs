use std::fmt;

/// Where the audio of a track comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A file path, an absolute `http(s)` URL or a backend-relative URL
    /// (e.g. `/api/audio/track/1`). Never empty.
    Local(String),
    /// Reflection of a remote session; not independently fetchable.
    Mirrored,
}

/// Display metadata shared by local and mirrored tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackMeta {
    pub id: String,
    pub title: String,
    /// Comma-joined performer names.
    pub artist: String,
    pub album: String,
    /// Whole seconds.
    pub duration: u64,
    pub cover_url: String,
}

/// A normalized playable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: u64,
    pub cover_url: String,
    source: TrackSource,
}

impl Track {
    /// Build a locally playable track. Returns `None` when `source_url` is blank.
    pub fn local(meta: TrackMeta, source_url: impl Into<String>) -> Option<Self> {
        let source_url = source_url.into();
        if source_url.trim().is_empty() {
            return None;
        }
        Some(Self::with_source(meta, TrackSource::Local(source_url)))
    }

    /// Build a track mirrored from a remote session.
    pub fn mirrored(meta: TrackMeta) -> Self {
        Self::with_source(meta, TrackSource::Mirrored)
    }

    fn with_source(meta: TrackMeta, source: TrackSource) -> Self {
        Self {
            id: meta.id,
            title: meta.title,
            artist: meta.artist,
            album: meta.album,
            duration: meta.duration,
            cover_url: meta.cover_url,
            source,
        }
    }

    #[cfg(test)]
    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    /// The local URL or path; empty for mirrored tracks.
    pub fn source_url(&self) -> &str {
        match &self.source {
            TrackSource::Local(url) => url,
            TrackSource::Mirrored => "",
        }
    }

    pub fn is_mirrored(&self) -> bool {
        matches!(self.source, TrackSource::Mirrored)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artist.trim().is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.artist, self.title)
        }
    }
}
