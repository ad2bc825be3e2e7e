use crate::library::Track;

/// The active local playlist. Navigation wraps around both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    /// Mirrored entries are not playable locally and are skipped.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into_iter().filter(|t| !t.is_mirrored()).collect(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.position(id).and_then(|i| self.tracks.get(i))
    }

    /// The entry after `current`, wrapping to the first. An unknown current
    /// track also yields the first. `None` with fewer than two entries.
    pub fn next_after(&self, current: Option<&str>) -> Option<&Track> {
        let len = self.tracks.len();
        if len < 2 {
            return None;
        }
        let next = match current.and_then(|id| self.position(id)) {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.tracks.get(next)
    }

    /// The entry before `current`, wrapping to the last. An unknown current
    /// track yields the last. `None` with fewer than two entries.
    pub fn previous_before(&self, current: Option<&str>) -> Option<&Track> {
        let len = self.tracks.len();
        if len < 2 {
            return None;
        }
        let previous = match current.and_then(|id| self.position(id)) {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.tracks.get(previous)
    }
}
