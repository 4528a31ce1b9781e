//! Ordered, deduplicated track list
//!
//! Insertion order is arrival order. Identifiers are unique.

use crate::types::Track;
use std::collections::HashSet;

/// Ordered playlist with identifier lookup
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    ids: HashSet<String>,
}

impl Playlist {
    /// Create new empty playlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track unless its identifier is already present
    ///
    /// Returns the index of the appended track, or `None` for a duplicate.
    pub fn push(&mut self, track: Track) -> Option<usize> {
        if !self.ids.insert(track.id.clone()) {
            return None;
        }
        self.tracks.push(track);
        Some(self.tracks.len() - 1)
    }

    /// Check whether a track identifier is present
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Identifiers from `snapshot` not yet in the playlist, in snapshot order
    ///
    /// Compares by set membership so a same-length replacement is still seen.
    pub fn missing<'a>(&self, snapshot: &'a [String]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        snapshot
            .iter()
            .map(String::as_str)
            .filter(|id| !self.ids.contains(*id) && seen.insert(*id))
            .collect()
    }

    /// Get track by index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Iterate tracks in playlist order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(playlist: &Playlist) -> Vec<&str> {
        playlist.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn push_preserves_order() {
        let mut playlist = Playlist::new();
        assert_eq!(playlist.push(Track::from_url("a")), Some(0));
        assert_eq!(playlist.push(Track::from_url("b")), Some(1));
        assert_eq!(playlist.push(Track::from_url("c")), Some(2));
        assert_eq!(ids(&playlist), vec!["a", "b", "c"]);
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut playlist = Playlist::new();
        playlist.push(Track::from_url("a"));
        assert_eq!(playlist.push(Track::from_url("a")), None);
        assert_eq!(playlist.len(), 1);
    }

    #[test]
    fn missing_uses_set_difference() {
        let mut playlist = Playlist::new();
        playlist.push(Track::from_url("a"));
        playlist.push(Track::from_url("b"));

        // Same length as the playlist, but "b" was replaced by "c"
        let snapshot = vec!["a".to_string(), "c".to_string()];
        assert_eq!(playlist.missing(&snapshot), vec!["c"]);
    }

    #[test]
    fn missing_ignores_repeats_within_snapshot() {
        let playlist = Playlist::new();
        let snapshot = vec!["x".to_string(), "x".to_string(), "y".to_string()];
        assert_eq!(playlist.missing(&snapshot), vec!["x", "y"]);
    }

    #[test]
    fn clear_empties_lookup_too() {
        let mut playlist = Playlist::new();
        playlist.push(Track::from_url("a"));
        playlist.clear();
        assert!(playlist.is_empty());
        assert!(!playlist.contains("a"));
        assert_eq!(playlist.push(Track::from_url("a")), Some(0));
    }
}
