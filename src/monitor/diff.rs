//! Hash-map diffing between a stored snapshot and a fresh scan.

use std::collections::HashMap;

use serde::Serialize;

/// The three-way difference between two path->digest maps.
///
/// A path present in both maps with an equal digest appears in none of the
/// sets. Paths are sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// Compare a previously stored snapshot against the current scan.
    pub fn diff(stored: &HashMap<String, String>, current: &HashMap<String, String>) -> Self {
        let mut set = ChangeSet::default();

        for (path, digest) in current {
            match stored.get(path) {
                None => set.added.push(path.clone()),
                Some(old) if old != digest => set.changed.push(path.clone()),
                Some(_) => {}
            }
        }

        for path in stored.keys() {
            if !current.contains_key(path) {
                set.deleted.push(path.clone());
            }
        }

        set.added.sort();
        set.changed.sort();
        set.deleted.sort();
        set
    }

    /// Work to redo: additions and modifications. Deletions are reported but
    /// require no re-extraction.
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }
}
