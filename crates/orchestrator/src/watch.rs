//! Blob-created watcher (§4.J): a poll-based stand-in for native blob-event
//! notifications. Each container's key listing is diffed against what was
//! seen on the previous tick; newly observed keys are reported once.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct BlobWatcher {
    seen: HashSet<String>,
}

impl BlobWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the subset of `current_keys` not seen on a prior call, then
    /// records all of `current_keys` as seen.
    pub fn diff_new(&mut self, current_keys: Vec<String>) -> Vec<String> {
        let fresh: Vec<String> = current_keys.iter().filter(|k| !self.seen.contains(*k)).cloned().collect();
        self.seen.extend(current_keys);
        fresh
    }
}
