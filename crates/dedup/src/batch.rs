//! Layer 1: in-memory, in-batch dedup. First occurrence wins, insertion
//! order preserved.

use std::collections::HashSet;

use gazette_core::hash::hash_content;
use gazette_core::item::StandardItem;

#[derive(Default)]
pub struct BatchSeen {
    hashes: HashSet<String>,
}

impl BatchSeen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `item` is a duplicate of something already seen
    /// this cycle; otherwise marks it seen and returns `false`. An empty
    /// hash (non-string/blank inputs) never matches anything, per §4.D.
    pub fn is_duplicate_or_mark(&mut self, item: &StandardItem) -> bool {
        let h = hash_content(&item.title, &item.content);
        if h.is_empty() {
            return false;
        }
        if self.hashes.contains(&h) {
            return true;
        }
        self.hashes.insert(h);
        false
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Filter a batch of items, keeping first occurrences only. Pure function
/// form for callers that don't need the running `BatchSeen` state.
pub fn filter_duplicates_in_batch(items: Vec<StandardItem>) -> Vec<StandardItem> {
    let mut seen = BatchSeen::new();
    items.into_iter().filter(|item| !seen.is_duplicate_or_mark(item)).collect()
}
