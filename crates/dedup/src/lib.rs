//! Three-layer deduplication (§4.D). Each layer fails open: an I/O error
//! returns the input unchanged rather than blocking collection.

pub mod batch;
pub mod historical;
pub mod same_day;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gazette_core::item::StandardItem;
use gazette_storage::Container;

pub use batch::BatchSeen;
pub use historical::PublishedUrls;

/// Runs all three layers in order over one collection cycle.
pub struct DedupPipeline {
    pub enable_l2: bool,
    pub enable_l3: bool,
}

impl DedupPipeline {
    pub fn new(enable_l2: bool, enable_l3: bool) -> Self {
        Self { enable_l2, enable_l3 }
    }

    /// Returns the items that survive all enabled layers plus per-layer
    /// rejection counts, used by the collector's stats (§4.E invariant:
    /// `collected = published + rejected_quality + rejected_dedup`).
    pub async fn filter(
        &self,
        items: Vec<StandardItem>,
        batch_seen: &mut BatchSeen,
        processed: &Container,
        now: DateTime<Utc>,
    ) -> (Vec<StandardItem>, usize) {
        let mut rejected = 0;

        let mut survivors = Vec::with_capacity(items.len());
        for item in items {
            if batch_seen.is_duplicate_or_mark(&item) {
                rejected += 1;
                continue;
            }
            survivors.push(item);
        }

        if self.enable_l2 {
            let before = survivors.len();
            survivors = same_day::filter_same_day(survivors, processed, now).await;
            rejected += before - survivors.len();
        }

        if self.enable_l3 {
            let before = survivors.len();
            let published = historical::load_published_urls(processed).await;
            survivors = historical::filter_historical(survivors, &published);
            rejected += before - survivors.len();
        }

        (survivors, rejected)
    }
}

/// Used to mark which of the survivors must still be recorded as newly
/// published (L3 metadata append happens in the collector after a
/// successful blob write).
pub fn new_seen_set() -> HashSet<String> {
    HashSet::new()
}
