//! Common adapter trait: each source is a lazy, cancellable producer of
//! `StandardItem`s (§4.B). Per-target fetch failures are logged and
//! skipped — one bad subreddit/instance/feed never kills the whole batch.

use async_trait::async_trait;
use gazette_core::item::StandardItem;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Collect up to `max_items` standardized items, spread evenly across
    /// this adapter's configured targets.
    async fn collect(&self, fetcher: &gazette_fetch::RateLimitedFetcher, max_items: usize) -> Vec<StandardItem>;
}

/// `max(1, max_items / target_count)` — even per-target quota (§4.B).
pub fn quota_per_target(max_items: usize, target_count: usize) -> usize {
    if target_count == 0 {
        return max_items;
    }
    (max_items / target_count).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_splits_evenly_with_floor_one() {
        assert_eq!(quota_per_target(50, 2), 25);
        assert_eq!(quota_per_target(3, 10), 1);
        assert_eq!(quota_per_target(10, 0), 10);
    }
}
