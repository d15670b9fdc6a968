//! In-memory lease registry (§4.F step 1, §3): `TopicState` keyed by
//! `topic_id`, held behind a mutex so concurrently-polled messages for the
//! same topic can't both win the lease. There is no external database in
//! this implementation — a processor instance's registry is its own, and a
//! topic that outlives the process (a crash mid-lease) is recovered purely
//! by the lease's own expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use gazette_core::topic::{ProcessingAttempt, TopicState};

#[derive(Debug, Clone, Default)]
pub struct LeaseRegistry {
    states: Arc<Mutex<HashMap<String, TopicState>>>,
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to acquire the lease for `topic_id`. Returns `false` without
    /// mutating anything if another processor currently holds a valid lease.
    pub async fn try_acquire(&self, topic_id: &str, processor_id: &str, lease_ttl_secs: i64, now: DateTime<Utc>) -> bool {
        let mut states = self.states.lock().await;
        let state = states.entry(topic_id.to_string()).or_insert_with(|| TopicState::new(topic_id));
        state.acquire_lease(processor_id, lease_ttl_secs, now)
    }

    pub async fn release(&self, topic_id: &str) {
        let mut states = self.states.lock().await;
        if let Some(state) = states.get_mut(topic_id) {
            state.release_lease();
        }
    }

    pub async fn record_attempt(&self, topic_id: &str, attempt: ProcessingAttempt) {
        let mut states = self.states.lock().await;
        let state = states.entry(topic_id.to_string()).or_insert_with(|| TopicState::new(topic_id));
        state.record_attempt(attempt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_processor_cannot_acquire_active_lease() {
        let registry = LeaseRegistry::new();
        let now = Utc::now();
        assert!(registry.try_acquire("t1", "proc-a", 300, now).await);
        assert!(!registry.try_acquire("t1", "proc-b", 300, now).await);
    }

    #[tokio::test]
    async fn releasing_frees_the_lease_for_others() {
        let registry = LeaseRegistry::new();
        let now = Utc::now();
        assert!(registry.try_acquire("t1", "proc-a", 300, now).await);
        registry.release("t1").await;
        assert!(registry.try_acquire("t1", "proc-b", 300, now).await);
    }
}
