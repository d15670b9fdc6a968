//! In-memory topic processing state held by the topic processor (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingAttempt {
    pub attempt_id: String,
    pub processor_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
    pub tokens_used: u64,
    pub cost_usd: f64,
    pub quality_score: Option<f64>,
    pub word_count: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicState {
    pub topic_id: String,
    pub status: TopicStatus,
    pub attempts: Vec<ProcessingAttempt>,
    pub current_lease: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
}

impl TopicState {
    pub fn new(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            status: TopicStatus::Pending,
            attempts: Vec::new(),
            current_lease: None,
            lease_expires_at: None,
            total_cost_usd: 0.0,
            total_tokens: 0,
        }
    }

    /// Whether a lease currently held by someone other than `processor_id`
    /// is still valid (§4.F step 1).
    pub fn has_foreign_active_lease(&self, processor_id: &str, now: DateTime<Utc>) -> bool {
        match (&self.current_lease, self.lease_expires_at) {
            (Some(holder), Some(expires)) if holder != processor_id => expires > now,
            _ => false,
        }
    }

    /// Attempt to acquire the lease for `processor_id`. Returns `false` if
    /// another processor's lease is still active.
    pub fn acquire_lease(&mut self, processor_id: &str, lease_ttl_secs: i64, now: DateTime<Utc>) -> bool {
        if self.has_foreign_active_lease(processor_id, now) {
            return false;
        }
        self.current_lease = Some(processor_id.to_string());
        self.lease_expires_at = Some(now + chrono::Duration::seconds(lease_ttl_secs));
        self.status = TopicStatus::Processing;
        true
    }

    pub fn release_lease(&mut self) {
        self.current_lease = None;
        self.lease_expires_at = None;
    }

    pub fn record_attempt(&mut self, attempt: ProcessingAttempt) {
        self.total_cost_usd += attempt.cost_usd;
        self.total_tokens += attempt.tokens_used;
        self.status = match attempt.status {
            AttemptStatus::Succeeded => TopicStatus::Completed,
            AttemptStatus::Failed => TopicStatus::Failed,
        };
        self.attempts.push(attempt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn acquire_lease_succeeds_when_free() {
        let mut state = TopicState::new("t1");
        assert!(state.acquire_lease("proc-a", 300, now()));
        assert_eq!(state.current_lease.as_deref(), Some("proc-a"));
    }

    #[test]
    fn acquire_lease_fails_against_foreign_active_lease() {
        let mut state = TopicState::new("t1");
        assert!(state.acquire_lease("proc-a", 300, now()));
        assert!(!state.acquire_lease("proc-b", 300, now()));
    }

    #[test]
    fn acquire_lease_succeeds_after_expiry() {
        let mut state = TopicState::new("t1");
        let past = now() - chrono::Duration::seconds(600);
        assert!(state.acquire_lease("proc-a", 300, past));
        assert!(state.acquire_lease("proc-b", 300, now()));
    }

    #[test]
    fn record_attempt_accumulates_totals() {
        let mut state = TopicState::new("t1");
        state.record_attempt(ProcessingAttempt {
            attempt_id: "a1".into(),
            processor_id: "p1".into(),
            started_at: now(),
            completed_at: Some(now()),
            status: AttemptStatus::Succeeded,
            tokens_used: 100,
            cost_usd: 0.01,
            quality_score: Some(0.8),
            word_count: Some(500),
            error: None,
        });
        assert_eq!(state.total_tokens, 100);
        assert_eq!(state.status, TopicStatus::Completed);
    }
}
