//! Single cron trigger with cooldown (§4.J): one schedule, not a per-rule
//! map, since the orchestrator only ever drives one collection cycle.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::warn;

/// Prepend a "0" seconds field to a standard 5-field cron expression; the
/// `cron` crate requires 6 fields, `SchedulerConfig::cron_expression` is
/// written in ordinary 5-field form.
pub fn normalize_cron(cron_5field: &str) -> String {
    let trimmed = cron_5field.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// A schedule is due if its most recent tick falls in `(last_run, now]`;
/// with no prior run, any tick at or before `now` counts.
fn is_cron_due(schedule: &Schedule, now: DateTime<Utc>, last_run: Option<DateTime<Utc>>) -> bool {
    let check_from = last_run.unwrap_or(now - chrono::Duration::days(1));
    schedule.after(&check_from).next().is_some_and(|next| next <= now)
}

pub struct CronTrigger {
    schedule: Schedule,
    cooldown: Duration,
    last_triggered: Option<DateTime<Utc>>,
}

impl CronTrigger {
    pub fn new(cron_expression: &str, cooldown: Duration) -> Option<Self> {
        let normalized = normalize_cron(cron_expression);
        match Schedule::from_str(&normalized) {
            Ok(schedule) => Some(Self { schedule, cooldown, last_triggered: None }),
            Err(e) => {
                warn!(cron = %cron_expression, error = %e, "invalid cron expression, orchestrator's cron trigger is disabled");
                None
            }
        }
    }

    /// Whether a new collection cycle should fire at `now`.
    pub fn due(&self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_triggered {
            let elapsed = now.signed_duration_since(last);
            if elapsed < chrono::Duration::from_std(self.cooldown).unwrap_or(chrono::Duration::zero()) {
                return false;
            }
        }
        is_cron_due(&self.schedule, now, self.last_triggered)
    }

    pub fn record_trigger_at(&mut self, now: DateTime<Utc>) {
        self.last_triggered = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cron_prepends_seconds_field() {
        assert_eq!(normalize_cron("0 */4 * * *"), "0 0 */4 * * *");
    }

    #[test]
    fn normalize_cron_passes_through_six_field() {
        assert_eq!(normalize_cron("0 0 */4 * * *"), "0 0 */4 * * *");
    }

    #[test]
    fn never_triggered_is_due_immediately() {
        let trigger = CronTrigger::new("* * * * *", Duration::from_secs(0)).unwrap();
        assert!(trigger.due(Utc::now()));
    }

    #[test]
    fn just_triggered_is_not_due_again_within_the_same_minute() {
        let mut trigger = CronTrigger::new("* * * * *", Duration::from_secs(0)).unwrap();
        let now = Utc::now();
        trigger.record_trigger_at(now);
        assert!(!trigger.due(now));
    }

    #[test]
    fn cooldown_suppresses_an_otherwise_due_cron_tick() {
        let mut trigger = CronTrigger::new("* * * * *", Duration::from_secs(3600)).unwrap();
        let now = Utc::now();
        trigger.record_trigger_at(now);
        let five_min_later = now + chrono::Duration::minutes(5);
        assert!(!trigger.due(five_min_later));
    }

    #[test]
    fn invalid_cron_expression_disables_the_trigger() {
        assert!(CronTrigger::new("not a cron expression", Duration::from_secs(0)).is_none());
    }
}
