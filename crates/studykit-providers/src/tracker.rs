//! Availability tracker — per-provider usage and failure accounting.
//!
//! Decides, before a network round trip is spent, whether a provider is worth
//! trying. State lives in memory for the lifetime of the tracker; nothing is
//! persisted.
//!
//! The request window is a lazy approximation: once a minute has passed since
//! the last request, the counter counts as zero. The hour and day ceilings are
//! checked against that same counter, so exceeding any one of them blocks the
//! provider until the minute counter rolls over.
//!
//! Every method has an `*_at` form taking an explicit `now`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use studykit_core::config::schema::RateLimits;
use tracing::debug;

use crate::classify::FailureKind;

/// Failures beyond this count put a provider into cooldown.
pub const COOLDOWN_THRESHOLD: u32 = 3;

/// Result of one provider attempt, as recorded by the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureKind),
}

/// Mutable usage record for one provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUsage {
    pub request_count: u32,
    pub last_request_at: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_failure_kind: Option<FailureKind>,
    pub credit_exhausted: bool,
}

impl ProviderUsage {
    fn minute() -> Duration {
        Duration::minutes(1)
    }

    /// Requests counted in the current minute window.
    fn window_count(&self, now: DateTime<Utc>) -> u32 {
        match self.last_request_at {
            Some(at) if now - at < Self::minute() => self.request_count,
            _ => 0,
        }
    }

    fn within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.last_request_at.is_some_and(|at| now - at < window)
    }

    fn hits_ceiling(&self, limits: &RateLimits, now: DateTime<Utc>) -> bool {
        let count = self.window_count(now);
        count >= limits.per_minute
            || (self.within(now, Duration::hours(1)) && count >= limits.per_hour)
            || (self.within(now, Duration::days(1)) && count >= limits.per_day)
    }

    /// Time left in cooldown, if the provider is in one.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.failure_count <= COOLDOWN_THRESHOLD {
            return None;
        }
        let failed_at = self.last_failure_at?;
        let cooldown = self
            .last_failure_kind
            .unwrap_or(FailureKind::Unknown)
            .cooldown();
        let elapsed = now - failed_at;
        (elapsed < cooldown).then(|| cooldown - elapsed)
    }

    fn record(&mut self, outcome: Outcome, now: DateTime<Utc>) {
        self.request_count = self.window_count(now) + 1;
        self.last_request_at = Some(now);

        match outcome {
            Outcome::Success => {
                self.failure_count = 0;
                self.credit_exhausted = false;
                self.last_failure_kind = None;
            }
            Outcome::Failure(kind) => {
                self.failure_count += 1;
                self.last_failure_at = Some(now);
                self.last_failure_kind = Some(kind);
                if kind.is_credit_exhausted() {
                    self.credit_exhausted = true;
                }
            }
        }
    }
}

/// Thread-safe map of provider name → [`ProviderUsage`].
///
/// Entries are created lazily on the first recorded outcome; a provider with
/// no entry has never been used and is available.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    usage: Mutex<HashMap<String, ProviderUsage>>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ProviderUsage>> {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `name` may be tried right now.
    pub fn is_available(&self, name: &str, limits: Option<&RateLimits>) -> bool {
        self.is_available_at(name, limits, Utc::now())
    }

    /// [`is_available`](Self::is_available) at an explicit instant.
    pub fn is_available_at(
        &self,
        name: &str,
        limits: Option<&RateLimits>,
        now: DateTime<Utc>,
    ) -> bool {
        let entries = self.entries();
        let Some(usage) = entries.get(name) else {
            return true;
        };

        if let Some(limits) = limits {
            if usage.hits_ceiling(limits, now) {
                debug!(provider = name, count = usage.request_count, "rate ceiling reached");
                return false;
            }
        }

        if let Some(remaining) = usage.cooldown_remaining(now) {
            debug!(
                provider = name,
                remaining_secs = remaining.num_seconds(),
                "provider cooling down"
            );
            return false;
        }

        true
    }

    /// Record the outcome of one attempt.
    pub fn record_outcome(&self, name: &str, outcome: Outcome) {
        self.record_outcome_at(name, outcome, Utc::now());
    }

    /// [`record_outcome`](Self::record_outcome) at an explicit instant.
    pub fn record_outcome_at(&self, name: &str, outcome: Outcome, now: DateTime<Utc>) {
        self.entries()
            .entry(name.to_string())
            .or_default()
            .record(outcome, now);
    }

    /// Snapshot of one provider's usage.
    pub fn usage(&self, name: &str) -> Option<ProviderUsage> {
        self.entries().get(name).cloned()
    }

    /// Time left in cooldown for `name` at `now`.
    pub fn cooldown_remaining_at(&self, name: &str, now: DateTime<Utc>) -> Option<Duration> {
        self.entries().get(name)?.cooldown_remaining(now)
    }

    /// Forget everything about one provider.
    pub fn reset(&self, name: &str) {
        self.entries().remove(name);
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.entries().clear();
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
