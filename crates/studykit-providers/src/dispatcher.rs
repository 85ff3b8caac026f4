//! Dispatcher — ordered failover across providers.
//!
//! One dispatch tries providers one at a time in priority order and returns
//! the first non-empty completion. Per-provider failures are classified,
//! recorded in the [`AvailabilityTracker`], logged, and swallowed; only total
//! exhaustion reaches the caller. There are no retries within a provider and
//! no sleeps between providers: cooldowns act across dispatches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use studykit_core::config::Config;
use tracing::{debug, info, warn};

use crate::classify::FailureKind;
use crate::error::{DispatchError, ProviderFailure};
use crate::http_provider::{build_http_client, HttpProvider};
use crate::registry::build_descriptors;
use crate::shape::RequestParams;
use crate::tracker::{AvailabilityTracker, Outcome};
use crate::traits::CompletionProvider;

/// A successful dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub content: String,
    /// Name of the provider that produced `content`.
    pub provider: String,
}

/// Per-call options.
#[derive(Clone, Debug, Default)]
pub struct DispatchOptions {
    /// Provider to try first. Unknown names are ignored.
    pub preferred_provider: Option<String>,
    /// Reserved. Accepted for API compatibility and currently ignored.
    pub max_retries: Option<u32>,
}

impl DispatchOptions {
    pub fn prefer(provider: impl Into<String>) -> Self {
        Self {
            preferred_provider: Some(provider.into()),
            ..Default::default()
        }
    }
}

/// Debug snapshot of one provider, as served by the status endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub display_name: String,
    pub model: String,
    pub configured: bool,
    pub available: bool,
    pub request_count: u32,
    pub failure_count: u32,
    pub last_failure_kind: Option<FailureKind>,
    pub credit_exhausted: bool,
    pub last_request_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub cooldown_remaining_secs: Option<i64>,
}

/// Multi-provider dispatcher.
pub struct Dispatcher {
    providers: Vec<Arc<dyn CompletionProvider>>,
    tracker: Arc<AvailabilityTracker>,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over `providers` (in priority order).
    pub fn new(
        providers: Vec<Arc<dyn CompletionProvider>>,
        tracker: Arc<AvailabilityTracker>,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            tracker,
            timeout,
        }
    }

    /// Build HTTP providers for every registry entry from `config`, with a
    /// fresh tracker.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.dispatch.timeout_secs);
        let client = build_http_client(timeout)?;
        let params = RequestParams {
            max_tokens: config.dispatch.max_tokens,
            temperature: config.dispatch.temperature,
        };

        let providers: Vec<Arc<dyn CompletionProvider>> = build_descriptors(&config.providers)
            .into_iter()
            .map(|d| {
                Arc::new(HttpProvider::new(client.clone(), d, params.clone()))
                    as Arc<dyn CompletionProvider>
            })
            .collect();

        let configured = providers.iter().filter(|p| p.has_credential()).count();
        debug!(total = providers.len(), configured, "Dispatcher ready");

        Ok(Self::new(
            providers,
            Arc::new(AvailabilityTracker::new()),
            timeout,
        ))
    }

    pub fn tracker(&self) -> &Arc<AvailabilityTracker> {
        &self.tracker
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Priority order with `preferred` moved to the front, if known.
    fn ordered(&self, preferred: Option<&str>) -> Vec<&Arc<dyn CompletionProvider>> {
        let mut order: Vec<&Arc<dyn CompletionProvider>> = self.providers.iter().collect();
        if let Some(name) = preferred {
            match order.iter().position(|p| p.name() == name) {
                Some(idx) => {
                    let first = order.remove(idx);
                    order.insert(0, first);
                }
                None => debug!(provider = name, "Unknown preferred provider, ignoring"),
            }
        }
        order
    }

    /// Produce a completion for `prompt`, trying providers until one succeeds.
    pub async fn dispatch(
        &self,
        prompt: &str,
        options: &DispatchOptions,
    ) -> Result<Completion, DispatchError> {
        if prompt.is_empty() {
            return Err(DispatchError::InvalidInput(
                "prompt must be a non-empty string".to_string(),
            ));
        }

        let mut configured = 0usize;
        let mut last_error: Option<String> = None;

        for provider in self.ordered(options.preferred_provider.as_deref()) {
            let name = provider.name();

            if !provider.has_credential() {
                debug!(provider = name, "Skipping provider without credential");
                continue;
            }
            configured += 1;

            if !self
                .tracker
                .is_available(name, provider.rate_limits().as_ref())
            {
                debug!(provider = name, "Skipping unavailable provider");
                continue;
            }

            let result = match tokio::time::timeout(self.timeout, provider.complete(prompt)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderFailure::new(
                    FailureKind::Timeout,
                    format!(
                        "{} timed out after {}s",
                        provider.display_name(),
                        self.timeout.as_secs()
                    ),
                )),
            };

            let failure = match result {
                Ok(content) if !content.trim().is_empty() => {
                    self.tracker.record_outcome(name, Outcome::Success);
                    info!(provider = name, "Completion served");
                    return Ok(Completion {
                        content,
                        provider: name.to_string(),
                    });
                }
                Ok(_) => ProviderFailure::new(
                    FailureKind::EmptyResponse,
                    format!("{} returned an empty response", provider.display_name()),
                ),
                Err(failure) => failure,
            };

            self.tracker
                .record_outcome(name, Outcome::Failure(failure.kind));
            warn!(
                provider = name,
                kind = %failure.kind,
                error = %failure.message,
                "Provider failed, trying next"
            );
            last_error = Some(failure.message);
        }

        if configured == 0 {
            return Err(DispatchError::NoProvidersConfigured);
        }

        Err(DispatchError::AllProvidersFailed {
            last_error: last_error.unwrap_or_else(|| {
                "every configured provider is cooling down or rate limited".to_string()
            }),
        })
    }

    /// Usage and availability of every provider, in priority order.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        let now = Utc::now();
        self.providers
            .iter()
            .map(|p| {
                let usage = self.tracker.usage(p.name()).unwrap_or_default();
                let limits = p.rate_limits();
                ProviderStatus {
                    name: p.name().to_string(),
                    display_name: p.display_name().to_string(),
                    model: p.model().to_string(),
                    configured: p.has_credential(),
                    available: p.has_credential()
                        && self.tracker.is_available_at(p.name(), limits.as_ref(), now),
                    request_count: usage.request_count,
                    failure_count: usage.failure_count,
                    last_failure_kind: usage.last_failure_kind,
                    credit_exhausted: usage.credit_exhausted,
                    last_request_at: usage.last_request_at,
                    last_failure_at: usage.last_failure_at,
                    cooldown_remaining_secs: usage.cooldown_remaining(now).map(|d| d.num_seconds()),
                }
            })
            .collect()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
