//! Failure kinds and classification of provider HTTP errors.
//!
//! Upstream error formats vary wildly between providers, so classification is
//! a best-effort heuristic: status codes first, then case-insensitive
//! substrings of the response body.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a single provider attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    RateLimited,
    /// Billing, quota, or credit exhaustion. Earns the long cooldown.
    CreditExhausted,
    AuthError,
    Forbidden,
    ModelDecommissioned,
    Unknown,
    /// HTTP 200 whose extracted text was empty.
    EmptyResponse,
    /// HTTP 200 whose body was not JSON.
    MalformedResponse,
    /// The per-call timeout elapsed.
    Timeout,
    /// Connection refused, DNS failure, TLS error, ...
    Network,
}

const ORDINARY_COOLDOWN_MINUTES: i64 = 5;
const CREDIT_COOLDOWN_MINUTES: i64 = 30;

impl FailureKind {
    /// Stable tag used in logs and status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "RATE_LIMITED",
            FailureKind::CreditExhausted => "CREDIT_EXHAUSTED",
            FailureKind::AuthError => "AUTH_ERROR",
            FailureKind::Forbidden => "FORBIDDEN",
            FailureKind::ModelDecommissioned => "MODEL_DECOMMISSIONED",
            FailureKind::Unknown => "UNKNOWN",
            FailureKind::EmptyResponse => "EMPTY_RESPONSE",
            FailureKind::MalformedResponse => "MALFORMED_RESPONSE",
            FailureKind::Timeout => "TIMEOUT",
            FailureKind::Network => "NETWORK",
        }
    }

    /// Whether this kind marks the provider's credit as exhausted.
    pub fn is_credit_exhausted(&self) -> bool {
        matches!(self, FailureKind::CreditExhausted)
    }

    /// How long a provider stays excluded once it crosses the failure threshold
    /// with this as its most recent failure.
    pub fn cooldown(&self) -> chrono::Duration {
        if self.is_credit_exhausted() {
            chrono::Duration::minutes(CREDIT_COOLDOWN_MINUTES)
        } else {
            chrono::Duration::minutes(ORDINARY_COOLDOWN_MINUTES)
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "too many requests"];
const CREDIT_MARKERS: &[&str] = &[
    "quota",
    "credit",
    "billing",
    "insufficient funds",
    "payment required",
];
const AUTH_MARKERS: &[&str] = &["unauthorized"];
const FORBIDDEN_MARKERS: &[&str] = &["forbidden"];
const DECOMMISSIONED_MARKERS: &[&str] = &["decommissioned", "deprecated"];

/// Classify a non-success HTTP response.
///
/// Status codes win over body text; body markers are checked in table order.
pub fn classify_failure(status: u16, body: &str) -> FailureKind {
    match status {
        429 => return FailureKind::RateLimited,
        402 => return FailureKind::CreditExhausted,
        401 => return FailureKind::AuthError,
        403 => return FailureKind::Forbidden,
        _ => {}
    }

    let body = body.to_lowercase();
    let table: &[(&[&str], FailureKind)] = &[
        (RATE_LIMIT_MARKERS, FailureKind::RateLimited),
        (CREDIT_MARKERS, FailureKind::CreditExhausted),
        (AUTH_MARKERS, FailureKind::AuthError),
        (FORBIDDEN_MARKERS, FailureKind::Forbidden),
        (DECOMMISSIONED_MARKERS, FailureKind::ModelDecommissioned),
    ];

    table
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| body.contains(m)))
        .map(|(_, kind)| *kind)
        .unwrap_or(FailureKind::Unknown)
}
