//! Error types for provider calls and dispatch.

use thiserror::Error;

use crate::classify::FailureKind;

/// A single provider attempt that did not produce usable text.
///
/// Always caught by the dispatcher; never surfaced to callers directly.
#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors that end a whole dispatch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The prompt was rejected before any network activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not a single provider has a credential.
    #[error("no AI providers are configured; set at least one provider API key")]
    NoProvidersConfigured,

    /// Every configured provider was skipped or failed.
    #[error("all AI providers failed: {last_error}")]
    AllProvidersFailed { last_error: String },
}
