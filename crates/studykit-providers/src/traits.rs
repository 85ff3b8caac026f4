//! Completion provider trait — the seam between the dispatcher and HTTP clients.
//!
//! [`HttpProvider`](crate::http_provider::HttpProvider) is the production
//! implementation; tests plug in scripted fakes.

use async_trait::async_trait;
use studykit_core::config::schema::RateLimits;

use crate::error::ProviderFailure;

/// One LLM backend that can turn a prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a single-turn prompt.
    ///
    /// # Returns
    /// The extracted completion text, which may be empty. Deciding that empty
    /// text is a failure is the dispatcher's job.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderFailure>;

    /// Registry name, used as the tracker key.
    fn name(&self) -> &str;

    /// Display name for logs and status output.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Model requested from this provider.
    fn model(&self) -> &str;

    /// Whether a credential is configured. Providers without one are never called.
    fn has_credential(&self) -> bool;

    /// Proactive rate ceilings, if any.
    fn rate_limits(&self) -> Option<RateLimits> {
        None
    }
}
