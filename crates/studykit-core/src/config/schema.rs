//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `DispatchConfig`, `ServerConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.studykit/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub dispatch: DispatchConfig,
    pub server: ServerConfig,
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Proactive request ceilings for one provider.
///
/// All three windows are checked against the same counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimits {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

/// Configuration for a single LLM provider (API key, endpoint, model, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for Bearer authentication. Empty means "fall back to the
    /// provider's environment variable".
    #[serde(default)]
    pub api_key: String,
    /// Full endpoint URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
    /// Opt-in proactive rate limiting. `None` relies on failure feedback only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limits: Option<RateLimits>,
}

impl ProviderConfig {
    /// Whether this provider has an API key set in the config itself.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations, one per registry entry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub together: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub huggingface: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openrouter" => Some(&self.openrouter),
            "groq" => Some(&self.groq),
            "together" => Some(&self.together),
            "gemini" => Some(&self.gemini),
            "huggingface" => Some(&self.huggingface),
            "openai" => Some(&self.openai),
            _ => None,
        }
    }

    /// Mutable access by name, used by the env override pass.
    pub fn get_mut_by_name(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "openrouter" => Some(&mut self.openrouter),
            "groq" => Some(&mut self.groq),
            "together" => Some(&mut self.together),
            "gemini" => Some(&mut self.gemini),
            "huggingface" => Some(&mut self.huggingface),
            "openai" => Some(&mut self.openai),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────

/// Settings shared by every provider call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Per-call timeout in seconds. Elapsing counts as a `TIMEOUT` failure.
    pub timeout_secs: u64,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 45,
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP pass-through server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
