//! Provider registry — static specs for the supported LLM providers.
//!
//! Each `ProviderSpec` describes how to reach one provider: endpoint, default
//! model, env var for its key, and wire format. At startup the specs are
//! combined with user config into [`ProviderDescriptor`]s, which never change
//! afterwards.

use std::fmt;

use studykit_core::config::schema::{ProviderConfig, ProvidersConfig, RateLimits};

use crate::shape::RequestShape;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"groq"`). Also the config key.
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"Groq"`.
    pub display_name: &'static str,
    /// Environment variable holding the API key. E.g. `"GROQ_API_KEY"`.
    pub env_key: &'static str,
    /// Endpoint URL. `{model}` is replaced with the resolved model name.
    pub default_endpoint: &'static str,
    /// Model requested when the config doesn't name one.
    pub default_model: &'static str,
    /// Request/response dialect.
    pub shape: RequestShape,
    /// Headers always sent to this provider.
    pub extra_headers: &'static [(&'static str, &'static str)],
}

impl ProviderSpec {
    /// Endpoint URL with the model substituted in.
    pub fn endpoint_for(&self, model: &str) -> String {
        self.default_endpoint.replace("{model}", model)
    }
}

// ─────────────────────────────────────────────
// All providers (in priority order)
// ─────────────────────────────────────────────

/// Supported provider specifications, in default priority order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. OpenRouter — free community models, asks for attribution headers
    ProviderSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        env_key: "OPENROUTER_API_KEY",
        default_endpoint: "https://openrouter.ai/api/v1/chat/completions",
        default_model: "meta-llama/llama-3.1-8b-instruct:free",
        shape: RequestShape::OpenAiChat,
        extra_headers: &[
            ("HTTP-Referer", "https://studykit.app"),
            ("X-Title", "StudyKit"),
        ],
    },
    // 2. Groq
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        env_key: "GROQ_API_KEY",
        default_endpoint: "https://api.groq.com/openai/v1/chat/completions",
        default_model: "llama-3.1-8b-instant",
        shape: RequestShape::OpenAiChat,
        extra_headers: &[],
    },
    // 3. Together AI
    ProviderSpec {
        name: "together",
        display_name: "Together AI",
        env_key: "TOGETHER_API_KEY",
        default_endpoint: "https://api.together.xyz/v1/chat/completions",
        default_model: "meta-llama/Llama-3.2-3B-Instruct-Turbo",
        shape: RequestShape::OpenAiChat,
        extra_headers: &[],
    },
    // 4. Gemini — model lives in the URL, not the body
    ProviderSpec {
        name: "gemini",
        display_name: "Gemini",
        env_key: "GEMINI_API_KEY",
        default_endpoint:
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
        default_model: "gemini-1.5-flash",
        shape: RequestShape::GeminiGenerate,
        extra_headers: &[],
    },
    // 5. Hugging Face inference
    ProviderSpec {
        name: "huggingface",
        display_name: "Hugging Face",
        env_key: "HUGGINGFACE_API_KEY",
        default_endpoint: "https://api-inference.huggingface.co/models/{model}",
        default_model: "mistralai/Mistral-7B-Instruct-v0.2",
        shape: RequestShape::HfInference,
        extra_headers: &[],
    },
    // 6. OpenAI — paid, last resort
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_endpoint: "https://api.openai.com/v1/chat/completions",
        default_model: "gpt-4o-mini",
        shape: RequestShape::OpenAiChat,
        extra_headers: &[],
    },
];

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

// ─────────────────────────────────────────────
// ProviderDescriptor — resolved, immutable runtime entry
// ─────────────────────────────────────────────

/// Everything needed to call one provider, resolved once at startup.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub display_name: String,
    pub endpoint_url: String,
    /// `None` means the provider is permanently skipped.
    pub credential: Option<String>,
    pub model: String,
    pub shape: RequestShape,
    pub rate_limits: Option<RateLimits>,
    pub extra_headers: Vec<(String, String)>,
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("endpoint_url", &self.endpoint_url)
            .field("model", &self.model)
            .field("shape", &self.shape)
            .field("has_credential", &self.has_credential())
            .finish()
    }
}

impl ProviderDescriptor {
    /// Resolve a descriptor from its spec and the user's config.
    ///
    /// Credential precedence: config `apiKey` > the spec's env var.
    pub fn from_spec(spec: &'static ProviderSpec, config: &ProviderConfig) -> Self {
        Self::resolve(spec, config, std::env::var(spec.env_key).ok())
    }

    fn resolve(spec: &'static ProviderSpec, config: &ProviderConfig, env_key: Option<String>) -> Self {
        let credential = if config.is_configured() {
            Some(config.api_key.clone())
        } else {
            env_key.filter(|k| !k.trim().is_empty())
        };

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| spec.default_model.to_string());

        let endpoint_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.endpoint_for(&model));

        let mut extra_headers: Vec<(String, String)> = spec
            .extra_headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(ref headers) = config.extra_headers {
            extra_headers.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Self {
            name: spec.name.to_string(),
            display_name: spec.display_name.to_string(),
            endpoint_url,
            credential,
            model,
            shape: spec.shape,
            rate_limits: config.rate_limits,
            extra_headers,
        }
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

/// Build descriptors for every registry entry, in priority order.
pub fn build_descriptors(providers: &ProvidersConfig) -> Vec<ProviderDescriptor> {
    PROVIDERS
        .iter()
        .map(|spec| {
            let config = providers.get_by_name(spec.name).cloned().unwrap_or_default();
            ProviderDescriptor::from_spec(spec, &config)
        })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
