//! Wire formats spoken by the supported providers.
//!
//! Each provider family is a [`RequestShape`] variant. Building a request body
//! and pulling the completion text back out are plain `match`es over it.

use serde::Serialize;
use serde_json::Value;

/// Generation parameters shared by every shape.
#[derive(Clone, Debug)]
pub struct RequestParams {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
        }
    }
}

/// The request/response dialect of a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestShape {
    /// OpenAI-compatible `/chat/completions` (OpenAI, Groq, OpenRouter, Together).
    OpenAiChat,
    /// Google Gemini `:generateContent`.
    GeminiGenerate,
    /// Hugging Face hosted inference (`inputs` / `generated_text`).
    HfInference,
}

// ─────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct HfParameters {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub return_full_text: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct HfRequest {
    pub inputs: String,
    pub parameters: HfParameters,
}

/// A request body ready to be sent as JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Chat(ChatRequest),
    Gemini(GeminiRequest),
    Hf(HfRequest),
}

impl RequestShape {
    /// Build the JSON body for a single-turn prompt.
    pub fn build_request(&self, model: &str, prompt: &str, params: &RequestParams) -> RequestBody {
        match self {
            RequestShape::OpenAiChat => RequestBody::Chat(ChatRequest {
                model: model.to_string(),
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                }],
                max_tokens: params.max_tokens,
                temperature: params.temperature,
            }),
            RequestShape::GeminiGenerate => RequestBody::Gemini(GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart {
                        text: prompt.to_string(),
                    }],
                }],
                generation_config: GeminiGenerationConfig {
                    max_output_tokens: params.max_tokens,
                    temperature: params.temperature,
                },
            }),
            RequestShape::HfInference => RequestBody::Hf(HfRequest {
                inputs: prompt.to_string(),
                parameters: HfParameters {
                    max_new_tokens: params.max_tokens,
                    temperature: params.temperature,
                    return_full_text: false,
                },
            }),
        }
    }

    /// Pull the completion text out of a response body.
    ///
    /// Never fails: missing or mistyped fields yield an empty string.
    pub fn extract_content(&self, body: &Value) -> String {
        match self {
            RequestShape::OpenAiChat => body
                .pointer("/choices/0/message/content")
                .or_else(|| body.pointer("/choices/0/text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            RequestShape::GeminiGenerate => body
                .pointer("/candidates/0/content/parts")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .collect::<String>()
                })
                .unwrap_or_default(),
            RequestShape::HfInference => body
                .pointer("/0/generated_text")
                .or_else(|| body.get("generated_text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Header that carries the key in addition to the Bearer token, if any.
    pub fn key_header(&self) -> Option<&'static str> {
        match self {
            RequestShape::GeminiGenerate => Some("x-goog-api-key"),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
