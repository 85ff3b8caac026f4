//! HTTP client for a single provider descriptor.
//!
//! Sends `POST <endpoint>` with Bearer auth and the shape-specific JSON body,
//! classifies non-success responses, and extracts text from success bodies.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use studykit_core::config::schema::RateLimits;
use studykit_core::utils::truncate_string;
use tracing::{debug, warn};

use crate::classify::{classify_failure, FailureKind};
use crate::error::ProviderFailure;
use crate::registry::ProviderDescriptor;
use crate::shape::RequestParams;
use crate::traits::CompletionProvider;

/// How much of an upstream error body ends up in messages and logs.
const ERROR_BODY_LIMIT: usize = 300;

/// Build the shared, connection-pooled HTTP client.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A provider reached over HTTP, described by a [`ProviderDescriptor`].
pub struct HttpProvider {
    client: reqwest::Client,
    descriptor: ProviderDescriptor,
    params: RequestParams,
    /// Descriptor headers, validated once.
    extra_headers: HeaderMap,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.descriptor.display_name)
            .field("endpoint_url", &self.descriptor.endpoint_url)
            .field("model", &self.descriptor.model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider sharing `client`'s connection pool.
    pub fn new(client: reqwest::Client, descriptor: ProviderDescriptor, params: RequestParams) -> Self {
        let mut extra_headers = HeaderMap::new();
        for (key, value) in &descriptor.extra_headers {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                extra_headers.insert(name, val);
            } else {
                warn!(provider = %descriptor.name, "Invalid header: {}={}", key, value);
            }
        }

        HttpProvider {
            client,
            descriptor,
            params,
            extra_headers,
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderFailure> {
        let d = &self.descriptor;
        let Some(credential) = d.credential.as_deref() else {
            return Err(ProviderFailure::new(
                FailureKind::AuthError,
                format!("{} has no credential configured", d.display_name),
            ));
        };

        debug!(
            provider = %d.name,
            model = %d.model,
            prompt_chars = prompt.chars().count(),
            "Calling provider"
        );

        let body = d.shape.build_request(&d.model, prompt, &self.params);
        let mut request = self
            .client
            .post(&d.endpoint_url)
            .bearer_auth(credential)
            .headers(self.extra_headers.clone())
            .json(&body);
        if let Some(header) = d.shape.key_header() {
            request = request.header(header, credential);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let kind = if e.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Network
                };
                return Err(ProviderFailure::new(
                    kind,
                    format!("{} request failed: {}", d.display_name, e),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let kind = classify_failure(status.as_u16(), &error_text);
            return Err(ProviderFailure::new(
                kind,
                format!(
                    "{} returned {}: {}",
                    d.display_name,
                    status,
                    truncate_string(error_text.trim(), ERROR_BODY_LIMIT)
                ),
            ));
        }

        let value: Value = response.json().await.map_err(|e| {
            let kind = if e.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::MalformedResponse
            };
            ProviderFailure::new(
                kind,
                format!("{} sent an unreadable response: {}", d.display_name, e),
            )
        })?;

        let content = d.shape.extract_content(&value);
        debug!(provider = %d.name, chars = content.chars().count(), "Provider responded");
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    fn model(&self) -> &str {
        &self.descriptor.model
    }

    fn has_credential(&self) -> bool {
        self.descriptor.has_credential()
    }

    fn rate_limits(&self) -> Option<RateLimits> {
        self.descriptor.rate_limits
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find_by_name;
    use std::collections::HashMap;
    use studykit_core::config::schema::ProviderConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(name: &str, api_key: &str, endpoint: &str) -> HttpProvider {
        let spec = find_by_name(name).unwrap();
        let config = ProviderConfig {
            api_key: api_key.to_string(),
            api_base: Some(endpoint.to_string()),
            ..Default::default()
        };
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        HttpProvider::new(
            client,
            ProviderDescriptor::from_spec(spec, &config),
            RequestParams::default(),
        )
    }

    async fn mount_error(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_chat_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("Authorization", "Bearer test-key-123"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "messages": [{"role": "user", "content": "Explain osmosis"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": {"role": "assistant", "content": "Osmosis is..."},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = make_provider(
            "groq",
            "test-key-123",
            &format!("{}/v1/chat", mock_server.uri()),
        );
        let content = provider.complete("Explain osmosis").await.unwrap();
        assert_eq!(content, "Osmosis is...");
    }

    #[tokio::test]
    async fn test_sends_static_and_key_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gemini"))
            .and(header("x-goog-api-key", "g-key"))
            .and(header("Authorization", "Bearer g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Bonjour"}]}}]
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider("gemini", "g-key", &format!("{}/gemini", mock_server.uri()));
        assert_eq!(provider.complete("Translate hello").await.unwrap(), "Bonjour");

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Title", "StudyKit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&mock_server)
            .await;
        let provider = make_provider("openrouter", "sk-or", &mock_server.uri());
        assert_eq!(provider.complete("hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_config_extra_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Wait-For-Model", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"generated_text": "hf says hi"}])),
            )
            .mount(&mock_server)
            .await;

        let mut headers = HashMap::new();
        headers.insert("X-Wait-For-Model".to_string(), "true".to_string());
        let config = ProviderConfig {
            api_key: "hf_key".into(),
            api_base: Some(mock_server.uri()),
            extra_headers: Some(headers),
            ..Default::default()
        };
        let provider = HttpProvider::new(
            build_http_client(Duration::from_secs(5)).unwrap(),
            ProviderDescriptor::from_spec(find_by_name("huggingface").unwrap(), &config),
            RequestParams::default(),
        );
        assert_eq!(provider.complete("hi").await.unwrap(), "hf says hi");
    }

    #[tokio::test]
    async fn test_rate_limited_error() {
        let mock_server = MockServer::start().await;
        mount_error(
            &mock_server,
            429,
            r#"{"error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}}"#,
        )
        .await;

        let provider = make_provider("groq", "key", &format!("{}/v1/chat", mock_server.uri()));
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert!(failure.message.contains("429"));
        assert!(failure.message.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_credit_error_from_body() {
        let mock_server = MockServer::start().await;
        mount_error(&mock_server, 400, "Your credit balance is too low").await;

        let provider = make_provider("together", "key", &format!("{}/v1/chat", mock_server.uri()));
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::CreditExhausted);
    }

    #[tokio::test]
    async fn test_long_error_body_truncated() {
        let mock_server = MockServer::start().await;
        mount_error(&mock_server, 500, &"x".repeat(5000)).await;

        let provider = make_provider("openai", "key", &format!("{}/v1/chat", mock_server.uri()));
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unknown);
        assert!(failure.message.len() < 500);
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&mock_server)
            .await;

        let provider = make_provider("openai", "key", &mock_server.uri());
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_empty_content_is_returned_as_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider("openai", "key", &mock_server.uri());
        assert_eq!(provider.complete("hello").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_network_error() {
        // Point to a port that's not listening
        let provider = make_provider("openai", "key", "http://127.0.0.1:1");
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Network);
    }

    #[tokio::test]
    async fn test_client_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({"choices": [{"message": {"content": "late"}}]})),
            )
            .mount(&mock_server)
            .await;

        let spec = find_by_name("openai").unwrap();
        let config = ProviderConfig {
            api_key: "key".into(),
            api_base: Some(mock_server.uri()),
            ..Default::default()
        };
        let provider = HttpProvider::new(
            build_http_client(Duration::from_millis(200)).unwrap(),
            ProviderDescriptor::from_spec(spec, &config),
            RequestParams::default(),
        );
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_missing_credential_never_sends() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let spec = find_by_name("openai").unwrap();
        let config = ProviderConfig {
            api_base: Some(mock_server.uri()),
            ..Default::default()
        };
        let mut descriptor = ProviderDescriptor::from_spec(spec, &config);
        descriptor.credential = None;
        let provider = HttpProvider::new(
            build_http_client(Duration::from_secs(5)).unwrap(),
            descriptor,
            RequestParams::default(),
        );
        assert!(!provider.has_credential());
        let failure = provider.complete("hello").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::AuthError);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let provider = make_provider("openai", "sk-very-secret", "http://localhost");
        let printed = format!("{:?}", provider);
        assert!(!printed.contains("sk-very-secret"));
        assert_eq!(provider.display_name(), "OpenAI");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }
}
