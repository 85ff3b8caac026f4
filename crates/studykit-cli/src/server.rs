//! HTTP pass-through for the web front end.
//!
//! Routes:
//! - `POST /api/ai-chat` — `{prompt, provider?}` → `{content, provider}` or `{error}`
//! - `GET  /api/provider-status` — per-provider usage snapshot, for debugging
//! - `POST /api/provider-status/reset[?provider=NAME]` — forget usage for one
//!   provider, or all of them
//! - `GET  /health`

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use studykit_providers::{Completion, DispatchOptions, Dispatcher, ProviderStatus};

type SharedDispatcher = Arc<Dispatcher>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    /// Provider to try first.
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build the router around a shared dispatcher.
pub fn build_router(dispatcher: SharedDispatcher) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/ai-chat", post(ai_chat_handler))
        .route("/api/provider-status", get(provider_status_handler))
        .route("/api/provider-status/reset", post(reset_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Bind and serve until Ctrl+C.
pub async fn run(dispatcher: SharedDispatcher, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "StudyKit server listening");

    axum::serve(listener, build_router(dispatcher))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("server error")
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ai_chat_handler(
    State(dispatcher): State<SharedDispatcher>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Completion>, (StatusCode, Json<ErrorBody>)> {
    let options = DispatchOptions {
        preferred_provider: req.provider,
        ..Default::default()
    };

    dispatcher
        .dispatch(&req.prompt, &options)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "ai-chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: e.to_string() }),
            )
        })
}

async fn provider_status_handler(
    State(dispatcher): State<SharedDispatcher>,
) -> Json<Vec<ProviderStatus>> {
    Json(dispatcher.provider_status())
}

async fn reset_handler(
    State(dispatcher): State<SharedDispatcher>,
    Query(query): Query<ResetQuery>,
) -> Json<Vec<ProviderStatus>> {
    match query.provider.as_deref() {
        Some(name) => {
            info!(provider = name, "Resetting provider usage");
            dispatcher.tracker().reset(name);
        }
        None => {
            info!("Resetting usage for all providers");
            dispatcher.tracker().clear();
        }
    }
    Json(dispatcher.provider_status())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use studykit_providers::{AvailabilityTracker, CompletionProvider, FailureKind, ProviderFailure};
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(&self, prompt: &str) -> Result<String, ProviderFailure> {
            Ok(format!("echo: {prompt}"))
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        fn has_credential(&self) -> bool {
            true
        }
    }

    fn app(providers: Vec<Arc<dyn CompletionProvider>>) -> Router {
        let dispatcher = Dispatcher::new(
            providers,
            Arc::new(AvailabilityTracker::new()),
            Duration::from_secs(5),
        );
        build_router(Arc::new(dispatcher))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ai-chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(vec![]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ai_chat_success() {
        let response = app(vec![Arc::new(EchoProvider)])
            .oneshot(chat_request(r#"{"prompt": "define entropy"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["content"], "echo: define entropy");
        assert_eq!(json["provider"], "echo");
    }

    #[tokio::test]
    async fn test_ai_chat_missing_prompt_is_server_error() {
        let response = app(vec![Arc::new(EchoProvider)])
            .oneshot(chat_request("{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("invalid input"));
    }

    #[tokio::test]
    async fn test_ai_chat_without_providers_is_server_error() {
        let response = app(vec![])
            .oneshot(chat_request(r#"{"prompt": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("no AI providers"));
    }

    #[tokio::test]
    async fn test_provider_status_lists_providers() {
        let req = Request::builder()
            .uri("/api/provider-status")
            .body(Body::empty())
            .unwrap();
        let response = app(vec![Arc::new(EchoProvider)]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "echo");
        assert_eq!(json[0]["configured"], true);
        assert_eq!(json[0]["failureCount"], 0);
    }

    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, ProviderFailure> {
            Err(ProviderFailure::new(FailureKind::RateLimited, "slow down"))
        }

        fn name(&self) -> &str {
            "flaky"
        }

        fn model(&self) -> &str {
            "flaky-1"
        }

        fn has_credential(&self) -> bool {
            true
        }
    }

    fn reset_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_reset_clears_failure_counts() {
        let router = app(vec![Arc::new(FailingProvider), Arc::new(EchoProvider)]);

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(chat_request(r#"{"prompt": "hi"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = router
            .clone()
            .oneshot(reset_request("/api/provider-status/reset?provider=echo"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "flaky");
        assert_eq!(json[0]["failureCount"], 2);
        assert_eq!(json[1]["requestCount"], 0);

        let response = router
            .oneshot(reset_request("/api/provider-status/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["failureCount"], 0);
        assert_eq!(json[0]["lastFailureKind"], serde_json::Value::Null);
    }
}
