//! An HTTP front end serving the orchestrator loop.

use std::io;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use toolwright_core::{Orchestrator, RunOutcome};
use tower_http::trace::TraceLayer;

/// The body of an orchestration request.
#[derive(Clone, Debug, Deserialize)]
pub struct OrchestrateRequest {
    /// The user query.
    pub query: String,
    /// The session key recorded in traces and echoed in the outcome.
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_owned()
}

/// Builds the HTTP router.
///
/// The router exposes `POST /api/v1/orchestrate`, answering with the run
/// outcome, and `GET /healthz`. Every request is served by the same
/// orchestrator.
pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/orchestrate", post(orchestrate))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serves the router on `listener` until the process exits.
pub async fn serve(
    listener: TcpListener,
    orchestrator: Arc<Orchestrator>,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, build_router(orchestrator)).await
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn orchestrate(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<OrchestrateRequest>,
) -> Result<Json<RunOutcome>, (StatusCode, Json<Value>)> {
    match orchestrator.run(&request.query, &request.session_id).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            warn!(session_id = %request.session_id, "run aborted: {err}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "status": "error",
                    "session_id": request.session_id,
                    "message": err.to_string(),
                })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use toolwright_core::{OrchestratorBuilder, RunStatus};
    use toolwright_test_model::{PresetResponse, TestModelProvider};
    use tower::ServiceExt;

    use super::*;
    use crate::tools::default_registry;

    fn orchestrator(provider: TestModelProvider) -> Arc<Orchestrator> {
        Arc::new(
            OrchestratorBuilder::with_model_provider(provider)
                .with_registry(default_registry())
                .build(),
        )
    }

    fn orchestrate_request(body: Value) -> Request<Body> {
        Request::post("/api/v1/orchestrate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let router = build_router(orchestrator(TestModelProvider::default()));
        let resp = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_orchestrate() {
        let provider = TestModelProvider::default()
            .with_step(PresetResponse::tool_call(
                "call-1",
                "query_data_statistics",
                r#"{"business_line":"gaming","metric":"sales","date":"2024-05-01"}"#,
            ))
            .with_step(PresetResponse::text("Gaming sales were 80000."));
        let router = build_router(orchestrator(provider));

        let resp = router
            .oneshot(orchestrate_request(json!({
                "query": "gaming sales?",
                "session_id": "web-1",
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let outcome: RunOutcome =
            serde_json::from_value(json_body(resp).await).unwrap();
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.session_id, "web-1");
        assert_eq!(outcome.answer, "Gaming sales were 80000.");
        assert_eq!(outcome.trace[0].tool, "query_data_statistics");
    }

    #[tokio::test]
    async fn test_session_id_defaults() {
        let provider =
            TestModelProvider::default().with_step(PresetResponse::text("hi"));
        let router = build_router(orchestrator(provider));

        let resp = router
            .oneshot(orchestrate_request(json!({ "query": "hello" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["session_id"], "default");
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn test_backend_failure() {
        // No preset steps left, so the first request fails.
        let router = build_router(orchestrator(TestModelProvider::default()));

        let resp = router
            .oneshot(orchestrate_request(json!({ "query": "q" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["session_id"], "default");
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let router = build_router(orchestrator(TestModelProvider::default()));
        let resp = router
            .oneshot(orchestrate_request(json!({ "session_id": "s" })))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_share_one_orchestrator() {
        let mut provider =
            TestModelProvider::default().with_step(PresetResponse::text("ok"));
        provider.set_repeat_last(true);
        provider.set_delay(Duration::from_millis(200));
        let router = build_router(orchestrator(provider.clone()));

        let handles: Vec<_> = (0..3)
            .map(|idx| {
                let router = router.clone();
                tokio::spawn(async move {
                    let resp = router
                        .oneshot(orchestrate_request(json!({
                            "query": "q",
                            "session_id": format!("web-{idx}"),
                        })))
                        .await
                        .unwrap();
                    json_body(resp).await
                })
            })
            .collect();

        for (idx, handle) in handles.into_iter().enumerate() {
            let body = handle.await.unwrap();
            assert_eq!(body["answer"], "ok");
            assert_eq!(body["session_id"], format!("web-{idx}"));
        }
        assert_eq!(provider.requests().len(), 3);
    }
}
