//! HTTP API server for integration with other systems.
//!
//! Provides JSON endpoints for question answering, source search, and
//! grouping of caller-supplied chunks.

use super::connect;
use crate::aggregate::{try_aggregate, ResourceGroup};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::MortError;
use crate::rag::QaEngine;
use crate::retrieval::RetrievedDocument;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    engine: QaEngine,
    settings: Settings,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = connect(settings.clone()).await?;
    let engine = orchestrator.engine(None);

    let state = Arc::new(AppState { engine, settings });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Mort API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask (RAG)", "POST /ask");
    Output::kv("Search", "POST /search");
    Output::kv("Aggregate", "POST /aggregate");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/aggregate", post(aggregate_documents))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    question: String,
    answer: String,
    retrieved: usize,
    sources: Vec<SourceInfo>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    sources: Vec<SourceInfo>,
}

#[derive(Deserialize)]
struct AggregateRequest {
    /// Absent is an error; an empty list is not.
    #[serde(default)]
    documents: Option<Vec<RetrievedDocument>>,
}

#[derive(Serialize)]
struct SourceInfo {
    title: String,
    short_description: String,
    /// Sanitized description for display.
    description: String,
    parent_url: String,
    moments: Vec<MomentInfo>,
}

#[derive(Serialize)]
struct MomentInfo {
    url: String,
    label: String,
    times: Vec<String>,
}

impl From<&ResourceGroup> for SourceInfo {
    fn from(group: &ResourceGroup) -> Self {
        Self {
            title: group.display_title().to_string(),
            short_description: group.short_description.clone(),
            description: group.description(),
            parent_url: group.parent_url.clone(),
            moments: group
                .child_moments
                .iter()
                .map(|m| MomentInfo {
                    url: m.url.clone(),
                    label: m.label(),
                    times: m.formatted_times(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: MortError) -> Response {
    let status = match &e {
        MortError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        e if e.is_transient() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status != StatusCode::BAD_REQUEST {
        warn!("Request failed: {}", e);
    }
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

fn sources(groups: &[ResourceGroup]) -> Vec<SourceInfo> {
    groups.iter().map(SourceInfo::from).collect()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let top_k = req.top_k.unwrap_or(state.settings.retrieval.top_k);

    match state.engine.ask_with(&req.question, top_k).await {
        Ok(response) => Json(AskResponse {
            sources: sources(&response.sources),
            question: response.question,
            answer: response.answer,
            retrieved: response.retrieved,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    let top_k = req.top_k.unwrap_or(state.settings.retrieval.top_k);

    match state.engine.search(&req.query, top_k).await {
        Ok(groups) => Json(SearchResponse {
            sources: sources(&groups),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn aggregate_documents(Json(req): Json<AggregateRequest>) -> Response {
    match try_aggregate(req.documents.as_deref()) {
        Ok(groups) => Json(SearchResponse {
            sources: sources(&groups),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Completer;
    use crate::config::Prompts;
    use crate::error::Result;
    use crate::retrieval::Retriever;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedRetriever(Vec<RetrievedDocument>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
            Ok(self.0.iter().take(top_k).cloned().collect())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedDocument>> {
            Err(MortError::Retrieval("index unavailable".to_string()))
        }
    }

    struct CannedCompleter;

    #[async_trait]
    impl Completer for CannedCompleter {
        async fn complete(&self, _prompts: &Prompts, context: &[String], _question: &str) -> Result<String> {
            Ok(format!("answered from {} chunks", context.len()))
        }
    }

    fn documents() -> Vec<RetrievedDocument> {
        serde_json::from_value(json!([
            {
                "title": "Rates",
                "short_description": "About rates,today",
                "child_url": "u1",
                "parent_url": "p1",
                "timestamp": "2024-01-01 10:00:00",
                "text": "Rates rose."
            },
            {
                "title": "Rates",
                "short_description": "About rates,today",
                "child_url": "u1",
                "parent_url": "p2",
                "timestamp": "2024-01-01 09:00:00",
                "text": "Rates may fall."
            }
        ]))
        .unwrap()
    }

    fn state(retriever: Arc<dyn Retriever>) -> Arc<AppState> {
        let engine = QaEngine::new(retriever, Arc::new(CannedCompleter))
            .with_retry(crate::retry::RetryPolicy::none());
        Arc::new(AppState {
            engine,
            settings: Settings::default(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_sources() {
        let state = state(Arc::new(FixedRetriever(documents())));
        let response = ask(
            State(state),
            Json(AskRequest {
                question: "rates?".to_string(),
                top_k: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "answered from 2 chunks");
        assert_eq!(body["retrieved"], 2);
        assert_eq!(body["sources"][0]["parent_url"], "p1");
        assert_eq!(body["sources"][0]["description"], "About rates, today");
        assert_eq!(body["sources"][0]["moments"][0]["label"], "09:00:00, 10:00:00");
    }

    #[tokio::test]
    async fn test_ask_empty_question_is_bad_request() {
        let state = state(Arc::new(FixedRetriever(documents())));
        let response = ask(
            State(state),
            Json(AskRequest {
                question: "  ".to_string(),
                top_k: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_bad_gateway() {
        let state = state(Arc::new(FailingRetriever));
        let response = search(
            State(state),
            Json(SearchRequest {
                query: "rates".to_string(),
                top_k: Some(5),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("index unavailable"));
    }

    #[tokio::test]
    async fn test_aggregate_endpoint() {
        let response = aggregate_documents(Json(AggregateRequest {
            documents: Some(documents()),
        }))
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["sources"].as_array().unwrap().len(), 1);
        assert_eq!(body["sources"][0]["moments"][0]["times"], json!(["09:00:00", "10:00:00"]));
    }

    #[tokio::test]
    async fn test_aggregate_without_documents_is_bad_request() {
        let req: AggregateRequest = serde_json::from_value(json!({})).unwrap();
        let response = aggregate_documents(Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req: AggregateRequest = serde_json::from_value(json!({ "documents": [] })).unwrap();
        let response = aggregate_documents(Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn spawn_server(state: Arc<AppState>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_raw(base: &str, route: &str, body: &'static str) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}{}", base, route))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_aggregate_route_tolerates_null_and_numeric_fields() {
        let base = spawn_server(state(Arc::new(FixedRetriever(Vec::new())))).await;

        let (status, body) = post_raw(
            &base,
            "/aggregate",
            r#"{"documents":[
                {"title":"  Rates ","short_description":"About rates","child_url":"u1","parent_url":"p1","timestamp":null},
                {"title":"  Rates ","short_description":"About rates","child_url":"u1","parent_url":"p2","timestamp":1704067200},
                {"title":"  Rates ","short_description":"About rates","child_url":"u2","parent_url":"p3","timestamp":"2024-01-01 08:30:00","score":"high"}
            ]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let source = &body["sources"][0];
        assert_eq!(body["sources"].as_array().unwrap().len(), 1);
        assert_eq!(source["title"], "Rates");
        assert_eq!(source["parent_url"], "p1");
        assert_eq!(source["moments"][0]["times"], json!(["00:00:00"]));
        assert_eq!(source["moments"][1]["times"], json!(["08:30:00"]));
    }

    #[tokio::test]
    async fn test_aggregate_route_requires_document_list() {
        let base = spawn_server(state(Arc::new(FixedRetriever(Vec::new())))).await;

        let (status, body) = post_raw(&base, "/aggregate", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("no document list"));
    }

    #[tokio::test]
    async fn test_ask_route_rejects_oversized_top_k() {
        let base = spawn_server(state(Arc::new(FixedRetriever(documents())))).await;

        let (status, body) = post_raw(&base, "/ask", r#"{"question":"rates?","top_k":100000}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("top_k"));
    }
}
