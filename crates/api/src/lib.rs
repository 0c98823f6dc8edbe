use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Json, Path as AxumPath, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use resq_agents::TriageAgent;
use resq_classifier::{load_default_model, load_model_from, NaiveBayesModel};
use resq_core::{guidance_catalog, ChatInput, Intent, TriageError};
use resq_observability::AppMetrics;
use resq_storage::Archive;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<TriageAgent<Archive>>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    model: ModelSummary,
    metrics: resq_observability::MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct ModelSummary {
    labels: Vec<String>,
    vocabulary_size: usize,
    document_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    owner_id: Option<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    response_text: String,
    intent: Intent,
    at: chrono::DateTime<chrono::Utc>,
}

/// Router with the model resolved from `RESQ_CORPUS_DIR` / `RESQ_SMOOTHING`.
pub async fn build_default_app() -> Result<Router> {
    build_app_with_model(load_default_model()).await
}

/// Router trained from an explicit corpus directory, default smoothing.
pub async fn build_app(corpus_root: impl AsRef<Path>) -> Result<Router> {
    build_app_with_model(load_model_from(corpus_root, None)).await
}

async fn build_app_with_model(model: NaiveBayesModel) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let archive = if let Ok(database_url) = env::var("RESQ_DATABASE_URL") {
        Archive::sqlite(&database_url).await?
    } else {
        Archive::memory()
    };

    let agent = Arc::new(TriageAgent::new(
        Arc::new(model),
        Arc::new(archive),
        metrics.clone(),
    ));
    let allowed_origins = Arc::new(parse_allowed_origins());

    Ok(build_router(ApiState {
        agent,
        metrics,
        allowed_origins,
    }))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/intents", get(intents))
        .route("/v1/sessions/:session_id/history", get(session_history))
        .route("/v1/sessions/:session_id", delete(session_discard))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let model = state.agent.model();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        model: ModelSummary {
            labels: model
                .labels()
                .into_iter()
                .map(|label| label.to_string())
                .collect(),
            vocabulary_size: model.vocabulary_size(),
            document_count: model.document_count(),
        },
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_id = request
        .session_id
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let input = ChatInput {
        session_id: session_id.clone(),
        owner_id: request.owner_id,
        text: request.text,
    };

    match state.agent.submit_message(input).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ChatResponse {
                session_id,
                response_text: outcome.response_text,
                intent: outcome.intent,
                at: outcome.at,
            }),
        )
            .into_response(),
        Err(TriageError::EmptyMessage) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "empty_message",
                "message": "message text must not be blank"
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "chat_failed",
                "message": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn session_history(
    State(state): State<ApiState>,
    AxumPath(session_id): AxumPath<String>,
) -> impl IntoResponse {
    match state.agent.history(&session_id) {
        Ok(messages) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "session_id": session_id,
                "messages": messages
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "invalid_session",
                "message": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn session_discard(
    State(state): State<ApiState>,
    AxumPath(session_id): AxumPath<String>,
) -> impl IntoResponse {
    match state.agent.discard_session(&session_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "invalid_session",
                "message": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn intents() -> impl IntoResponse {
    let intents = guidance_catalog()
        .into_iter()
        .map(|(intent, guidance)| {
            serde_json::json!({
                "intent": intent,
                "guidance": guidance
            })
        })
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "intents": intents })))
}

fn parse_allowed_origins() -> Vec<String> {
    let default_origins = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ];

    env::var("RESQ_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| {
            default_origins
                .iter()
                .map(|origin| origin.to_string())
                .collect()
        })
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5173")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
