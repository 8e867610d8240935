//! HTTP route handlers.
//!
//! A thin marshalling layer over [`AiRouter`]: handlers parse JSON, call
//! the router, and serialize what comes back. Routing decisions and
//! failure policy live entirely in the router, which is why every
//! endpoint here responds 200 with a structured body.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::GroqClient;
use crate::router::{
    AiRouter, ModelCapabilities, ModelRegistry, RouteOutcome, RouterStats, SharedRouter,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub router: SharedRouter,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let mut client = GroqClient::new(config.groq_api_key.clone());
    if let Some(api_url) = &config.groq_api_url {
        client = client.with_api_url(api_url.clone());
    }

    let router = Arc::new(AiRouter::new(
        ModelRegistry::default(),
        Arc::new(client),
        config.router_options(),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        router,
    });
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/models", get(list_models))
        .route("/api/route", post(route_task))
        .route("/api/chat", post(chat))
        .route("/api/stats", get(stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task: String,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RouteSelectionResponse {
    pub model: String,
    pub task_type: String,
    pub complexity: String,
    pub estimated_tokens: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelCapabilities>> {
    Json(state.router.registry().iter().cloned().collect())
}

/// Selection only: which model would handle this task, and why.
async fn route_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TaskRequest>,
) -> Json<RouteSelectionResponse> {
    let analysis = state.router.analyze(&request.task, request.context.as_ref());
    let model = state
        .router
        .select_optimal_model(&request.task, request.context.as_ref())
        .await;
    Json(RouteSelectionResponse {
        model,
        task_type: analysis.task_type.to_string(),
        complexity: analysis.complexity.to_string(),
        estimated_tokens: analysis.estimated_tokens,
    })
}

/// Full pipeline: cache, selection, fallback chain.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TaskRequest>,
) -> Json<RouteOutcome> {
    let request_id = uuid::Uuid::new_v4();
    let outcome = state
        .router
        .process_with_fallback(&request.task, request.context.as_ref())
        .await;
    tracing::info!(
        "Chat request {} served by {} (cached: {})",
        request_id,
        outcome.model_used,
        outcome.cached
    );
    Json(outcome)
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<RouterStats> {
    Json(state.router.stats().await)
}
