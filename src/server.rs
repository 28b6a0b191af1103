//! HTTP JSON API.
//!
//! Exposes the analyzer over HTTP so other tools can submit documents and
//! query results without the CLI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/tools/analyze` | `{file_name, text}` → record or error record |
//! | `POST` | `/tools/compare` | `{records, select?}` → comparison report |
//! | `POST` | `/tools/skill_gap` | `{skills}` → covered / missing |
//! | `POST` | `/tools/ask` | `{question, documents: [{file_name, text}]}` → answer |
//!
//! Successful calls return `{"result": ...}`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `embeddings_disabled` (400),
//! `upstream_error` (502), `internal` (500).
//!
//! An analysis whose model output could not be parsed is not an HTTP error:
//! it is returned as a `200` whose result is the error record.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use rfp_analyzer_core::compare::{CompareError, ComparisonReport};
use rfp_analyzer_core::skills::{skill_gap, split_composite};

use crate::analyze::analyze_rfp;
use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::export::records_from_entries;
use crate::intake::inline_documents;
use crate::llm::{create_generator, TextGenerator};
use crate::retriever::RfpRetriever;
use crate::skills::load_internal_skills;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
}

impl AppState {
    pub fn new(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            embedder,
        }
    }
}

/// Starts the HTTP server with the configured generator and embedder.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let generator: Arc<dyn TextGenerator> = Arc::from(create_generator(&config.llm)?);
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
    run_server_with(AppState::new(config.clone(), generator, embedder)).await
}

/// Starts the HTTP server with explicit state.
pub async fn run_server_with(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "server listening");
    println!("RFP analyzer listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/analyze", post(handle_analyze))
        .route("/tools/compare", post(handle_compare))
        .route("/tools/skill_gap", post(handle_skill_gap))
        .route("/tools/ask", post(handle_ask))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn embeddings_disabled() -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "embeddings_disabled",
        message: "ask requires an embedding provider; [embedding].provider is disabled"
            .to_string(),
    }
}

fn upstream_error(err: anyhow::Error) -> AppError {
    tracing::warn!(error = %err, "upstream call failed");
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error",
        message: format!("{:#}", err),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: format!("{:#}", err),
    }
}

fn result(value: impl Serialize) -> Result<Json<Value>, AppError> {
    let value = serde_json::to_value(value).map_err(|e| internal(e.into()))?;
    Ok(Json(json!({ "result": value })))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /tools/analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    file_name: String,
    text: String,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Value>, AppError> {
    if req.file_name.trim().is_empty() {
        return Err(bad_request("file_name must not be empty"));
    }
    let docs = inline_documents(vec![(req.file_name, req.text)]);
    let doc = &docs[0];

    let analysis = analyze_rfp(
        &doc.file_name,
        &doc.text,
        state.generator.as_ref(),
        state.config.llm.extraction_max_tokens,
    )
    .await
    .map_err(upstream_error)?;

    result(analysis)
}

// ============ POST /tools/compare ============

#[derive(Deserialize)]
struct CompareRequest {
    records: Vec<Value>,
    #[serde(default)]
    select: Option<Vec<String>>,
}

async fn handle_compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<Value>, AppError> {
    let records = records_from_entries(req.records);
    let selection = req.select.as_deref().filter(|s| !s.is_empty());

    match ComparisonReport::build(&records, selection, state.config.alerts.thresholds()) {
        Ok(report) => result(report),
        Err(e @ CompareError::TooFewRecords(_)) => result(json!({ "message": e.to_string() })),
        Err(e @ CompareError::EmptySelection) => Err(bad_request(e.to_string())),
    }
}

// ============ POST /tools/skill_gap ============

#[derive(Deserialize)]
struct SkillGapRequest {
    skills: Vec<String>,
}

async fn handle_skill_gap(
    State(state): State<AppState>,
    Json(req): Json<SkillGapRequest>,
) -> Result<Json<Value>, AppError> {
    let internal_skills = load_internal_skills(&state.config.skills.path).map_err(internal)?;
    result(skill_gap(&split_composite(&req.skills), &internal_skills))
}

// ============ POST /tools/ask ============

#[derive(Deserialize)]
struct InlineDocument {
    file_name: String,
    text: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    documents: Vec<InlineDocument>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Value>, AppError> {
    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    if req.documents.is_empty() {
        return Err(bad_request("documents must not be empty"));
    }
    if !state.embedder.is_enabled() {
        return Err(embeddings_disabled());
    }

    let docs = inline_documents(
        req.documents
            .into_iter()
            .map(|d| (d.file_name, d.text))
            .collect(),
    );
    if docs.iter().all(|d| d.text.trim().is_empty()) {
        return Err(bad_request("documents contain no text"));
    }
    let retriever = RfpRetriever::build(&docs, state.embedder.as_ref(), &state.config.retrieval)
        .await
        .map_err(upstream_error)?;

    let answer = retriever
        .ask(
            &req.question,
            state.generator.as_ref(),
            state.config.llm.answer_max_tokens,
        )
        .await
        .map_err(upstream_error)?;

    result(answer)
}
