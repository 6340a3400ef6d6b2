use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use quarry_core::persist::{load_index, IndexPaths};
use quarry_core::{DocId, EngineConfig, Error, IndexStats, SearchEngine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub index_root: PathBuf,
    pub admin_token: Option<String>,
}

/// Error body shared by every handler: `{ "error": ..., "status": ... }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
    position: Option<usize>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), position: None }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::QuerySyntax { .. } | Error::QueryEmpty => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let position = match &err {
            Error::QuerySyntax { position, .. } => Some(*position),
            _ => None,
        };
        Self { status, message: err.to_string(), position }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message, "status": self.status.as_u16() });
        if let Some(position) = self.position {
            body["position"] = json!(position);
        }
        (self.status, Json(body)).into_response()
    }
}

/// Load the index under `index_dir` and build the router around it.
pub fn build_app(index_dir: impl Into<PathBuf>) -> Result<Router> {
    let index_root = index_dir.into();
    let (index, meta) = load_index(&IndexPaths::new(&index_root))?;
    let config = EngineConfig { tokenizer: meta.tokenizer, ..Default::default() };
    let state = AppState {
        engine: Arc::new(SearchEngine::with_index(config, index)),
        index_root,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let found = state.engine.search(&params.q, k)?;
    let results = found
        .hits
        .into_iter()
        .map(|h| SearchHit {
            doc_id: h.doc_id,
            score: h.score,
            title: h.meta.title,
            url: h.meta.source,
            external_id: h.meta.external_id,
        })
        .collect();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: found.total_hits,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let index = state.engine.snapshot();
    let (Some(meta), Some(length)) = (index.document_meta(doc_id), index.document_length(doc_id)) else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, format!("document {doc_id} not found")));
    };
    Ok(Json(json!({
        "doc_id": doc_id,
        "title": meta.title,
        "url": meta.source,
        "external_id": meta.external_id,
        "length": length,
    })))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.engine.snapshot().stats())
}

/// Re-read the index directory and swap the new snapshot in. Queries
/// already running finish against the old one.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let root = state.index_root.clone();
    let (index, meta) = tokio::task::spawn_blocking(move || load_index(&IndexPaths::new(root)))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    if &meta.tokenizer != state.engine.tokenizer().config() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "index was built with different tokenizer settings; restart the server to load it",
        ));
    }
    let num_docs = index.document_count();
    state.engine.publish(index);
    Ok(Json(json!({ "reloaded": true, "num_docs": num_docs, "created_at": meta.created_at })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::new(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
