use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vecrank_core::{load_corpus, EngineConfig, QueryEngine};

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_docs: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: String,
    pub score: f64,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: String,
    pub norm: f64,
    pub terms: Vec<TermWeight>,
}

#[derive(Serialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub num_docs: usize,
    pub num_terms: usize,
    pub took_s: f64,
}

/// Shared handler state. The engine is an immutable snapshot; a rebuild swaps
/// in a new `Arc` while in-flight queries finish on the old one.
#[derive(Clone)]
pub struct AppState {
    pub corpus_root: PathBuf,
    pub config: EngineConfig,
    pub engine: Arc<RwLock<Arc<QueryEngine>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn load(corpus_root: PathBuf, config: EngineConfig, admin_token: Option<String>) -> Result<Self> {
        let engine = build_engine(&corpus_root, &config)?;
        Ok(Self { corpus_root, config, engine: Arc::new(RwLock::new(Arc::new(engine))), admin_token })
    }

    fn snapshot(&self) -> Arc<QueryEngine> {
        self.engine.read().clone()
    }
}

fn build_engine(corpus_root: &std::path::Path, config: &EngineConfig) -> Result<QueryEngine> {
    let corpus = load_corpus(corpus_root, config.missing_documents)?;
    Ok(QueryEngine::build(&corpus, config))
}

pub fn build_app(corpus_dir: String, config: EngineConfig) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::load(PathBuf::from(corpus_dir), config, admin_token)?;

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

    Ok(router(state).layer(cors).layer(TraceLayer::new_for_http()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/*doc_id", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = Instant::now();
    let engine = state.snapshot();
    let k = params.k.unwrap_or(state.config.top_k).clamp(1, MAX_K);
    let results = engine
        .query(&params.q, k)
        .into_iter()
        .enumerate()
        .map(|(i, hit)| SearchHit { rank: i + 1, doc_id: hit.doc_id, score: hit.score })
        .collect();
    Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_docs: engine.num_docs(), results })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<DocResponse>, StatusCode> {
    let engine = state.snapshot();
    let vector = engine.vector(&doc_id).ok_or(StatusCode::NOT_FOUND)?;
    let mut terms: Vec<TermWeight> = vector.iter().map(|(t, w)| TermWeight { term: t.clone(), weight: w }).collect();
    terms.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.term.cmp(&b.term)));
    Ok(Json(DocResponse { doc_id, norm: vector.norm(), terms }))
}

/// Reload the corpus directory and replace the whole snapshot.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RebuildResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let start = Instant::now();
    let root = state.corpus_root.clone();
    let config = state.config.clone();
    let engine = tokio::task::spawn_blocking(move || build_engine(&root, &config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    let response = RebuildResponse {
        num_docs: engine.num_docs(),
        num_terms: engine.index().num_terms(),
        took_s: start.elapsed().as_secs_f64(),
    };
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs = response.num_docs, num_terms = response.num_terms, "engine snapshot rebuilt");
    Ok(Json(response))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
