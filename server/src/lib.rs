use anyhow::Result;
use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use search_core::{IndexConfig, Retrieval, SearchIndex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub corpus_dir: PathBuf,
    pub index: IndexConfig,
    pub admin_token: Option<String>,
    /// Comma-separated origins; `None` allows any origin.
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Reads `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env(corpus_dir: impl Into<PathBuf>, index: IndexConfig) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            index,
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Deserialize)]
pub struct QueryParams {
    pub q: String,
    #[serde(default)]
    pub exhaustive: bool,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub took_s: f64,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_actual: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upper_bound: Option<f64>,
}

#[derive(Deserialize)]
pub struct WeightParams {
    pub doc: String,
    pub term: String,
}

#[derive(Serialize)]
pub struct WeightResponse {
    pub doc: String,
    pub term: String,
    pub weight: f64,
}

#[derive(Deserialize)]
pub struct IdfParams {
    pub term: String,
}

#[derive(Serialize)]
pub struct IdfResponse {
    pub term: String,
    pub idf: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_docs: u32,
    pub total_terms: usize,
    pub posting_depth: usize,
}

#[derive(Clone)]
pub struct AppState {
    /// Swapped whole on reload; readers clone the inner `Arc` and drop the lock.
    engine: Arc<RwLock<Arc<SearchIndex>>>,
    corpus_dir: PathBuf,
    index_config: IndexConfig,
    admin_token: Option<String>,
}

impl AppState {
    fn engine(&self) -> Arc<SearchIndex> {
        self.engine.read().clone()
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    // Build the index at startup; the server never starts without one
    let engine = SearchIndex::from_directory(&config.corpus_dir, config.index)?;
    let app_state = AppState {
        engine: Arc::new(RwLock::new(Arc::new(engine))),
        corpus_dir: config.corpus_dir.clone(),
        index_config: config.index,
        admin_token: config.admin_token.clone(),
    };

    let cors = match &config.cors_allow_origin {
        Some(val) => {
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
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/query", get(query_handler))
        .route("/weight", get(weight_handler))
        .route("/idf", get(idf_handler))
        .route("/stats", get(stats_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn query_handler(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Json<QueryResponse> {
    let start = std::time::Instant::now();
    let engine = state.engine();
    let result = if params.exhaustive { engine.query_exhaustive(&params.q) } else { engine.query(&params.q) };
    let took_s = start.elapsed().as_secs_f64();

    let response = match result {
        Retrieval::Match { document, score } => QueryResponse {
            query: params.q,
            took_s,
            outcome: "match",
            document: Some(document),
            score,
            max_actual: None,
            max_upper_bound: None,
        },
        Retrieval::NoMatch => QueryResponse {
            query: params.q,
            took_s,
            outcome: "no_match",
            document: None,
            score: 0.0,
            max_actual: None,
            max_upper_bound: None,
        },
        Retrieval::NeedsDeeperScan { max_actual, max_upper_bound } => QueryResponse {
            query: params.q,
            took_s,
            outcome: "needs_deeper_scan",
            document: None,
            score: 0.0,
            max_actual: Some(max_actual),
            max_upper_bound: Some(max_upper_bound),
        },
    };
    Json(response)
}

pub async fn weight_handler(State(state): State<AppState>, Query(params): Query<WeightParams>) -> Json<WeightResponse> {
    let weight = state.engine().weight(&params.doc, &params.term);
    Json(WeightResponse { doc: params.doc, term: params.term, weight })
}

pub async fn idf_handler(State(state): State<AppState>, Query(params): Query<IdfParams>) -> Json<IdfResponse> {
    let idf = state.engine().idf(&params.term);
    Json(IdfResponse { term: params.term, idf })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(stats(&state.engine()))
}

fn stats(engine: &SearchIndex) -> StatsResponse {
    StatsResponse {
        total_docs: engine.index().total_docs(),
        total_terms: engine.index().total_terms(),
        posting_depth: engine.postings().depth(),
    }
}

// --- Admin endpoints ---
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let corpus_dir = state.corpus_dir.clone();
    let config = state.index_config;
    let rebuilt = tokio::task::spawn_blocking(move || SearchIndex::from_directory(&corpus_dir, config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("reload task failed: {e}")))?;
    let engine = match rebuilt {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::warn!(error = %e, "reload failed, keeping current index");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}")));
        }
    };
    let response = stats(&engine);
    *state.engine.write() = engine;
    tracing::info!(total_docs = response.total_docs, "index reloaded");
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
        tracing::warn!("rejected admin request");
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
