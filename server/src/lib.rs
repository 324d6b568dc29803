use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use engine::persist::{load_index, IndexPaths};
use engine::query::{evaluate, parse_query};
use engine::report;
use engine::{query_profile, EngineError, IndexStats, Position, PositionalIndex, QueryProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

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
    /// Diagnostic breakdown; omitted when there are no results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<QueryProfile>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc: String,
    pub score: f64,
}

#[derive(Serialize)]
pub struct DocPositions {
    pub doc: String,
    pub positions: Vec<Position>,
}

#[derive(Serialize)]
pub struct TermPostings {
    pub term: String,
    pub df: u32,
    pub idf: f64,
    pub postings: Vec<DocPositions>,
}

/// The index and its statistics are sealed at startup and shared read-only;
/// no locking anywhere on the query path.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<PositionalIndex>,
    pub stats: Arc<IndexStats>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let (index, meta) = load_index(&paths)?;
    let stats = IndexStats::compute(&index);
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        created_at = %meta.created_at,
        "index ready"
    );
    let app_state = AppState {
        index: Arc::new(index),
        stats: Arc::new(stats),
    };

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
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/tables/:name", get(table_handler))
        .route("/terms/:term", get(term_handler))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

/// Phrase and boolean queries share this endpoint; the parser decides which
/// path runs. Invalid queries map to 400, an empty result list does not.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = parse_query(&params.q).map_err(bad_request)?;
    let ranked = evaluate(&state.index, &state.stats, &query).map_err(bad_request)?;
    let profile = if ranked.is_empty() {
        None
    } else {
        Some(query_profile(&state.stats, &query.terms(), &ranked))
    };

    let k = params.k.max(1).min(100);
    let total_hits = ranked.len();
    let results: Vec<SearchHit> = ranked
        .into_iter()
        .take(k)
        .map(|(doc, score)| SearchHit { doc, score })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits,
        results,
        profile,
    }))
}

pub async fn table_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let value = match name.as_str() {
        "tf" => serde_json::to_value(report::tf_rows(&state.index, &state.stats)),
        "wtf" => serde_json::to_value(report::weighted_tf_rows(&state.index, &state.stats)),
        "tfidf" => serde_json::to_value(report::tfidf_rows(&state.index, &state.stats)),
        "normalized" => {
            serde_json::to_value(report::normalized_tfidf_rows(&state.index, &state.stats))
        }
        "dfidf" => {
            let rows = report::df_idf_rows(&state.index, &state.stats).map_err(internal)?;
            serde_json::to_value(rows)
        }
        "lengths" => serde_json::to_value(report::length_rows(&state.index, &state.stats)),
        _ => return Err((StatusCode::NOT_FOUND, format!("unknown table: {name}"))),
    };
    Ok(Json(value.map_err(internal)?))
}

pub async fn term_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<TermPostings>, (StatusCode, String)> {
    if !state.index.contains_term(&term) {
        return Err((StatusCode::NOT_FOUND, format!("term not in vocabulary: {term}")));
    }
    let postings: Vec<DocPositions> = state
        .index
        .documents()
        .iter()
        .filter_map(|doc| {
            let positions = state.index.positions(&term, doc);
            if positions.is_empty() {
                None
            } else {
                Some(DocPositions {
                    doc: doc.clone(),
                    positions: positions.to_vec(),
                })
            }
        })
        .collect();
    let idf = state.stats.idf(&term).map_err(internal)?;
    let df = state.stats.df(&term);
    Ok(Json(TermPostings {
        term,
        df,
        idf,
        postings,
    }))
}

fn bad_request(err: EngineError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn internal(err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
