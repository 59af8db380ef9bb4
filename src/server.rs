//! HTTP API.
//!
//! Exposes the ranked portfolio feed as JSON for the portfolio browser.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/v1/feeds` | Ranked, filtered feed |
//! | `GET`  | `/api/v1/feeds/{username}` | Preview of one visible portfolio |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Feed Query Parameters
//!
//! `techs`, `skills` (repeatable), `yearsOfExperience`, `leetcodeRating`,
//! `sortBy`, `explain`. See [`crate::query`] for parsing rules.
//!
//! # Error Contract
//!
//! ```json
//! { "success": false, "error": { "code": "bad_request", "message": "invalid leetcodeRating: 'x' is not a number" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Internal error details are logged, never returned.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use craftfolio_feed_core::models::FeedPreview;
use craftfolio_feed_core::ranking::{compute_metrics, to_preview};
use craftfolio_feed_core::store::PortfolioStore;

use crate::cache::FeedCache;
use crate::config::Config;
use crate::db;
use crate::query::parse_feed_query;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PortfolioStore>,
    cache: FeedCache,
}

impl AppState {
    pub fn new(store: Arc<dyn PortfolioStore>, cache: FeedCache) -> Self {
        Self { store, cache }
    }
}

/// Starts the HTTP server against the configured SQLite database.
///
/// Binds to `[server].bind` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn PortfolioStore> = Arc::new(SqliteStore::new(pool));
    run_server_with_store(config, store).await
}

/// Starts the HTTP server over an arbitrary [`PortfolioStore`].
pub async fn run_server_with_store(
    config: &Config,
    store: Arc<dyn PortfolioStore>,
) -> anyhow::Result<()> {
    let state = AppState::new(store, FeedCache::new(&config.cache));
    let cache_enabled = state.cache.is_enabled();
    let app = build_router(state, config.server.cors_origin.as_deref())?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        cache = cache_enabled,
        "feed server listening"
    );
    println!("Feed server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("feed server stopped");
    Ok(())
}

/// Assemble routes, CORS, and request tracing.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> anyhow::Result<Router> {
    let origin = match cors_origin {
        None | Some("*") => AllowOrigin::from(Any),
        Some(o) => AllowOrigin::exact(HeaderValue::from_str(o)?),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/v1/feeds", get(handle_feeds))
        .route("/api/v1/feeds/{username}", get(handle_portfolio_preview))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Log the cause and return a generic 500.
fn internal(context: &str, err: anyhow::Error) -> AppError {
    tracing::error!("{}: {:#}", context, err);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: "Internal server error".to_string(),
    }
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

// ============ GET /api/v1/feeds ============

#[derive(Serialize)]
struct FeedsResponse<'a> {
    success: bool,
    feeds: &'a [FeedPreview],
}

/// Handler for `GET /api/v1/feeds`.
///
/// Returns `400` for malformed numeric parameters and `500` if the store
/// read fails. An unknown `sortBy` silently sorts by score.
async fn handle_feeds(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let criteria = parse_feed_query(&pairs).map_err(|e| bad_request(e.to_string()))?;

    let feeds = state
        .cache
        .get_or_load(state.store.as_ref(), &criteria)
        .await
        .map_err(|e| internal("feed query failed", e))?;

    tracing::debug!(
        results = feeds.len(),
        sort = %criteria.sort_key,
        "feed served"
    );

    Ok(Json(FeedsResponse {
        success: true,
        feeds: feeds.as_slice(),
    })
    .into_response())
}

// ============ GET /api/v1/feeds/{username} ============

#[derive(Serialize)]
struct PreviewResponse {
    success: bool,
    feed: FeedPreview,
}

/// Handler for `GET /api/v1/feeds/{username}`.
///
/// Hidden portfolios are reported as not found. Metrics are computed with
/// no filters, so the match factor is always 0.
async fn handle_portfolio_preview(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PreviewResponse>, AppError> {
    let portfolio = state
        .store
        .get_portfolio(&username)
        .await
        .map_err(|e| internal("portfolio lookup failed", e))?
        .filter(|p| p.visible)
        .ok_or_else(|| not_found(format!("no visible portfolio for username: {}", username)))?;

    let metrics = compute_metrics(&portfolio, &BTreeSet::new(), &BTreeSet::new());
    Ok(Json(PreviewResponse {
        success: true,
        feed: to_preview(portfolio, metrics, false),
    }))
}
