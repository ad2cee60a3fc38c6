//! Dashboard HTTP server over the immutable store.
//!
//! Every handler recomputes its answer from the shared [`Store`] on each
//! request. The tables never change after load, so the handlers take no
//! locks and the responses are always consistent with the loaded data.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use axum::{
    extract::{Query, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper::Error as HyperError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, EnvFilter};

use crate::query::{BookCard, Extremes, QueryEngine, QueryError};
use crate::store::{Book, LoadReport, PredictedRating, Store, Summary, UserId};

#[cfg(feature = "bundled-dashboard")]
mod assets;

/// Runtime options used to boot the dashboard HTTP server.
#[derive(Clone, Debug)]
pub struct DashboardOptions {
    /// Network interface to bind to.
    pub host: IpAddr,
    /// Listening port.
    pub port: u16,
    /// Static asset directory overriding the bundled UI.
    pub assets_dir: Option<PathBuf>,
    /// Allowed CORS origins for remote dashboards.
    pub allow_origins: Vec<String>,
}

impl DashboardOptions {
    /// Convenience accessor for `(host, port)` tuples.
    pub fn socket_parts(&self) -> (IpAddr, u16) {
        (self.host, self.port)
    }
}

/// Errors that can occur while running the dashboard server.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Binding the TCP listener failed.
    #[error("failed to bind dashboard listener: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP server error bubbled up from Axum/Hyper.
    #[error("dashboard server error: {0}")]
    Http(#[from] HyperError),
}

type AppState = Arc<ServerState>;

const MAX_TABLE_ROWS: usize = 1_000;
const DEFAULT_TOP_N: usize = 5;
const MAX_TOP_N: usize = 10;

struct ServerState {
    store: Arc<Store>,
    assets_dir: Option<PathBuf>,
    allow_origins: Vec<String>,
}

/// Starts the dashboard server and runs until shutdown.
pub async fn serve(store: Arc<Store>, options: DashboardOptions) -> Result<(), DashboardError> {
    install_tracing_subscriber();

    let (host, port) = options.socket_parts();
    let app = build_router(store.clone(), &options);
    let addr = SocketAddr::from((host, port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        degraded = store.is_degraded(),
        assets_dir = ?options.assets_dir,
        allow_origins = ?options.allow_origins,
        "dashboard listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Builds the dashboard router over a loaded store.
///
/// Split out of [`serve`] so tests can drive the routes without binding a
/// socket. `options.host`/`options.port` are ignored here.
pub fn build_router(store: Arc<Store>, options: &DashboardOptions) -> Router {
    let state = Arc::new(ServerState {
        store,
        assets_dir: options.assets_dir.clone(),
        allow_origins: options.allow_origins.clone(),
    });
    let cors = build_cors_layer(&state.allow_origins);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/summary", get(summary_handler))
        .route("/api/users", get(users_handler))
        .route("/api/recommendations", get(recommendations_handler))
        .route("/api/extremes", get(extremes_handler))
        .route("/api/books", get(books_handler))
        .route("/api/ratings", get(ratings_handler));

    if let Some(dir) = state.assets_dir.clone() {
        let service = ServeDir::new(dir).append_index_html_on_directories(true);
        router = router.fallback_service(service);
    } else {
        router = with_bundled_ui(router);
    }

    if let Some(layer) = cors {
        router = router.layer(layer);
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}

#[cfg(feature = "bundled-dashboard")]
fn with_bundled_ui(router: Router<AppState>) -> Router<AppState> {
    router.fallback(assets::serve_embedded)
}

#[cfg(not(feature = "bundled-dashboard"))]
fn with_bundled_ui(router: Router<AppState>) -> Router<AppState> {
    router.route("/", get(inline_index))
}

fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let mut allowed = Vec::new();
    for origin in origins {
        let normalized = normalize_origin(origin);
        match normalized
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok())
        {
            Some(value) => allowed.push(value),
            None => {
                tracing::warn!(%origin, ?normalized, "ignoring invalid CORS origin");
            }
        }
    }

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([ACCEPT, CONTENT_TYPE]),
    )
}

fn normalize_origin(origin: &str) -> Option<String> {
    let trimmed = origin.trim();
    if trimmed.is_empty() {
        return None;
    }
    let without_trailing_slash = trimmed.trim_end_matches('/');
    if without_trailing_slash.is_empty() {
        return None;
    }
    Some(without_trailing_slash.to_string())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        degraded: state.store.is_degraded(),
    })
}

#[cfg(not(feature = "bundled-dashboard"))]
async fn inline_index() -> axum::response::Html<&'static str> {
    axum::response::Html(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>Estante Dashboard</title>
    <style>
      body { font-family: system-ui, sans-serif; margin: 3rem; line-height: 1.5; }
      code { background: #f4f4f4; padding: 0.1rem 0.3rem; border-radius: 4px; }
    </style>
  </head>
  <body>
    <main>
      <h1>Estante dashboard UI not bundled</h1>
      <p>
        This build was compiled without the <code>bundled-dashboard</code>
        feature. Pass <code>--assets /path/to/ui</code> to
        <code>cli serve</code> to serve a UI directory, or rebuild with the
        default features.
      </p>
    </main>
  </body>
</html>"#,
    )
}

async fn summary_handler(State(state): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        summary: state.store.summary(),
        degraded: state.store.is_degraded(),
        report: state.store.report().clone(),
    })
}

async fn users_handler(State(state): State<AppState>) -> Json<UserListResponse> {
    Json(UserListResponse {
        users: state.store.user_ids().collect(),
    })
}

async fn recommendations_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Json<RecommendationResponse> {
    let n = params.clamped_n();
    let user = UserId(params.user_id);
    let rows = QueryEngine::new(&state.store).top_n(user, n);
    // Subset extremes are only defined over a non-empty Top-N result.
    let extremes = match Extremes::of(&rows) {
        Ok(extremes) => Some(ExtremesPayload::from(extremes)),
        Err(QueryError::EmptyDataset) => None,
    };
    Json(RecommendationResponse {
        user_id: user,
        n,
        count: rows.len(),
        cards: rows.iter().map(|row| row.to_card()).collect(),
        extremes,
    })
}

async fn extremes_handler(
    State(state): State<AppState>,
) -> Result<Json<ExtremesPayload>, AppError> {
    let extremes = QueryEngine::new(&state.store).extremes_global()?;
    Ok(Json(ExtremesPayload::from(extremes)))
}

async fn books_handler(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Json<TableResponse<Book>> {
    Json(table_slice(state.store.books(), params.clamped_max_rows()))
}

async fn ratings_handler(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Json<TableResponse<PredictedRating>> {
    Json(table_slice(state.store.ratings(), params.clamped_max_rows()))
}

fn table_slice<T: Clone>(rows: &[T], limit: usize) -> TableResponse<T> {
    let total_rows = rows.len();
    let end = limit.min(total_rows);
    TableResponse {
        rows: rows[..end].to_vec(),
        total_rows,
        row_limit: limit,
        truncated: total_rows > end,
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    degraded: bool,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    #[serde(flatten)]
    summary: Summary,
    degraded: bool,
    report: LoadReport,
}

#[derive(Debug, Serialize)]
struct UserListResponse {
    users: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
struct RecommendationParams {
    user_id: u32,
    #[serde(default)]
    n: Option<usize>,
}

impl RecommendationParams {
    fn clamped_n(&self) -> usize {
        self.n.unwrap_or(DEFAULT_TOP_N).clamp(1, MAX_TOP_N)
    }
}

#[derive(Debug, Serialize)]
struct RecommendationResponse {
    user_id: UserId,
    n: usize,
    count: usize,
    cards: Vec<BookCard>,
    extremes: Option<ExtremesPayload>,
}

#[derive(Debug, Serialize)]
struct ExtremesPayload {
    best: BookCard,
    worst: BookCard,
}

impl From<Extremes> for ExtremesPayload {
    fn from(extremes: Extremes) -> Self {
        Self {
            best: extremes.best.to_card(),
            worst: extremes.worst.to_card(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TableParams {
    #[serde(default)]
    max_rows: Option<usize>,
}

impl TableParams {
    fn clamped_max_rows(&self) -> usize {
        self.max_rows
            .map(|value| value.clamp(1, MAX_TABLE_ROWS))
            .unwrap_or(MAX_TABLE_ROWS)
    }
}

#[derive(Debug, Serialize)]
struct TableResponse<T> {
    rows: Vec<T>,
    total_rows: usize,
    row_limit: usize,
    truncated: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Query(QueryError::EmptyDataset) => StatusCode::NOT_FOUND,
        };
        let body = axum::Json(ErrorPayload {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    message: String,
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}

fn install_tracing_subscriber() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
