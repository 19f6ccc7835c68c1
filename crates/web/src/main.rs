mod error;
mod metrics;
mod models;
mod views;

use anyhow::Result;
use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use common::config::{Config, Leaderboard, Profile};
use common::source::ConfiguredSource;
use common::store::{LoadState, TraderStore};
use common::types::TradeRecord;
use error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use models::{LeaderboardView, ProfileView};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use views::{LeaderboardParams, LeaderboardQuery, ProfileParams, ProfileQuery};

pub struct AppState {
    pub store: TraderStore,
    pub leaderboard: Leaderboard,
    pub profile: Profile,
    pub prometheus: Option<PrometheusHandle>,
    pub clock: fn() -> DateTime<Utc>,
}

impl AppState {
    /// The loaded record set, or the status page to show instead.
    fn records(&self) -> Result<Arc<[TradeRecord]>, AppError> {
        match self.store.snapshot() {
            LoadState::Ready(records) => Ok(records),
            LoadState::Loading => Err(AppError::loading()),
            LoadState::Failed(msg) => Err(AppError::unavailable(format!(
                "Failed to load traders: {msg}"
            ))),
        }
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "leaderboard.html")]
struct LeaderboardPage {
    view: LeaderboardView,
}

#[derive(Template)]
#[template(path = "partials/leaderboard_table.html")]
struct LeaderboardTable {
    view: LeaderboardView,
}

#[derive(Template)]
#[template(path = "trader.html")]
struct TraderPage {
    view: ProfileView,
}

// --- Handlers ---

async fn index(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Html<String>, AppError> {
    let records = state.records()?;
    let params = LeaderboardParams::resolve(&q, &state.leaderboard);
    let view = views::leaderboard_view(
        &records,
        &params,
        state.leaderboard.page_size,
        (state.clock)(),
    );
    Ok(Html(LeaderboardPage { view }.render()?))
}

async fn leaderboard_partial(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LeaderboardQuery>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let records = state.records().map_err(|e| e.fragment(&uri))?;
    let params = LeaderboardParams::resolve(&q, &state.leaderboard);
    let view = views::leaderboard_view(
        &records,
        &params,
        state.leaderboard.page_size,
        (state.clock)(),
    );
    Ok(Html(LeaderboardTable { view }.render()?))
}

async fn trader(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
    Query(q): Query<ProfileQuery>,
) -> Result<Html<String>, AppError> {
    let records = state.records()?;
    let params = ProfileParams::resolve(&q, &state.profile, state.leaderboard.default_window);
    let view = views::profile_view(
        &records,
        &wallet,
        &params,
        state.profile.page_size,
        (state.clock)(),
    )
    .ok_or_else(|| AppError::not_found("Trader not found"))?;
    Ok(Html(TraderPage { view }.render()?))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    let records = match &snapshot {
        LoadState::Ready(records) => records.len(),
        LoadState::Loading | LoadState::Failed(_) => 0,
    };
    let code = if snapshot.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: snapshot.as_str(),
            version: env!("CARGO_PKG_VERSION"),
            records,
        }),
    )
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    let Some(handle) = state.prometheus.as_ref() else {
        return (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response();
    };
    handle.run_upkeep();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

// --- Router ---

pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/partials/leaderboard", get(leaderboard_partial))
        .route("/trader/{wallet}", get(trader))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "listening for ctrl-c failed");
    }
    tracing::info!("shutting down");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _otel_guard =
        common::observability::init_global("potion-web", &config.general.log_level)?;
    let prometheus = metrics::init_global()?;

    let source = ConfiguredSource::from_config(&config.source)?;
    let store = TraderStore::new();
    let cancel = CancellationToken::new();
    let load_task = store.spawn_load(source, cancel.clone());

    let web = config.web_or_default();
    let state = Arc::new(AppState {
        store,
        leaderboard: config.leaderboard.clone(),
        profile: config.profile.clone(),
        prometheus: Some(prometheus),
        clock: Utc::now,
    });

    let app = create_router_with_state(state);
    let addr: SocketAddr = format!("{}:{}", web.host, web.port).parse()?;
    tracing::info!(%addr, "leaderboard listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    if let Err(e) = load_task.await {
        tracing::warn!(error = %e, "record load task did not finish cleanly");
    }
    Ok(())
}
