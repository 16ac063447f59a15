use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info};

use crate::airtable::RecordSource;
use crate::cache::SnapshotCache;
use crate::error::DashboardError;
use crate::filter::{self, FilterSelection};
use crate::models::{FellowTable, FetchQuery};
use crate::report::{self, Page};
use crate::summary;
use crate::table;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<RecordSource>,
    pub query: FetchQuery,
    pub cache: SnapshotCache,
    pub title: Arc<str>,
}

impl AppState {
    /// Full normalized table, from cache when possible.
    pub async fn snapshot(&self) -> Result<Arc<FellowTable>, DashboardError> {
        let source = Arc::clone(&self.source);
        let query = self.query.clone();
        self.cache
            .get_or_load(&self.query, || async move {
                table::load_fellows(&source, &query).await
            })
            .await
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/summary", get(summary_api))
        .route("/cache/clear", post(clear_cache))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind dashboard server {addr}"))?;
    info!(%addr, "dashboard listening");
    axum::serve(listener, router(state))
        .await
        .context("dashboard server failed")?;
    Ok(())
}

/// Reads the sidebar form from a query string. Until the form has been
/// submitted (`applied` present) every observed value is selected; after
/// that, a dimension with no values selects nothing. Tokens that are not
/// form values are ignored.
pub fn selection_from_query(table: &FellowTable, raw: Option<&str>) -> FilterSelection {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !pairs.iter().any(|(key, _)| key == "applied") {
        return FilterSelection::full_domain(table);
    }

    let mut selection = FilterSelection::default();
    for (key, value) in pairs {
        match key.as_str() {
            "college" => selection.colleges.extend(filter::parse_token(&value)),
            "grad_date" => selection.graduation_dates.extend(filter::parse_token(&value)),
            _ => {}
        }
    }
    selection
}

fn failure(state: &AppState, err: &DashboardError) -> Response {
    error!(error = %err, "render failed");
    (
        StatusCode::BAD_GATEWAY,
        Html(report::render_error_page(&state.title, err)),
    )
        .into_response()
}

async fn dashboard(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let full = match state.snapshot().await {
        Ok(full) => full,
        Err(err) => return failure(&state, &err),
    };
    let selection = selection_from_query(&full, raw.as_deref());
    let filtered = filter::apply_filter(&full, &selection);
    match report::render_page(&Page {
        title: &state.title,
        full: &full,
        filtered: &filtered,
        selection: &selection,
        interactive: true,
    }) {
        Ok(page) => Html(page).into_response(),
        Err(err) => failure(&state, &err),
    }
}

async fn summary_api(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let full = match state.snapshot().await {
        Ok(full) => full,
        Err(err) => {
            error!(error = %err, "summary failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };
    let selection = selection_from_query(&full, raw.as_deref());
    let filtered = filter::apply_filter(&full, &selection);
    Json(serde_json::json!({
        "fellows": filtered.rows.len(),
        "total": full.rows.len(),
        "fetched_at": full.fetched_at,
        "dimensions": summary::summarize_all(&filtered),
    }))
    .into_response()
}

async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.cache.clear();
    StatusCode::NO_CONTENT
}
