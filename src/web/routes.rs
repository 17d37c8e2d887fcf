//! HTTP handlers for the dashboard
//!
//! Pages are HTML rendered from handlebars templates; `/health` and
//! `/metrics` are for operators.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use handlebars::RenderError;
use serde::{Deserialize, Serialize};

use crate::error::{Error, SentiscopeErrorTrait};
use crate::metrics;
use crate::pipeline::QueryOutcome;

use super::render::{FormValues, IndexView, NO_RESULTS_NOTICE};
use super::server::AppState;
use super::session;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Login form
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
}

/// Search form posted to `/output`
#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(rename = "search word", default)]
    pub search_word: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
}

impl From<&SearchForm> for FormValues {
    fn from(form: &SearchForm) -> Self {
        Self {
            search_word: form.search_word.clone(),
            date: form.date.clone(),
            location: form.location.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub primary_classifier: &'static str,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the dashboard router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/output", get(output_redirect).post(output))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route_layer(axum::middleware::from_fn(track_requests))
        .with_state(state)
}

/// Count every routed request by matched path and status
async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_http_request(&route, response.status().as_u16());
    response
}

/// Status code for a failed query
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Fetch(_) => StatusCode::BAD_GATEWAY,
        Error::Model(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Query(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn page(status: StatusCode, rendered: Result<String, RenderError>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed").into_response()
        }
    }
}

// ============================================================================
// Page Handlers
// ============================================================================

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.sessions.current_user(&headers).await {
        Some(username) => {
            let view = IndexView::new(username, FormValues::default());
            page(StatusCode::OK, state.renderer.index(&view))
        }
        None => page(StatusCode::OK, state.renderer.not_logged_in()),
    }
}

async fn login_page(State(state): State<AppState>) -> Response {
    page(StatusCode::OK, state.renderer.login(None))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();
    if username.is_empty() {
        return page(
            StatusCode::BAD_REQUEST,
            state.renderer.login(Some("Please enter a username")),
        );
    }

    let previous = session::session_id(&headers);
    let id = state
        .sessions
        .create_replacing(previous.as_deref(), username)
        .await;
    tracing::info!(username, "User logged in");

    (
        [(header::SET_COOKIE, session::set_cookie(&id))],
        Redirect::to("/"),
    )
        .into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session::session_id(&headers) {
        if let Some(username) = state.sessions.remove(&id).await {
            tracing::info!(username = %username, "User logged out");
        }
    }

    (
        [(header::SET_COOKIE, session::clear_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

async fn output_redirect() -> Redirect {
    Redirect::to("/login")
}

async fn output(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    let Some(username) = state.sessions.current_user(&headers).await else {
        return Redirect::to("/login").into_response();
    };

    let view = IndexView::new(username, FormValues::from(&form));

    match state
        .pipeline
        .run_query(&form.search_word, &form.date, &form.location)
        .await
    {
        Ok(QueryOutcome::Results(report)) => {
            page(StatusCode::OK, state.renderer.index(&view.with_report(&report)))
        }
        Ok(QueryOutcome::NoResults) => page(
            StatusCode::OK,
            state.renderer.index(&view.with_notice(NO_RESULTS_NOTICE)),
        ),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, category = ?e.category(), "Query failed");
            } else {
                tracing::warn!(error = %e, "Rejected query");
            }
            page(status, state.renderer.index(&view.with_error(e.user_message())))
        }
    }
}

// ============================================================================
// Operational Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
        primary_classifier: state.pipeline.primary().as_str(),
    })
}

async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
