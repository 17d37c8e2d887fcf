//! Router tests for the dashboard, driven with `tower::ServiceExt::oneshot`

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sentiscope::config::SearchConfig;
use sentiscope::models::ClassifierKind;
use sentiscope::pipeline::QueryPipeline;
use sentiscope::utils::error::FetchError;
use sentiscope::web::{ServerConfig, WebServer};
use tower::ServiceExt;

use common::{seven_two_one, trained_bundle, MockSource};

fn server_with(source: Arc<MockSource>) -> WebServer {
    let pipeline = QueryPipeline::new(
        source,
        Arc::new(trained_bundle()),
        SearchConfig::default(),
        ClassifierKind::LogisticRegression,
    );
    let config = ServerConfig::builder().enable_request_logging(false).build();
    WebServer::new(config, Arc::new(pipeline)).unwrap()
}

fn router_with(source: Arc<MockSource>) -> Router {
    server_with(source).build_router()
}

fn router() -> Router {
    router_with(MockSource::with_posts(seven_two_one()))
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Log in and return the `sid=...` cookie pair
async fn login(router: &Router, username: &str) -> String {
    let response = router
        .clone()
        .oneshot(form_request("/login", &format!("username={username}"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_index_requires_login() {
    let response = router().oneshot(get_request("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("You are not logged in"));
    assert!(html.contains("href=\"/login\""));
}

#[tokio::test]
async fn test_login_then_index() {
    let router = router();
    let cookie = login(&router, "alice").await;
    assert!(cookie.starts_with("sid="));

    let response = router
        .clone()
        .oneshot(get_request("/", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Logged in as <strong>alice</strong>"));
    assert!(html.contains("name=\"search word\""));
    assert!(html.contains("<option value=\"IE\">Ireland</option>"));
}

#[tokio::test]
async fn test_repeat_login_replaces_session() {
    let server = server_with(MockSource::with_posts(seven_two_one()));
    let sessions = server.state().sessions;
    let router = server.build_router();

    let first = login(&router, "alice").await;
    let response = router
        .clone()
        .oneshot(form_request("/login", "username=alice", Some(&first)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(sessions.len().await, 1);

    let response = router
        .clone()
        .oneshot(get_request("/", Some(&first)))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("You are not logged in"));
}

#[tokio::test]
async fn test_blank_username_rejected() {
    let response = router()
        .oneshot(form_request("/login", "username=++", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let router = router();
    let cookie = login(&router, "bob").await;

    let response = router
        .clone()
        .oneshot(get_request("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = router
        .clone()
        .oneshot(get_request("/", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("You are not logged in"));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_output_renders_chart() {
    let router = router();
    let cookie = login(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(form_request(
            "/output",
            "search+word=coffee&date=&location=world",
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Results for \"coffee\" (World)"));
    assert!(html.contains("Positive: 70.0%"));
    assert!(html.contains("Negative: 20.0%"));
    assert!(html.contains("Neutral: 10.0%"));
    assert!(html.contains("Plotly.newPlot"));
    assert!(html.contains("\"type\":\"pie\""));
    assert!(html.contains("#158467"));
}

#[tokio::test]
async fn test_output_without_session_redirects() {
    let response = router()
        .oneshot(form_request("/output", "search+word=coffee", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_get_output_redirects_to_login() {
    let response = router()
        .oneshot(get_request("/output", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_output_no_results_notice() {
    let router = router_with(MockSource::with_posts(Vec::new()));
    let cookie = login(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(form_request("/output", "search+word=zzz&location=IE", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Could not retrieve any tweets"));
    assert!(!html.contains("Plotly.newPlot"));
    assert!(html.contains("<option value=\"IE\" selected>Ireland</option>"));
}

#[tokio::test]
async fn test_output_invalid_input_is_bad_request() {
    let router = router();
    let cookie = login(&router, "alice").await;

    for body in [
        "search+word=&location=world",
        "search+word=coffee&date=May+1st",
        "search+word=coffee&location=Atlantis",
    ] {
        let response = router
            .clone()
            .oneshot(form_request("/output", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[tokio::test]
async fn test_output_fetch_failure_is_bad_gateway() {
    let router = router_with(MockSource::failing(|| FetchError::Timeout));
    let cookie = login(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(form_request("/output", "search+word=coffee", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Could not retrieve results"));
}

#[tokio::test]
async fn test_output_missing_models_is_unavailable() {
    let dir = tempfile::TempDir::new().unwrap();
    let pipeline = QueryPipeline::with_model_dir(
        MockSource::with_posts(seven_two_one()),
        dir.path(),
        SearchConfig::default(),
        ClassifierKind::Svm,
    );
    let router = WebServer::new(ServerConfig::default(), Arc::new(pipeline))
        .unwrap()
        .build_router();
    let cookie = login(&router, "alice").await;

    let response = router
        .clone()
        .oneshot(form_request("/output", "search+word=coffee", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_text(response).await;
    assert!(html.contains("Sentiment models are unavailable"));
}

// ============================================================================
// Operational endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let response = router().oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["primary_classifier"], "logistic_regression");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    sentiscope::metrics::init_metrics();
    let router = router();

    // Generate at least one recorded request
    router.clone().oneshot(get_request("/health", None)).await.unwrap();

    let response = router.oneshot(get_request("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("sentiscope_http_requests_total"));
}
