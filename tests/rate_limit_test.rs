mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use campushub_auth::middleware::{auth_rate_limit, AuthRateLimiter};

async fn login() -> &'static str {
    "ok"
}

fn login_router(limiter: Arc<AuthRateLimiter>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .layer(from_fn_with_state(limiter, auth_rate_limit))
}

fn login_request(ip: &str, email: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("x-forwarded-for", ip)
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"email":"{}"}}"#, email)))
        .unwrap()
}

#[tokio::test]
async fn test_sixth_attempt_in_window_is_rejected() {
    let limiter = AuthRateLimiter::new(5, Duration::from_secs(900));
    let app = login_router(limiter);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "RATE_LIMITED");
    assert!(body["retry_after_seconds"].as_u64().unwrap() >= 1);

    // A different (address, email) pair still has budget.
    let response = app
        .clone()
        .oneshot(login_request("10.0.0.2", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(login_request("10.0.0.1", "sam@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_attempts_count_even_when_login_would_succeed() {
    // The limiter runs before the handler, so every submission spends
    // budget regardless of outcome.
    let limiter = AuthRateLimiter::new(2, Duration::from_secs(900));
    let app = login_router(limiter);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_first_attempt_after_window_is_allowed() {
    let limiter = AuthRateLimiter::new(1, Duration::from_millis(100));
    let app = login_router(limiter);

    let response = app
        .clone()
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let response = app
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_body_email_still_limits_by_address() {
    let limiter = AuthRateLimiter::new(1, Duration::from_secs(900));
    let app = login_router(limiter);

    let empty = || {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("x-forwarded-for", "10.0.0.9")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(empty()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(empty()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_handler_still_sees_the_buffered_body() {
    use axum::Json;

    async fn echo(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(body)
    }

    let limiter = AuthRateLimiter::new(5, Duration::from_secs(900));
    let app = Router::new()
        .route("/auth/login", post(echo))
        .layer(from_fn_with_state(limiter, auth_rate_limit));

    let response = app
        .oneshot(login_request("10.0.0.1", "jo@campus.edu"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["email"], "jo@campus.edu");
}
