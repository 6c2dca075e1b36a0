mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use campushub_auth::middleware::{
    authenticate, authenticate_with_status, require_account_status,
    require_approved_organization, require_email_verified, require_ownership,
    require_permission, require_role,
};
use campushub_auth::models::{AccountStatus, Principal, PrincipalKind};

use common::*;

async fn ok() -> &'static str {
    "ok"
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed_get(uri: &str, principal: &Principal) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", bearer(&access_token_for(principal)))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_require_role_rejects_other_kinds() {
    let app = Router::new()
        .route("/admin", get(ok))
        .layer(from_fn(require_role(&[PrincipalKind::Administrator])))
        .layer(from_fn_with_state(auth_state(), authenticate));

    let request = authed_get("/admin", &active_member());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_ROLE");
    assert_eq!(body["required"], serde_json::json!(["ADMIN"]));
    assert_eq!(body["actual"], "USER");

    let admin = admin_with_permissions(&[]);
    let request = authed_get("/admin", &admin);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_require_role_accepts_any_listed_kind() {
    let app = Router::new()
        .route("/publish", get(ok))
        .layer(from_fn(require_role(&[
            PrincipalKind::Organization,
            PrincipalKind::Administrator,
        ])))
        .layer(from_fn_with_state(auth_state(), authenticate));

    let request = authed_get("/publish", &approved_organization());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = authed_get("/publish", &active_member());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_require_permission() {
    let app = Router::new()
        .route("/moderate", get(ok))
        .layer(from_fn(require_permission("manage_events")))
        .layer(from_fn_with_state(auth_state(), authenticate));

    // Non-administrators are out regardless of any permission map.
    let request = authed_get("/moderate", &active_member());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_ROLE");

    // Administrator without the permission.
    let admin = admin_with_permissions(&[("manage_users", true)]);
    let request = authed_get("/moderate", &admin);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "PERMISSION_DENIED");
    assert_eq!(body["permission"], "manage_events");

    // Administrator with the permission explicitly revoked.
    let admin = admin_with_permissions(&[("manage_events", false)]);
    let request = authed_get("/moderate", &admin);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Administrator with the permission granted.
    let admin = admin_with_permissions(&[("manage_events", true)]);
    let request = authed_get("/moderate", &admin);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_require_email_verified() {
    let state = auth_state();
    let app = Router::new()
        .route("/rsvp", get(ok))
        .layer(from_fn(require_email_verified))
        .layer(from_fn_with_state(
            state,
            authenticate_with_status(&[
                AccountStatus::Active,
                AccountStatus::PendingVerification,
            ]),
        ));

    let request = authed_get("/rsvp", &pending_member());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "EMAIL_NOT_VERIFIED");

    let request = authed_get("/rsvp", &active_member());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_require_approved_organization() {
    let app = Router::new()
        .route("/events", post(ok))
        .layer(from_fn(require_approved_organization))
        .layer(from_fn_with_state(auth_state(), authenticate));

    let request = Request::builder()
        .method("POST")
        .uri("/events")
        .header(
            "Authorization",
            bearer(&access_token_for(&pending_organization())),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "ORGANIZATION_NOT_APPROVED");
    assert_eq!(body["approval_status"], "PENDING");

    let request = Request::builder()
        .method("POST")
        .uri("/events")
        .header(
            "Authorization",
            bearer(&access_token_for(&approved_organization())),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A member is the wrong kind entirely.
    let request = Request::builder()
        .method("POST")
        .uri("/events")
        .header("Authorization", bearer(&access_token_for(&active_member())))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_ROLE");
}

#[tokio::test]
async fn test_require_account_status_guard() {
    let state = auth_state();
    let app = Router::new()
        .route("/verify/submit", post(ok))
        .layer(from_fn(require_account_status(&[
            AccountStatus::PendingVerification,
        ])))
        .layer(from_fn_with_state(
            state,
            authenticate_with_status(&[
                AccountStatus::Active,
                AccountStatus::PendingVerification,
            ]),
        ));

    let request = Request::builder()
        .method("POST")
        .uri("/verify/submit")
        .header(
            "Authorization",
            bearer(&access_token_for(&pending_member())),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // An already-active account does not belong on this endpoint.
    let request = Request::builder()
        .method("POST")
        .uri("/verify/submit")
        .header("Authorization", bearer(&access_token_for(&active_member())))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["code"],
        "ACCOUNT_STATUS_NOT_ALLOWED"
    );
}

#[tokio::test]
async fn test_require_ownership_from_path_param() {
    let app = Router::new()
        .route("/registrations/:user", get(ok))
        .route_layer(from_fn(require_ownership("user")))
        .layer(from_fn_with_state(auth_state(), authenticate));

    let member = active_member();
    let uri = format!("/registrations/{}", member.id());

    let request = authed_get(&uri, &member);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = authed_get("/registrations/someone-else", &member);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "OWNERSHIP_REQUIRED");

    // Administrators bypass ownership regardless of the resource id.
    let admin = admin_with_permissions(&[]);
    let request = authed_get("/registrations/someone-else", &admin);
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_require_ownership_from_body_field() {
    let app = Router::new()
        .route("/tickets", post(ok))
        .route_layer(from_fn(require_ownership("user")))
        .layer(from_fn_with_state(auth_state(), authenticate));

    let member = active_member();

    let request = Request::builder()
        .method("POST")
        .uri("/tickets")
        .header("Authorization", bearer(&access_token_for(&member)))
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"user":"{}"}}"#, member.id())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/tickets")
        .header("Authorization", bearer(&access_token_for(&member)))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"user":"someone-else"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // No owner id anywhere: fail closed.
    let request = Request::builder()
        .method("POST")
        .uri("/tickets")
        .header("Authorization", bearer(&access_token_for(&member)))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"note":"no owner here"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
