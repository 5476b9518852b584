mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{json_body, TestApp};

#[tokio::test]
async fn sign_up_twice_reports_email_in_use() {
    let app = TestApp::new();
    app.session("kai@example.com", false, false).await;

    let response = app
        .send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "email": "kai@example.com",
                "password": "another-pass",
                "full_name": "Kai Again"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Email already in use");
}

#[tokio::test]
async fn login_sets_cookie_and_me_returns_profile() {
    let app = TestApp::new();
    let session = app.session("kai@example.com", false, false).await;

    let response = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "kai@example.com", "password": "password123" })),
        )
        .await;
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("sp-access-token="));

    let response = app
        .send(Method::GET, "/auth/me", Some(&session.token), None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["profile"]["email"], "kai@example.com");
}

#[tokio::test]
async fn wrong_password_passes_provider_message() {
    let app = TestApp::new();
    app.session("kai@example.com", false, false).await;

    let response = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "kai@example.com", "password": "nope-nope" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Invalid login credentials");
}

#[tokio::test]
async fn logout_invalidates_token() {
    let app = TestApp::new();
    let session = app.session("kai@example.com", false, false).await;

    let response = app
        .send(Method::POST, "/auth/logout", Some(&session.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(Method::GET, "/auth/me", Some(&session.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn oauth_url_for_known_provider_only() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/auth/oauth/google", None, None).await;
    let body = json_body(response).await;
    let url = body["data"]["url"].as_str().unwrap_or_default();
    assert!(url.contains("provider=google"));
    assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));

    let response = app.send(Method::GET, "/auth/oauth/myspace", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
