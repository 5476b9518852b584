//! Shared harness for the HTTP suites: the full router over the in-memory
//! store and auth provider.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use street_pulse::auth::InMemoryAuthProvider;
use street_pulse::config::Config;
use street_pulse::email::LogMailer;
use street_pulse::routes::create_routes;
use street_pulse::state::AppState;
use street_pulse::store::{InMemoryStore, Store};

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub auth: InMemoryAuthProvider,
}

pub struct Session {
    pub user_id: Uuid,
    pub token: String,
}

pub fn config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 1,
        port: 0,
        site_url: "http://localhost:3000".to_string(),
        supabase_url: String::new(),
        supabase_anon_key: String::new(),
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let auth = InMemoryAuthProvider::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let state = AppState::new(
            config(),
            shared.clone(),
            Arc::new(auth.clone()),
            Arc::new(LogMailer::new(shared)),
        );

        Self {
            router: create_routes(state),
            store,
            auth,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Signs up through the API, applies roles, then signs in.
    pub async fn session(&self, email: &str, organizer: bool, admin: bool) -> Session {
        let response = self
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "password123",
                    "full_name": "Test Dancer"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        let user_id: Uuid = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();
        self.store.set_roles(user_id, organizer, admin).unwrap();

        Session {
            user_id,
            token: body["data"]["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates an event through the API and returns its id.
    pub async fn create_event(&self, session: &Session, title: &str, tags: Option<Value>) -> Uuid {
        let mut payload = json!({
            "title": title,
            "description": "Cypher with open floor and guest judges",
            "start_time": "2030-06-01T20:00:00Z",
            "end_time": "2030-06-01T23:30:00Z",
            "has_live_dj": true
        });
        if let Some(tags) = tags {
            payload["tags"] = tags;
        }

        let response = self
            .send(Method::POST, "/events/create", Some(&session.token), Some(payload))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
