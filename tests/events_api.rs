mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{json_body, TestApp};

fn update_payload(title: &str, tags: Option<serde_json::Value>) -> serde_json::Value {
    let mut payload = json!({
        "title": title,
        "description": "Cypher with open floor and guest judges",
        "start_time": "2030-06-01T20:00:00Z",
        "end_time": "2030-06-01T23:30:00Z"
    });
    if let Some(tags) = tags {
        payload["tags"] = tags;
    }
    payload
}

#[tokio::test]
async fn duplicate_tag_names_produce_duplicate_links() {
    let app = TestApp::new();
    let organizer = app.session("org@example.com", true, false).await;

    let event_id = app
        .create_event(&organizer, "Bboy Jam", Some(json!(["breaking", "breaking"])))
        .await;

    assert_eq!(app.store.junction_rows(event_id).unwrap(), 2);

    let response = app
        .send(Method::GET, &format!("/events/{event_id}"), None, None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["tags"], json!(["breaking", "breaking"]));
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn update_with_empty_tags_clears_links() {
    let app = TestApp::new();
    let organizer = app.session("org@example.com", true, false).await;
    let event_id = app
        .create_event(&organizer, "Bboy Jam", Some(json!(["breaking", "toprock"])))
        .await;

    let response = app
        .send(
            Method::PUT,
            &format!("/events/edit/{event_id}"),
            Some(&organizer.token),
            Some(update_payload("Bboy Jam", Some(json!([])))),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.junction_rows(event_id).unwrap(), 0);
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete() {
    let app = TestApp::new();
    let owner = app.session("owner@example.com", true, false).await;
    let other = app.session("other@example.com", true, false).await;
    let event_id = app.create_event(&owner, "House Dance Social", None).await;

    let response = app
        .send(
            Method::PUT,
            &format!("/events/edit/{event_id}"),
            Some(&other.token),
            Some(update_payload("Hijacked", None)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(
        body["error"]["message"],
        "You do not have permission to update this event"
    );

    let response = app
        .send(Method::DELETE, &format!("/events/{event_id}"), Some(&other.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(Method::GET, &format!("/events/{event_id}"), None, None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["title"], "House Dance Social");
}

#[tokio::test]
async fn anonymous_delete_is_rejected() {
    let app = TestApp::new();
    let owner = app.session("owner@example.com", true, false).await;
    let event_id = app.create_event(&owner, "House Dance Social", None).await;

    let response = app
        .send(Method::DELETE, &format!("/events/{event_id}"), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "You must be logged in to delete an event");
}

#[tokio::test]
async fn only_admins_publish_and_published_events_are_listed() {
    let app = TestApp::new();
    let organizer = app.session("org@example.com", true, false).await;
    let admin = app.session("admin@example.com", false, true).await;
    let event_id = app.create_event(&organizer, "Krump Session", None).await;

    let response = app.send(Method::GET, "/events", None, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["count"], 0);

    let response = app
        .send(
            Method::POST,
            &format!("/admin/events/{event_id}/publish"),
            Some(&organizer.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(
            Method::POST,
            &format!("/admin/events/{event_id}/publish"),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(Method::GET, "/events?q=krump", None, None).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["events"][0]["status"], "published");
}

#[tokio::test]
async fn plain_user_cannot_create() {
    let app = TestApp::new();
    let dancer = app.session("dancer@example.com", false, false).await;

    let response = app
        .send(
            Method::POST,
            "/events/create",
            Some(&dancer.token),
            Some(update_payload("My Jam", None)),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "You must be an organizer to create events");
}

#[tokio::test]
async fn huge_page_number_is_a_bad_request() {
    let app = TestApp::new();

    let response = app
        .send(Method::GET, "/events?page=9223372036854775807", None, None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Page is out of range");
}

#[tokio::test]
async fn anonymous_status_filter_never_shows_unpublished() {
    let app = TestApp::new();
    let organizer = app.session("org@example.com", true, false).await;
    app.create_event(&organizer, "Secret Pending Jam", None).await;

    for status in ["pending", "cancelled"] {
        let response = app
            .send(Method::GET, &format!("/events?status={status}"), None, None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["count"], 0, "{status}");
    }

    let response = app
        .send(Method::GET, "/events?status=pending", Some(&organizer.token), None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["events"][0]["title"], "Secret Pending Jam");
}
