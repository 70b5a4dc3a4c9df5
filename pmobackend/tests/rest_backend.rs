//! Integration tests for the REST backend against a mock server.

use chrono::Weekday;
use pmobackend::{
    BackendError, ContentRepository, RestBackend, ScheduleRepository, ScreenRepository,
    SignedUrlProvider,
};
use pmocontent::{ContentId, ContentKind, ScreenId};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> RestBackend {
    RestBackend::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .build()
        .unwrap()
}

fn text_row(id: &str, title: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "type": "text",
        "content_data": { "text": title, "fontSize": "48px" },
        "duration": 10,
        "is_active": true,
        "created_at": created_at
    })
}

#[tokio::test]
async fn list_active_sends_filters_and_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/content"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "test-key"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            text_row("c2", "Newer", "2025-06-02T00:00:00Z"),
            text_row("c1", "Older", "2025-06-01T00:00:00Z"),
        ])))
        .mount(&server)
        .await;

    let items = backend_for(&server).list_active().await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
}

#[tokio::test]
async fn malformed_rows_do_not_fail_the_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            text_row("good", "Good", "2025-06-01T00:00:00Z"),
            { "id": "bad", "title": "Bad", "type": "pdf", "content_data": {}, "duration": 10 },
        ])))
        .mount(&server)
        .await;

    let items = backend_for(&server).list_active().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id.as_str(), "good");
}

#[tokio::test]
async fn get_by_id_maps_empty_page_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/content"))
        .and(query_param("id", "eq.unknown"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = backend_for(&server)
        .get_by_id(&ContentId::from("unknown"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn schedule_lookup_uses_the_postgrest_dialect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("screen_id", "eq.lobby"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("days_of_week", "cs.{3}"))
        .and(query_param("start_time", "lte.09:30"))
        .and(query_param("end_time", "gte.09:30"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "s1",
            "name": "Morning loop",
            "playlist_id": "p1",
            "screen_id": "lobby",
            "start_time": "09:00:00",
            "end_time": "17:00:00",
            "days_of_week": [1, 2, 3, 4, 5],
            "is_active": true,
            "created_at": "2025-06-01T00:00:00Z",
            "playlist": {
                "id": "p1",
                "name": "Morning",
                "playlist_items": [{
                    "id": "pi1",
                    "content_id": "c1",
                    "order_index": 0,
                    "content": {
                        "id": "c1",
                        "title": "Hello",
                        "type": "html",
                        "content_data": { "html": "<p>hi</p>" },
                        "duration": 6
                    }
                }]
            }
        }])))
        .mount(&server)
        .await;

    let entries = backend_for(&server)
        .find_active_for_screen(
            &ScreenId::from("lobby"),
            Weekday::Wed,
            "09:30".parse().unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].playlist_name, "Morning");
    let content = entries[0].ordered_content();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0].kind(), ContentKind::Markup);
}

#[tokio::test]
async fn screens_come_back_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/screens"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "scr1",
            "name": "Lobby",
            "location": "Ground floor",
            "resolution": "1920x1080",
            "status": "online",
            "created_at": "2025-06-01T00:00:00Z"
        }])))
        .mount(&server)
        .await;

    let screens = backend_for(&server).list_screens().await.unwrap();
    assert_eq!(screens.len(), 1);
    assert_eq!(screens[0].name, "Lobby");
}

#[tokio::test]
async fn signing_resolves_the_relative_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/sign/content-files/content/u1/a.jpg"))
        .and(body_json(json!({ "expiresIn": 3600 })))
        .and(header("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedURL": "/object/sign/content-files/content/u1/a.jpg?token=abc"
        })))
        .mount(&server)
        .await;

    let url = backend_for(&server)
        .signed_url("content/u1/a.jpg", 3600)
        .await
        .unwrap();
    assert_eq!(
        url,
        format!(
            "{}/storage/v1/object/sign/content-files/content/u1/a.jpg?token=abc",
            server.uri()
        )
    );
}

#[tokio::test]
async fn signing_failure_reports_storage_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Object not found"
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .signed_url("content/u1/missing.jpg", 3600)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Storage(_)), "got {err:?}");
}

#[tokio::test]
async fn server_errors_surface_as_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/content"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = backend_for(&server).list_active().await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}
