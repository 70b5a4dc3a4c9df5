//! Route-level tests of the JSON contracts and error envelopes.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use pmobackend::{MemoryBackend, SignageBackend};
use pmocontent::{
    ContentId, ContentItem, ContentPayload, Screen, ScreenId, ScreenStatus, TextSlide,
};
use pmodisplay::{
    DisplayFrame, DisplayState, ErrorResponse, OpenSessionResponse, RefreshResponse,
    SessionOptions, SessionRegistry, create_router,
};
use pmoplayback::PlaybackState;
use pmoschedule::SequenceSource;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn signage_app(backend: &MemoryBackend) -> (Router, DisplayState) {
    let state = DisplayState {
        backend: Arc::new(backend.clone()) as Arc<dyn SignageBackend>,
        registry: SessionRegistry::new(None),
        options: SessionOptions::default(),
    };
    (create_router(state.clone()), state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn open_demo_session(app: &Router) -> OpenSessionResponse {
    let response = app
        .clone()
        .oneshot(post_json("/api/display/sessions", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn opening_a_session_returns_a_playable_frame() {
    let (app, _) = signage_app(&MemoryBackend::new());

    let opened = open_demo_session(&app).await;
    assert_eq!(opened.frame.session_id, opened.session_id);
    assert_eq!(opened.frame.source, SequenceSource::Demo);
    assert_eq!(opened.frame.state, PlaybackState::Playing);
    assert_eq!(opened.frame.overview.len(), 3);
    assert!(!opened.frame.no_content);
}

#[tokio::test]
async fn preview_parameter_short_circuits_to_one_item() {
    let backend = MemoryBackend::new();
    backend
        .add_content(ContentItem {
            id: ContentId::from("spotlight"),
            title: "Spotlight".to_string(),
            payload: ContentPayload::Text(TextSlide::new("under review")),
            duration_secs: 15,
            // Preview works on drafts too: the item is not active.
            is_active: false,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        })
        .await;
    let (app, _) = signage_app(&backend);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/display/sessions",
            json!({"screen": "lobby", "preview": "spotlight"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let opened: OpenSessionResponse = read_json(response).await;
    assert_eq!(opened.frame.sequence_len, 1);
    assert_eq!(opened.frame.overview[0].content_id.as_str(), "spotlight");
    assert!(matches!(
        opened.frame.source,
        SequenceSource::Preview { .. }
    ));
}

#[tokio::test]
async fn unknown_sessions_answer_a_404_envelope() {
    let (app, _) = signage_app(&MemoryBackend::new());

    let response = app
        .clone()
        .oneshot(get("/api/display/sessions/not-a-session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "session_not_found");
    assert!(body.message.contains("not-a-session"));
}

#[tokio::test]
async fn control_actions_reach_the_engine() {
    let (app, state) = signage_app(&MemoryBackend::new());
    let opened = open_demo_session(&app).await;
    let uri = format!("/api/display/sessions/{}/control", opened.session_id);

    let response = app
        .clone()
        .oneshot(post_json(&uri, json!({"action": "toggle"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The frame is recomposed asynchronously; observe it through the
    // session's own stream before polling the endpoint.
    let session = state.registry.get(&opened.session_id).await.unwrap();
    session
        .subscribe()
        .wait_for(|f| f.state == PlaybackState::Paused)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/display/sessions/{}", opened.session_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let frame: DisplayFrame = read_json(response).await;
    assert_eq!(frame.state, PlaybackState::Paused);
}

#[tokio::test]
async fn jump_out_of_range_is_a_400() {
    let (app, _) = signage_app(&MemoryBackend::new());
    let opened = open_demo_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/display/sessions/{}/control", opened.session_id),
            json!({"action": "jump", "index": 99}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = read_json(response).await;
    assert_eq!(body.error, "bad_request");
}

#[tokio::test]
async fn media_error_reports_are_accepted() {
    let (app, state) = signage_app(&MemoryBackend::new());
    let opened = open_demo_session(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/display/sessions/{}/media-errors", opened.session_id),
            json!({"content_id": "demo-promotion"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let session = state.registry.get(&opened.session_id).await.unwrap();
    session.jump_to(1).await.unwrap();
    session
        .subscribe()
        .wait_for(|f| {
            f.current_index == 1
                && f.current.as_ref().map(|c| &c.media)
                    == Some(&pmodisplay::SlideMedia::Failed)
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_reports_whether_the_sequence_changed() {
    let backend = MemoryBackend::new();
    let (app, _) = signage_app(&backend);
    let opened = open_demo_session(&app).await;
    let uri = format!("/api/display/sessions/{}/refresh", opened.session_id);

    let response = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refresh: RefreshResponse = read_json(response).await;
    assert!(!refresh.changed);

    backend
        .add_content(ContentItem {
            id: ContentId::from("news"),
            title: "News".to_string(),
            payload: ContentPayload::Text(TextSlide::new("breaking")),
            duration_secs: 10,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        })
        .await;

    let response = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    let refresh: RefreshResponse = read_json(response).await;
    assert!(refresh.changed);
}

#[tokio::test]
async fn delete_closes_and_forgets_the_session() {
    let (app, state) = signage_app(&MemoryBackend::new());
    let opened = open_demo_session(&app).await;
    let uri = format!("/api/display/sessions/{}", opened.session_id);

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.registry.is_empty().await);

    let response = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn screens_endpoint_lists_the_selector_data() {
    let backend = MemoryBackend::new();
    for (id, name) in [("s2", "Entrance"), ("s1", "Cafeteria")] {
        backend
            .add_screen(Screen {
                id: ScreenId::from(id),
                name: name.to_string(),
                location: None,
                resolution: Some("1920x1080".to_string()),
                status: ScreenStatus::Online,
                last_seen_at: None,
                created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            })
            .await;
    }
    let (app, _) = signage_app(&backend);

    let response = app.clone().oneshot(get("/api/screens")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let screens: Vec<Screen> = read_json(response).await;
    let names: Vec<&str> = screens.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Cafeteria", "Entrance"], "name ascending");
}

#[tokio::test]
async fn sse_stream_opens_with_the_current_frame() {
    use futures::StreamExt;

    let (app, _) = signage_app(&MemoryBackend::new());
    let opened = open_demo_session(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/display/sessions/{}/events",
            opened.session_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut chunks = response.into_body().into_data_stream();
    let first = chunks.next().await.unwrap().unwrap();
    let text = String::from_utf8(first.to_vec()).unwrap();
    assert!(text.starts_with("event: frame"), "got: {text}");
    assert!(text.contains("\"session_id\""));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = signage_app(&MemoryBackend::new());

    let response = app.clone().oneshot(get("/api/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc: Value = read_json(response).await;
    assert!(doc["openapi"].is_string());
    assert!(doc["paths"]["/api/display/sessions"].is_object());
}
