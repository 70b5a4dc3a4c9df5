//! End-to-end session tests over the in-memory backend.

use chrono::{TimeZone, Utc};
use pmobackend::{MemoryBackend, SignageBackend};
use pmocontent::{ContentId, ContentItem, ContentPayload, TextSlide};
use pmodisplay::{DisplaySession, SessionOptions, SessionRegistry, SlideMedia};
use pmoplayback::{PlaybackError, PlaybackState};
use pmoschedule::{DEMO_PROMOTION_ID, DEMO_WELCOME_ID, ResolveRequest, SequenceSource};
use std::sync::Arc;
use std::time::Duration;

fn text_item(id: &str, duration_secs: u32) -> ContentItem {
    ContentItem {
        id: ContentId::from(id),
        title: id.to_string(),
        payload: ContentPayload::Text(TextSlide::new(id)),
        duration_secs,
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
    }
}

async fn open_unscoped(
    backend: &MemoryBackend,
    options: SessionOptions,
) -> Arc<DisplaySession> {
    let backend: Arc<dyn SignageBackend> = Arc::new(backend.clone());
    DisplaySession::open(backend, ResolveRequest::from_params(None, None), options).await
}

#[tokio::test]
async fn empty_backend_opens_on_the_demo_loop() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;

    let frame = session.frame();
    assert_eq!(frame.source, SequenceSource::Demo);
    assert_eq!(frame.state, PlaybackState::Playing);
    assert_eq!(frame.sequence_len, 3);
    assert_eq!(frame.current_index, 0);
    assert!(!frame.no_content);

    let durations: Vec<u32> = frame.overview.iter().map(|s| s.duration_secs).collect();
    assert_eq!(durations, vec![5, 8, 6]);
    assert_eq!(
        frame.current.unwrap().item.id.as_str(),
        DEMO_WELCOME_ID,
        "playback starts on the first demo slide"
    );
}

#[tokio::test]
async fn controls_drive_the_frame_stream() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;
    let mut frames = session.subscribe();

    session.next().await.unwrap();
    frames.wait_for(|f| f.current_index == 1).await.unwrap();

    session.toggle_playback().await.unwrap();
    frames
        .wait_for(|f| f.state == PlaybackState::Paused)
        .await
        .unwrap();

    // Manual navigation while paused moves the slide but not the mode.
    session.next().await.unwrap();
    let frame = frames
        .wait_for(|f| f.current_index == 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(frame.state, PlaybackState::Paused);
}

#[tokio::test]
async fn demo_image_resolves_from_its_literal_url() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;
    let mut frames = session.subscribe();

    session.jump_to(1).await.unwrap();
    let frame = frames
        .wait_for(|f| {
            f.current_index == 1
                && matches!(
                    f.current.as_ref().map(|c| &c.media),
                    Some(SlideMedia::Ready { .. })
                )
        })
        .await
        .unwrap()
        .clone();

    let current = frame.current.unwrap();
    assert_eq!(current.item.id.as_str(), DEMO_PROMOTION_ID);
    match current.media {
        SlideMedia::Ready { url } => assert!(url.contains("pexels.com")),
        other => panic!("expected a resolved URL, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_without_change_keeps_the_playback_position() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;
    let mut frames = session.subscribe();

    session.next().await.unwrap();
    frames.wait_for(|f| f.current_index == 1).await.unwrap();

    assert!(!session.refresh().await, "nothing changed in the backend");
    let frame = session.frame();
    assert_eq!(frame.current_index, 1, "a quiet refresh must not reset the slide");
    assert_eq!(frame.source, SequenceSource::Demo);
}

#[tokio::test]
async fn refresh_swaps_the_sequence_when_content_appears() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;
    assert_eq!(session.frame().source, SequenceSource::Demo);

    backend.add_content(text_item("announcement", 30)).await;

    assert!(session.refresh().await);
    let mut frames = session.subscribe();
    let frame = frames
        .wait_for(|f| f.source == SequenceSource::ActivePool)
        .await
        .unwrap()
        .clone();
    assert_eq!(frame.sequence_len, 1);
    assert_eq!(frame.current_index, 0);
    assert_eq!(frame.overview[0].content_id.as_str(), "announcement");
}

#[tokio::test]
async fn reported_media_errors_become_failed_frames() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;
    let mut frames = session.subscribe();

    session.report_media_error(ContentId::from(DEMO_PROMOTION_ID));
    session.jump_to(1).await.unwrap();

    let frame = frames
        .wait_for(|f| {
            f.current_index == 1
                && f.current.as_ref().map(|c| &c.media) == Some(&SlideMedia::Failed)
        })
        .await
        .unwrap()
        .clone();
    assert_eq!(frame.current.unwrap().item.id.as_str(), DEMO_PROMOTION_ID);
}

#[tokio::test(start_paused = true)]
async fn periodic_refresh_picks_up_new_content() {
    let backend = MemoryBackend::new();
    let options = SessionOptions {
        refresh_interval: Some(Duration::from_secs(60)),
        ..SessionOptions::default()
    };
    let session = open_unscoped(&backend, options).await;
    assert_eq!(session.frame().source, SequenceSource::Demo);

    backend.add_content(text_item("fresh", 20)).await;

    tokio::time::advance(Duration::from_secs(61)).await;
    let mut frames = session.subscribe();
    frames
        .wait_for(|f| f.source == SequenceSource::ActivePool)
        .await
        .unwrap();
}

#[tokio::test]
async fn close_stops_the_playback_engine() {
    let backend = MemoryBackend::new();
    let session = open_unscoped(&backend, SessionOptions::default()).await;

    session.close().await;
    let err = session.next().await.unwrap_err();
    assert_eq!(err, PlaybackError::EngineClosed);
}

#[tokio::test]
async fn registry_opens_looks_up_and_closes() {
    let backend: Arc<dyn SignageBackend> = Arc::new(MemoryBackend::new());
    let registry = SessionRegistry::new(None);

    let session = registry
        .open(
            backend,
            ResolveRequest::from_params(None, None),
            SessionOptions::default(),
        )
        .await;
    assert_eq!(registry.len().await, 1);

    let found = registry.get(session.id()).await.expect("session registered");
    assert_eq!(found.id(), session.id());
    assert!(registry.get(&"missing".into()).await.is_none());

    assert!(registry.close(session.id()).await);
    assert!(!registry.close(session.id()).await, "second close is a no-op");
    assert!(registry.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_evicted() {
    let backend: Arc<dyn SignageBackend> = Arc::new(MemoryBackend::new());
    let registry = SessionRegistry::new(Some(Duration::from_secs(120)));

    let session = registry
        .open(
            backend,
            ResolveRequest::from_params(None, None),
            SessionOptions::default(),
        )
        .await;
    assert_eq!(registry.len().await, 1);

    // Idle past the TTL plus one sweep period.
    tokio::time::advance(Duration::from_secs(200)).await;
    for _ in 0..100 {
        if registry.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert!(registry.is_empty().await, "idle session should be swept");

    // The evicted session was fully closed, not just dropped from the map.
    let err = session.next().await.unwrap_err();
    assert_eq!(err, PlaybackError::EngineClosed);
}
