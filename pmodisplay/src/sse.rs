//! SSE frame stream: the push contract the display surface renders from.

use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};

use crate::api::{ApiError, DisplayState};
use crate::session::SessionId;

/// GET /api/display/sessions/{id}/events
///
/// Emits the current frame immediately, then one `frame` event per state
/// change (playback advancing, media resolving, sequence swaps). The
/// stream ends when the session closes; receiving from it counts as
/// activity for idle eviction.
#[utoipa::path(
    get,
    path = "/api/display/sessions/{id}/events",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "SSE stream of display frames", content_type = "text/event-stream"),
        (status = 404, description = "Unknown session", body = crate::api::ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn frame_events(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = SessionId::from(id.as_str());
    let session = state
        .registry
        .get(&id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;

    let stream = stream! {
        let mut frames = session.subscribe();
        loop {
            let frame = frames.borrow_and_update().clone();
            session.touch();
            if let Ok(json) = serde_json::to_string(&frame) {
                yield Ok::<_, axum::Error>(Event::default().event("frame").data(json));
            }
            if frames.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
