//! REST surface of the display service.
//!
//! Every response is JSON. Failures come back as an [`ErrorResponse`]
//! envelope with a stable `error` code — never a bare 500 with internals,
//! a display kiosk has no use for a stack trace.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pmobackend::{BackendError, ScreenRepository, SignageBackend};
use pmocontent::{ContentId, Screen};
use pmoplayback::PlaybackError;
use pmoschedule::ResolveRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::frame::DisplayFrame;
use crate::registry::SessionRegistry;
use crate::session::{SessionId, SessionOptions};

/// Shared state of every display route.
#[derive(Clone)]
pub struct DisplayState {
    pub backend: Arc<dyn SignageBackend>,
    pub registry: SessionRegistry,
    pub options: SessionOptions,
}

/// Builds the full display router, SSE and OpenAPI document included.
pub fn create_router(state: DisplayState) -> Router {
    Router::new()
        .route("/api/screens", get(list_screens))
        .route("/api/display/sessions", post(open_session))
        .route(
            "/api/display/sessions/{id}",
            get(get_frame).delete(close_session),
        )
        .route("/api/display/sessions/{id}/control", post(control_session))
        .route(
            "/api/display/sessions/{id}/media-errors",
            post(report_media_error),
        )
        .route("/api/display/sessions/{id}/refresh", post(refresh_session))
        .route("/api/display/sessions/{id}/events", get(crate::sse::frame_events))
        .route("/api/openapi.json", get(openapi_json))
        .with_state(state)
}

// ============================================================================
// Error envelope
// ============================================================================

/// JSON error envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    SessionNotFound(SessionId),
    SessionClosed,
    BadRequest(String),
    Backend(BackendError),
}

impl From<PlaybackError> for ApiError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::EngineClosed => Self::SessionClosed,
            PlaybackError::IndexOutOfRange { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "session_not_found",
                format!("no display session {id}"),
            ),
            Self::SessionClosed => (
                StatusCode::GONE,
                "session_closed",
                "the display session is closed".to_string(),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            Self::Backend(err) => {
                tracing::warn!(error = %err, "backend request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "backend_unavailable",
                    err.to_string(),
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// Body of `POST /api/display/sessions`.
///
/// `screen` is a screen id, the literal `"generic"`, or absent — absent and
/// `"generic"` both skip schedule matching. `preview` short-circuits the
/// whole chain to a single content item.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub screen: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenSessionResponse {
    pub session_id: SessionId,
    pub frame: DisplayFrame,
}

/// Body of `POST /api/display/sessions/{id}/control`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlRequest {
    Toggle,
    Next,
    Previous,
    Jump { index: usize },
}

/// Body of `POST /api/display/sessions/{id}/media-errors`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MediaErrorReport {
    pub content_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// Whether the refresh swapped the playing sequence.
    pub changed: bool,
    pub frame: DisplayFrame,
}

// ============================================================================
// Handlers
// ============================================================================

async fn session_or_404(
    state: &DisplayState,
    id: &str,
) -> Result<Arc<crate::session::DisplaySession>, ApiError> {
    let id = SessionId::from(id);
    state
        .registry
        .get(&id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

/// GET /api/screens — the screen selector data.
#[utoipa::path(
    get,
    path = "/api/screens",
    responses(
        (status = 200, description = "Registered screens, name ascending"),
        (status = 502, description = "Backend unreachable", body = ErrorResponse)
    ),
    tag = "screens"
)]
pub(crate) async fn list_screens(
    State(state): State<DisplayState>,
) -> Result<Json<Vec<Screen>>, ApiError> {
    let screens = state
        .backend
        .list_screens()
        .await
        .map_err(ApiError::Backend)?;
    Ok(Json(screens))
}

/// POST /api/display/sessions — mount a display.
#[utoipa::path(
    post,
    path = "/api/display/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = OpenSessionResponse)
    ),
    tag = "display"
)]
pub(crate) async fn open_session(
    State(state): State<DisplayState>,
    Json(body): Json<OpenSessionRequest>,
) -> impl IntoResponse {
    let request = ResolveRequest::from_params(body.screen.as_deref(), body.preview.as_deref());
    let session = state
        .registry
        .open(state.backend.clone(), request, state.options)
        .await;
    let response = OpenSessionResponse {
        session_id: session.id().clone(),
        frame: session.frame(),
    };
    (StatusCode::CREATED, Json(response))
}

/// GET /api/display/sessions/{id} — the current frame.
#[utoipa::path(
    get,
    path = "/api/display/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current frame", body = DisplayFrame),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn get_frame(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
) -> Result<Json<DisplayFrame>, ApiError> {
    let session = session_or_404(&state, &id).await?;
    Ok(Json(session.frame()))
}

/// POST /api/display/sessions/{id}/control — playback control.
#[utoipa::path(
    post,
    path = "/api/display/sessions/{id}/control",
    params(("id" = String, Path, description = "Session id")),
    request_body = ControlRequest,
    responses(
        (status = 204, description = "Applied"),
        (status = 400, description = "Jump index out of range", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn control_session(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
    Json(body): Json<ControlRequest>,
) -> Result<StatusCode, ApiError> {
    let session = session_or_404(&state, &id).await?;
    match body {
        ControlRequest::Toggle => session.toggle_playback().await?,
        ControlRequest::Next => session.next().await?,
        ControlRequest::Previous => session.previous().await?,
        ControlRequest::Jump { index } => session.jump_to(index).await?,
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/display/sessions/{id}/media-errors — the surface reports a
/// media element that failed to render.
#[utoipa::path(
    post,
    path = "/api/display/sessions/{id}/media-errors",
    params(("id" = String, Path, description = "Session id")),
    request_body = MediaErrorReport,
    responses(
        (status = 204, description = "Recorded"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn report_media_error(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
    Json(body): Json<MediaErrorReport>,
) -> Result<StatusCode, ApiError> {
    let session = session_or_404(&state, &id).await?;
    session.report_media_error(ContentId::new(body.content_id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/display/sessions/{id}/refresh — manual re-resolution.
#[utoipa::path(
    post,
    path = "/api/display/sessions/{id}/refresh",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Refresh outcome", body = RefreshResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn refresh_session(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let session = session_or_404(&state, &id).await?;
    let changed = session.refresh().await;
    Ok(Json(RefreshResponse {
        changed,
        frame: session.frame(),
    }))
}

/// DELETE /api/display/sessions/{id} — explicit unmount.
#[utoipa::path(
    delete,
    path = "/api/display/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Closed"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    ),
    tag = "display"
)]
pub(crate) async fn close_session(
    State(state): State<DisplayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = SessionId::from(id.as_str());
    if state.registry.close(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// GET /api/openapi.json — the generated API document.
pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::openapi::ApiDoc::openapi())
}
