//! OpenAPI document for the display API, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::api;
use crate::frame::{CurrentSlide, DisplayFrame, SlideMedia, SlideSummary};
use crate::session::SessionId;
use crate::sse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PMOSign display API",
        description = "Schedule resolution, playback control and frame \
                       streaming for digital-signage displays. Markup slides \
                       expose raw HTML intended for a sandboxed \
                       iframe-equivalent only.",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        api::list_screens,
        api::open_session,
        api::get_frame,
        api::control_session,
        api::report_media_error,
        api::refresh_session,
        api::close_session,
        sse::frame_events,
    ),
    components(schemas(
        SessionId,
        DisplayFrame,
        CurrentSlide,
        SlideSummary,
        SlideMedia,
        api::ErrorResponse,
        api::OpenSessionRequest,
        api::OpenSessionResponse,
        api::ControlRequest,
        api::MediaErrorReport,
        api::RefreshResponse,
    )),
    tags(
        (name = "display", description = "Display sessions: open, control, stream, close"),
        (name = "screens", description = "Screen selector data")
    )
)]
pub struct ApiDoc;
