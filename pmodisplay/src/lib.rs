//! # PMODisplay
//!
//! The display session layer and its HTTP surface.
//!
//! A signage display mounts by opening a [`DisplaySession`]: the session
//! resolves what should be on air (`pmoschedule`), drives the playback
//! state machine (`pmoplayback`), binds media to fetchable URLs
//! (`pmomedia`) and composes everything into a stream of
//! [`DisplayFrame`]s — one immutable snapshot per state change, which the
//! rendering surface consumes over SSE or by polling.
//!
//! Sessions are ephemeral and hold no authoritative state: they live in a
//! [`SessionRegistry`] keyed by random id, are evicted after a period of
//! inactivity, and are rebuilt from the repositories the next time a
//! display mounts. Closing one cancels its timer and every in-flight
//! media request.
//!
//! [`create_router`] exposes the whole thing as an axum router (REST +
//! SSE + OpenAPI document); the rendering itself stays external.

mod api;
mod frame;
mod openapi;
mod registry;
mod session;
mod sse;

pub use api::{
    ControlRequest, DisplayState, ErrorResponse, MediaErrorReport, OpenSessionRequest,
    OpenSessionResponse, RefreshResponse, create_router,
};
pub use frame::{CurrentSlide, DisplayFrame, SlideMedia, SlideSummary};
pub use openapi::ApiDoc;
pub use registry::SessionRegistry;
pub use session::{DisplaySession, SessionId, SessionOptions};
