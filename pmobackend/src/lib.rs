//! # PMOBackend
//!
//! Data access for the PMOSign display engine.
//!
//! The engine reads four things from the outside world: content items,
//! schedules (joined with their playlist), screens, and signed URLs for
//! media stored in a private bucket. Each is a small async trait here, so
//! the resolver and the media binder never know whether they are talking
//! to the hosted backend or to an in-memory fixture:
//!
//! - [`ContentRepository`] / [`ScheduleRepository`] / [`ScreenRepository`] —
//!   read-only queries,
//! - [`SignedUrlProvider`] — blob-store URL signing,
//! - [`SignageBackend`] — umbrella trait for "all of the above".
//!
//! Two implementations ship with the crate:
//!
//! - [`RestBackend`] — the hosted backend over HTTP (PostgREST dialect for
//!   the tables, storage signing endpoint for the bucket),
//! - [`MemoryBackend`] — in-memory fixture for tests and offline mode.
//!
//! This layer reports failures, it does not hide them: degradation policy
//! (fall back to the pool, then to demo content) belongs to the resolver.

mod error;
mod memory;
mod rest;
mod rows;
mod traits;

pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
pub use rest::{
    RestBackend, RestBackendBuilder, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SIGNED_URL_EXPIRY_SECS,
    DEFAULT_STORAGE_BUCKET,
};
pub use traits::{
    ContentRepository, PlaylistSlot, ScheduleEntry, ScheduleRepository, ScreenRepository,
    SignageBackend, SignedUrlProvider,
};
