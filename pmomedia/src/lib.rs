//! # PMOMedia
//!
//! Media binding for the PMOSign display engine.
//!
//! A sequence coming out of the resolver references its images and videos
//! either by a `storage_path` into the private bucket (which needs a signed
//! URL before anything can fetch it) or by a literal URL. The
//! [`MediaBinder`] turns those references into fetchable URLs, one
//! concurrent task per item, and publishes the accumulating result as a
//! [`MediaMap`] on a watch channel.
//!
//! Two properties matter more than speed here:
//!
//! - **isolation** — one item failing to sign never touches its siblings;
//!   the slide show keeps rotating with a placeholder in the bad slot,
//! - **no retry loops** — a failed id stays failed for the binder's
//!   lifetime, so an unavailable media element renders as a stable
//!   "unavailable" rather than hammering the backend.

mod binder;
mod map;

pub use binder::{BinderOptions, MediaBinder};
pub use map::{MediaMap, MediaState};
