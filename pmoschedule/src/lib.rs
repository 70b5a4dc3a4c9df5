//! # PMOSchedule
//!
//! Schedule resolution: which sequence of content should a screen be
//! playing right now?
//!
//! [`ScheduleResolver::resolve`] maps a screen reference and the wall clock
//! to an ordered, non-empty [`ResolvedSequence`], walking a strict
//! precedence chain:
//!
//! 1. preview override (`?preview=<content-id>`),
//! 2. the first active schedule bound to the screen whose window covers
//!    now,
//! 3. the pool of active content, newest first,
//! 4. the built-in demo sequence.
//!
//! The chain only moves forward: failures and empty answers both fall
//! through to the next tier, so `resolve` never errors and never returns
//! an empty sequence. A display that has lost its backend shows the demo
//! loop, not a stack trace.

mod demo;
mod resolver;

pub use demo::{demo_sequence, DEMO_HOURS_ID, DEMO_PROMOTION_ID, DEMO_WELCOME_ID};
pub use resolver::{ResolveRequest, ResolvedSequence, ScheduleResolver, SequenceSource};
