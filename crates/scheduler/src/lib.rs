//! Translation-request scheduler and session lifecycle.
//!
//! Many independent callers submit short texts; one non-reentrant
//! engine session services them. This crate provides the coordination
//! between the two: per-source queues drained round-robin by a single
//! supervised worker, an estimated-token budget that recycles the
//! session before its context degrades, and a generation counter that
//! cancels work belonging to a torn-down scope.

mod budget;
mod prompt;
mod queue;
mod session;
mod translator;
mod worker;

pub use translator::{PendingTranslation, SchedulerStatus, Translator};
