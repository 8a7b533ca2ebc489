//! Async Module
//!
//! Deferred completion for asynchronous reads and writes.
//!
//! ## Flow
//! ```text
//!  submit ──► transfer (device lock) ──► sync?  ──yes──► Completed(result)
//!                                          │
//!                                          no
//!                                          ▼
//!                                  PendingCompletion ──► channel ──► worker
//!                                          │                           │
//!                                  Queued(token)            after delay: notify(result)
//! ```
//!
//! Transfers are ordered by the device lock. Notifications are delivered
//! exactly once each, in due-time order, with no ordering promise relative to
//! other threads' submissions.

mod queue;
mod request;

pub use queue::CompletionQueue;
pub use request::{
    Completion, IoBuffer, IoRequest, RequestToken, Submission, Synchronicity,
};
