//! Error types.
//!
//! Emission never fails: a disconnected slot is skipped and an invalidated
//! deferred call is dropped. The only fallible surface is hosting an event
//! loop, which is what [`DispatchError`] covers.

use thiserror::Error;

/// Errors raised while hosting or posting to an event loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// `TokioEventLoop::spawn` was called outside of a tokio runtime.
    #[error("no tokio runtime available to host the event loop")]
    NoRuntime,

    /// The loop has been shut down and no longer accepts calls.
    #[error("event loop {name:?} is closed")]
    LoopClosed {
        /// Name of the loop that rejected the call.
        name: String,
    },

    /// The loop's worker task could not be joined cleanly.
    #[error("event loop {name:?} worker failed: {reason}")]
    Join {
        /// Name of the loop whose worker failed.
        name: String,
        /// Reason reported by the runtime.
        reason: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NoRuntime => "dispatch_no_runtime",
            DispatchError::LoopClosed { .. } => "dispatch_loop_closed",
            DispatchError::Join { .. } => "dispatch_join_failed",
        }
    }
}
