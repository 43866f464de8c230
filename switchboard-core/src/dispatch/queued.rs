//! Queued Event Loop
//!
//! A FIFO of pending calls that its owner drains explicitly. This is the
//! shape of a GUI main loop: other threads post work, and the owning thread
//! runs it between its own iterations.
//!
//! # Draining
//!
//! [`QueuedEventLoop::run_pending`] runs the calls queued when it starts,
//! one at a time and outside the lock. Calls posted while the batch runs
//! (including by calls in the batch) wait for the next drain, so a slot that
//! re-emits its own signal cannot spin the drain forever.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tracing::trace;

use super::event_loop::{EventLoop, PendingCall};
use crate::config::LoopConfig;

/// An event loop drained by its owner.
pub struct QueuedEventLoop {
    name: String,
    queue: Mutex<VecDeque<PendingCall>>,
}

impl QueuedEventLoop {
    /// Create an empty loop with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(LoopConfig::named(name))
    }

    /// Create an empty loop from a config.
    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            name: config.name,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Run every call queued so far, in posting order.
    ///
    /// Returns the number of calls that actually ran; invalidated ones are
    /// dropped and not counted.
    ///
    /// Calls are dequeued one at a time. If a call panics, the rest of the
    /// batch stays queued for the next drain.
    pub fn run_pending(&self) -> usize {
        let queued = self.queue.lock().len();
        if queued == 0 {
            return 0;
        }

        let mut ran = 0;
        for _ in 0..queued {
            // New calls go to the back, so the first `queued` are this batch.
            let Some(call) = self.queue.lock().pop_front() else {
                break;
            };
            if call.run() {
                ran += 1;
            }
        }
        trace!(event_loop = %self.name, queued, ran, "drained event loop");
        ran
    }

    /// Dequeue and run a single call.
    ///
    /// Returns `None` if the queue was empty, otherwise whether the call ran.
    pub fn run_one(&self) -> Option<bool> {
        let call = self.queue.lock().pop_front()?;
        Some(call.run())
    }

    /// Number of calls waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Discard every queued call without running it. Returns how many were
    /// discarded.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut *self.queue.lock());
        dropped.len()
    }
}

impl EventLoop for QueuedEventLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, call: PendingCall) {
        self.queue.lock().push_back(call);
    }
}

impl fmt::Debug for QueuedEventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedEventLoop")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}
