//! The event loop contract.

use std::fmt;

use tracing::trace;

use super::invalidation::InvalidationRecord;

/// A deferred call with its arguments already bound.
pub type BoundCall = Box<dyn FnOnce() + Send + 'static>;

/// A target scheduling context that accepts deferred work.
///
/// Implementors only decide *where* and *when* a [`PendingCall`] runs; the
/// invalidation check lives in [`PendingCall::run`], so every loop honors it
/// the same way.
pub trait EventLoop: Send + Sync {
    /// Name used in log output and recorded on invalidation records.
    fn name(&self) -> &str;

    /// Queue `call` to run on this loop's own schedule.
    ///
    /// Must be safe to call from any thread and must not run the call
    /// synchronously.
    fn post(&self, call: PendingCall);

    /// Queue `call`, to be dropped instead of run if `invalidation` has been
    /// invalidated by the time the loop gets to it. With no record the call
    /// is always attempted.
    fn call_slot(&self, invalidation: Option<InvalidationRecord>, call: BoundCall) {
        self.post(PendingCall::new(invalidation, call));
    }
}

/// A call waiting in an event loop's queue.
///
/// While queued, the call counts towards its record's
/// [`pending_calls`](InvalidationRecord::pending_calls).
pub struct PendingCall {
    invalidation: Option<InvalidationRecord>,
    call: Option<BoundCall>,
}

impl PendingCall {
    /// Bind a call to an optional invalidation record.
    pub fn new(invalidation: Option<InvalidationRecord>, call: BoundCall) -> Self {
        if let Some(record) = &invalidation {
            record.acquire();
        }
        Self {
            invalidation,
            call: Some(call),
        }
    }

    /// Whether the call would run if executed now.
    pub fn is_valid(&self) -> bool {
        self.invalidation
            .as_ref()
            .map(InvalidationRecord::is_valid)
            .unwrap_or(true)
    }

    /// Run the call unless its record has been invalidated.
    ///
    /// Returns whether the call ran.
    pub fn run(mut self) -> bool {
        let Some(call) = self.call.take() else {
            return false;
        };
        if !self.is_valid() {
            trace!("dropping call for invalidated subscriber");
            return false;
        }
        call();
        true
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if let Some(record) = &self.invalidation {
            record.release();
        }
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("invalidation", &self.invalidation)
            .finish_non_exhaustive()
    }
}
