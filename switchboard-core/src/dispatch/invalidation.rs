//! Invalidation Records
//!
//! A deferred call may sit in an event loop's queue for a while. If the
//! subscriber it refers to is destroyed in the meantime, the call must be
//! dropped rather than run. An [`InvalidationRecord`] is the liveness token
//! that makes this possible: the subscriber side owns it (usually through an
//! [`Invalidator`]), every queued call carries a clone, and the loop checks
//! it immediately before running the call.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

struct RecordState {
    valid: AtomicBool,
    /// Calls queued on a loop that still reference this record.
    pending: AtomicUsize,
    /// Loop the record was last connected through.
    event_loop: Mutex<Option<String>>,
}

/// Liveness token tied to a subscriber's lifetime.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct InvalidationRecord {
    state: Arc<RecordState>,
}

impl InvalidationRecord {
    /// Create a valid record.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RecordState {
                valid: AtomicBool::new(true),
                pending: AtomicUsize::new(0),
                event_loop: Mutex::new(None),
            }),
        }
    }

    /// Mark the subscriber as gone. Queued calls carrying this record will be
    /// dropped. Cannot be undone.
    pub fn invalidate(&self) {
        if self.state.valid.swap(false, Ordering::AcqRel) {
            trace!(
                pending = self.pending_calls(),
                event_loop = ?self.event_loop_name(),
                "invalidation record invalidated"
            );
        }
    }

    /// Whether the subscriber is still alive.
    pub fn is_valid(&self) -> bool {
        self.state.valid.load(Ordering::Acquire)
    }

    /// Number of queued calls that still reference this record.
    pub fn pending_calls(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Name of the event loop this record was connected through, if any.
    pub fn event_loop_name(&self) -> Option<String> {
        self.state.event_loop.lock().clone()
    }

    pub(crate) fn attach(&self, event_loop: &str) {
        *self.state.event_loop.lock() = Some(event_loop.to_string());
    }

    pub(crate) fn acquire(&self) {
        self.state.pending.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        self.state.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Default for InvalidationRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InvalidationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationRecord")
            .field("valid", &self.is_valid())
            .field("pending", &self.pending_calls())
            .field("event_loop", &self.event_loop_name())
            .finish()
    }
}

/// Owns an [`InvalidationRecord`] and invalidates it when dropped.
///
/// Keep one as a field of the subscriber; its deferred calls then die with
/// it.
///
/// ```rust,ignore
/// struct Strip {
///     invalidator: Invalidator,
///     connections: ScopedConnectionList,
/// }
///
/// let strip = Strip { invalidator: Invalidator::new(), connections: ScopedConnectionList::new() };
/// strip.connections.add_connection(gain.connect(
///     |db: f32| println!("gain {db}"),
///     gui_loop.clone(),
///     Some(strip.invalidator.record()),
/// ));
/// ```
#[derive(Debug, Default)]
pub struct Invalidator {
    record: InvalidationRecord,
}

impl Invalidator {
    /// Create an invalidator with a fresh record.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the owned record, to pass to `Signal::connect`.
    pub fn record(&self) -> InvalidationRecord {
        self.record.clone()
    }
}

impl Drop for Invalidator {
    fn drop(&mut self) {
        self.record.invalidate();
    }
}
