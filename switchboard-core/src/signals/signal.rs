//! Signal Implementation
//!
//! A Signal is a multicast callback registry: one emission invokes every
//! slot that is connected at the time.
//!
//! # How Emission Works
//!
//! 1. Under the lock, copy the current slot table into a local snapshot and
//!    release the lock.
//!
//! 2. Walk the snapshot in connection order. Before each call, briefly
//!    retake the lock and check that the entry is still in the live table. A
//!    slot invoked earlier in this pass may have disconnected it.
//!
//! 3. Invoke live slots outside the lock and hand their results, in order,
//!    to the signal's [`Combiner`].
//!
//! Slots connected during an emission are not part of its snapshot and run
//! from the next emission on. Slots may connect to, disconnect from, and
//! emit the very signal that is calling them.
//!
//! # Thread Safety
//!
//! All operations take `&self` and are safe to call from many threads at
//! once. The slot table is only touched while its mutex is held, and the
//! mutex is never held across a slot call. Emissions racing with a connect
//! on another thread may or may not include the new slot, depending on
//! which side takes the snapshot lock first.
//!
//! # Teardown
//!
//! Either side may go first. Dropping the signal tells every registered
//! connection that the signal is going away, so later `disconnect()` calls
//! become no-ops. Dropping a scoped holder first erases its entry from the
//! live table.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::combiner::{Combiner, Discard, OptionalLastValue};
use super::connection::{Connection, ConnectionId, SlotTable};
use super::slot::Slot;
use crate::config::SignalConfig;
use crate::dispatch::{EventLoop, InvalidationRecord};

/// Results of a single emission are buffered inline up to this many slots.
const INLINE_SLOTS: usize = 8;

type SlotFn<Args, R> = Arc<dyn Fn(Args) -> R + Send + Sync>;

struct Entry<Args, R> {
    connection: Connection,
    slot: SlotFn<Args, R>,
}

/// The shared, lock-protected slot table.
///
/// Connections hold a weak reference to this, never to the [`Signal`].
struct SlotRegistry<Args, R> {
    /// Insertion-ordered; removals keep the order of the remaining entries.
    slots: Mutex<IndexMap<ConnectionId, Entry<Args, R>>>,
    name: Cow<'static, str>,
    debug_connections: AtomicBool,
}

impl<Args, R> SlotRegistry<Args, R> {
    fn log_change(&self, change: &'static str, id: ConnectionId, slots: usize) {
        if self.debug_connections.load(Ordering::Relaxed) {
            debug!(signal = %self.name, connection = %id, slots, "{change}");
        } else {
            trace!(signal = %self.name, connection = %id, slots, "{change}");
        }
    }
}

impl<Args, R> SlotTable for SlotRegistry<Args, R>
where
    Args: 'static,
    R: 'static,
{
    fn disconnect(&self, id: ConnectionId) {
        let (removed, remaining) = {
            let mut slots = self.slots.lock();
            let removed = slots.shift_remove(&id);
            (removed, slots.len())
        };
        // The slot is dropped here, outside the lock; its captures may
        // themselves disconnect from this signal.
        if removed.is_some() {
            self.log_change("disconnect", id, remaining);
        }
    }

    fn contains(&self, id: ConnectionId) -> bool {
        self.slots.lock().contains_key(&id)
    }
}

/// A thread-safe multicast signal.
///
/// # Type Parameters
///
/// - `Args`: tuple of argument types, e.g. `()`, `(u32,)`, `(String, f64)`.
///   Every slot receives its own clone of the emitted arguments.
/// - `R`: return type of each slot.
/// - `C`: the [`Combiner`] turning the slots' results into `emit`'s result.
///   Defaults to [`OptionalLastValue`].
///
/// # Example
///
/// ```rust,ignore
/// let level: Signal<(f32,), f32> = Signal::new();
///
/// let conn = level.connect_same_thread(|db: f32| db * 2.0);
/// assert_eq!(level.emit((3.0,)), Some(6.0));
///
/// conn.disconnect();
/// assert_eq!(level.emit((3.0,)), None);
/// ```
pub struct Signal<Args, R = (), C = OptionalLastValue> {
    registry: Arc<SlotRegistry<Args, R>>,
    combiner: C,
}

/// A signal whose slots return nothing; `emit` returns `()`.
pub type VoidSignal<Args> = Signal<Args, (), Discard>;

impl<Args, R, C> Signal<Args, R, C>
where
    Args: Clone + 'static,
    R: 'static,
    C: Combiner<R>,
{
    /// Create an empty signal using the combiner's default value.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_combiner(C::default())
    }

    /// Create an empty signal with an explicit combiner.
    pub fn with_combiner(combiner: C) -> Self {
        Self::with_config(SignalConfig::default(), combiner)
    }

    /// Create an empty signal with explicit options and combiner.
    pub fn with_config(config: SignalConfig, combiner: C) -> Self {
        Self {
            registry: Arc::new(SlotRegistry {
                slots: Mutex::new(IndexMap::new()),
                name: config.name,
                debug_connections: AtomicBool::new(config.debug_connections),
            }),
            combiner,
        }
    }

    /// The name used in log output.
    pub fn name(&self) -> &str {
        &self.registry.name
    }

    /// Log connect/disconnect at `debug` level instead of `trace`.
    pub fn set_debug_connections(&self, enabled: bool) {
        self.registry
            .debug_connections
            .store(enabled, Ordering::Relaxed);
    }

    /// Arrange for `slot` to be called whenever this signal is emitted.
    ///
    /// The slot runs synchronously in the emitting thread.
    pub fn connect_same_thread<S>(&self, slot: S) -> Connection
    where
        S: Slot<Args, R>,
    {
        self.insert(Arc::new(move |args: Args| slot.call(args)))
    }

    /// Emit the signal, calling every connected slot in connection order.
    ///
    /// Blocks for the full duration of every same-thread slot.
    pub fn emit(&self, args: Args) -> C::Output {
        let snapshot: SmallVec<[(ConnectionId, SlotFn<Args, R>); INLINE_SLOTS]> = {
            let slots = self.registry.slots.lock();
            slots
                .iter()
                .map(|(id, entry)| (*id, Arc::clone(&entry.slot)))
                .collect()
        };

        let mut results: SmallVec<[R; INLINE_SLOTS]> = SmallVec::new();
        for (id, slot) in snapshot {
            // A slot called earlier in this pass may have disconnected this one.
            let still_there = self.registry.slots.lock().contains_key(&id);
            if still_there {
                results.push(slot(args.clone()));
            }
        }

        self.combiner.combine(results)
    }

    /// Whether no slots are connected.
    pub fn is_empty(&self) -> bool {
        self.registry.slots.lock().is_empty()
    }

    /// Number of connected slots.
    pub fn len(&self) -> usize {
        self.registry.slots.lock().len()
    }

    /// Disconnect `connection` if it belongs to this signal.
    ///
    /// A connection made on another signal is left alone.
    pub fn disconnect(&self, connection: &Connection) {
        if connection.is_owned_by(self.table_ptr()) {
            connection.disconnect();
        } else {
            trace!(signal = %self.registry.name, connection = %connection.id(), "ignoring foreign connection");
        }
    }

    /// Disconnect every slot.
    pub fn disconnect_all(&self) {
        let drained = std::mem::take(&mut *self.registry.slots.lock());
        if !drained.is_empty() {
            debug!(signal = %self.registry.name, slots = drained.len(), "disconnected all slots");
        }
    }

    fn insert(&self, slot: SlotFn<Args, R>) -> Connection {
        let table: Weak<dyn SlotTable> = Arc::downgrade(&self.registry) as Weak<dyn SlotTable>;
        let connection = Connection::new(table);

        let slots = {
            let mut slots = self.registry.slots.lock();
            slots.insert(
                connection.id(),
                Entry {
                    connection: connection.clone(),
                    slot,
                },
            );
            slots.len()
        };
        self.registry.log_change("connect", connection.id(), slots);

        connection
    }

    fn table_ptr(&self) -> *const () {
        Arc::as_ptr(&self.registry) as *const ()
    }
}

impl<Args, C> Signal<Args, (), C>
where
    Args: Clone + Send + 'static,
    C: Combiner<()>,
{
    /// Arrange for `slot` to run in the context of `event_loop` whenever this
    /// signal is emitted.
    ///
    /// What gets registered is a small forwarding closure: emitting posts the
    /// call to the loop and returns immediately, and the slot itself runs
    /// later on the loop's own schedule. Deferred calls contribute nothing to
    /// the emission's combined result.
    ///
    /// Pass an [`InvalidationRecord`] whenever the loop may outlive anything
    /// `slot` refers to. Calls still queued when the record is invalidated
    /// are dropped instead of run. Pass `None` only when the loop is known to
    /// stop before the slot's captures go away.
    pub fn connect<S>(
        &self,
        slot: S,
        event_loop: Arc<dyn EventLoop>,
        invalidation: Option<InvalidationRecord>,
    ) -> Connection
    where
        S: Slot<Args, ()>,
    {
        if let Some(record) = &invalidation {
            record.attach(event_loop.name());
        }

        let slot = Arc::new(slot);
        self.insert(Arc::new(move |args: Args| {
            let slot = Arc::clone(&slot);
            event_loop.call_slot(invalidation.clone(), Box::new(move || S::call(&slot, args)));
        }))
    }
}

impl<Args, R, C> Default for Signal<Args, R, C>
where
    Args: Clone + 'static,
    R: 'static,
    C: Combiner<R> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Args, R, C> Drop for Signal<Args, R, C> {
    fn drop(&mut self) {
        let drained = {
            let mut slots = self.registry.slots.lock();
            // Tell our connections we are going away, so they don't try to
            // reach back into us.
            for entry in slots.values() {
                entry.connection.signal_going_away();
            }
            std::mem::take(&mut *slots)
        };
        trace!(signal = %self.registry.name, slots = drained.len(), "signal dropped");
    }
}

impl<Args, R, C> fmt::Debug for Signal<Args, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.registry.name)
            .field("slots", &self.registry.slots.lock().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
