//! Connection handles.
//!
//! A Connection represents one slot's subscription to one signal. It is the
//! only handle through which that subscription can be severed.
//!
//! # Ownership
//!
//! A connection is shared: the signal keeps one clone in its slot table and
//! any number of scoped holders keep others. The underlying state is freed
//! when the last clone is dropped.
//!
//! The connection never owns its signal. It holds a weak reference to the
//! signal's slot table, which the signal clears when it is dropped, so a
//! late `disconnect()` is a no-op instead of a use-after-free.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Unique identifier for a connection.
///
/// Used as the key of a signal's slot table, so two connections are never
/// confused even if their slots are identical closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// The part of a signal a connection may reach back into.
pub(crate) trait SlotTable: Send + Sync {
    /// Erase the entry for `id`, if present.
    fn disconnect(&self, id: ConnectionId);

    /// Whether `id` is still registered.
    fn contains(&self, id: ConnectionId) -> bool;
}

struct ConnectionState {
    id: ConnectionId,
    /// `None` once disconnected or once the signal has gone away.
    table: Mutex<Option<Weak<dyn SlotTable>>>,
}

/// Token for a single (signal, slot) pairing.
///
/// Cloning is cheap and every clone refers to the same subscription.
#[derive(Clone)]
pub struct Connection {
    state: Arc<ConnectionState>,
}

impl Connection {
    pub(crate) fn new(table: Weak<dyn SlotTable>) -> Self {
        Self {
            state: Arc::new(ConnectionState {
                id: ConnectionId::new(),
                table: Mutex::new(Some(table)),
            }),
        }
    }

    /// Get the connection's unique ID.
    pub fn id(&self) -> ConnectionId {
        self.state.id
    }

    /// Stop receiving emissions.
    ///
    /// Idempotent: calling it twice, or after the signal has been dropped,
    /// does nothing.
    pub fn disconnect(&self) {
        // Release our own lock before taking the signal's.
        let table = self.state.table.lock().take();
        if let Some(table) = table.and_then(|weak| weak.upgrade()) {
            table.disconnect(self.state.id);
        }
    }

    /// Whether the slot is still registered with a live signal.
    pub fn is_connected(&self) -> bool {
        let table = self.state.table.lock().clone();
        table
            .and_then(|weak| weak.upgrade())
            .map(|table| table.contains(self.state.id))
            .unwrap_or(false)
    }

    /// Called by the owning signal while it is being dropped.
    pub(crate) fn signal_going_away(&self) {
        *self.state.table.lock() = None;
    }

    /// Whether this connection was created by the slot table at `table`.
    pub(crate) fn is_owned_by(&self, table: *const ()) -> bool {
        self.state
            .table
            .lock()
            .as_ref()
            .map(|weak| weak.as_ptr() as *const () == table)
            .unwrap_or(false)
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.state.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
