//! Scoped connection holders.
//!
//! Holders guarantee release without manual bookkeeping: dropping a
//! [`ScopedConnection`] or [`ScopedConnectionList`] disconnects whatever it
//! still holds. Whichever of the holder and the signal dies first, nothing
//! dangles.

use std::fmt;

use parking_lot::Mutex;

use super::connection::Connection;

/// Owns exactly one connection and disconnects it on drop.
///
/// # Example
///
/// ```rust,ignore
/// struct Meter {
///     level_changed: ScopedConnection,
/// }
///
/// let mut meter = Meter { level_changed: ScopedConnection::new() };
/// meter.level_changed.set(level.connect_same_thread(|db: f32| redraw(db)));
/// // Dropping `meter` stops the redraws.
/// ```
#[derive(Default)]
pub struct ScopedConnection {
    connection: Option<Connection>,
}

impl ScopedConnection {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `connection`, disconnecting the previously held one first.
    ///
    /// Setting the connection already held is a no-op.
    pub fn set(&mut self, connection: Connection) {
        if self.connection.as_ref() == Some(&connection) {
            return;
        }
        if let Some(old) = self.connection.replace(connection) {
            old.disconnect();
        }
    }

    /// Disconnect the held connection now.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
    }

    /// Give up the held connection without disconnecting it.
    pub fn release(&mut self) -> Option<Connection> {
        self.connection.take()
    }

    /// The held connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Whether a connection is held and still live.
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .map(Connection::is_connected)
            .unwrap_or(false)
    }
}

impl From<Connection> for ScopedConnection {
    fn from(connection: Connection) -> Self {
        Self {
            connection: Some(connection),
        }
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnection")
            .field("connection", &self.connection)
            .finish()
    }
}

/// Owns any number of connections and disconnects them all on drop.
///
/// Connections can be added at any point of the list's life and from any
/// thread, which suits an object that subscribes to several signals and is
/// torn down as a unit.
#[derive(Default)]
pub struct ScopedConnectionList {
    connections: Mutex<Vec<Connection>>,
}

impl ScopedConnectionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `connection`.
    ///
    /// Connections already severed (their signal dropped, or disconnected
    /// elsewhere) are pruned first, so a long-lived list does not grow
    /// without bound.
    pub fn add_connection(&self, connection: Connection) {
        let mut connections = self.connections.lock();
        connections.retain(Connection::is_connected);
        connections.push(connection);
    }

    /// Disconnect everything held so far. The list remains usable.
    pub fn drop_connections(&self) {
        let drained = std::mem::take(&mut *self.connections.lock());
        for connection in drained {
            connection.disconnect();
        }
    }

    /// Number of connections held, live or not.
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }
}

impl Drop for ScopedConnectionList {
    fn drop(&mut self) {
        self.drop_connections();
    }
}

impl fmt::Debug for ScopedConnectionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConnectionList")
            .field("connections", &self.len())
            .finish()
    }
}
