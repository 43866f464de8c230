//! Signals and Connections
//!
//! This module implements the multicast signal: a registry of slots that
//! all run when the signal is emitted.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is generic over a tuple of argument types, a slot return
//! type, and a [`Combiner`] that reduces the slots' results to a single
//! value. [`VoidSignal`] is the common case of slots that return nothing.
//!
//! ## Connections
//!
//! Connecting a slot returns a [`Connection`], the only handle that can sever
//! that subscription. A connection never keeps its signal alive, and either
//! one may be dropped first.
//!
//! ## Scoped Holders
//!
//! [`ScopedConnection`] and [`ScopedConnectionList`] disconnect what they hold
//! when dropped. Subscribers keep them as fields so their subscriptions end
//! with them.
//!
//! ## Cross-Context Slots
//!
//! [`Signal::connect`] registers a slot that runs inside an
//! [`EventLoop`](crate::dispatch::EventLoop) instead of the emitting thread.
//! See the [`dispatch`](crate::dispatch) module.

mod combiner;
mod connection;
mod scoped;
mod signal;
mod slot;

pub use combiner::{CollectAll, Combiner, Discard, Fold, OptionalLastValue};
pub use connection::{Connection, ConnectionId};
pub use scoped::{ScopedConnection, ScopedConnectionList};
pub use signal::{Signal, VoidSignal};
pub use slot::Slot;
