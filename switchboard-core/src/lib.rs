//! Switchboard Core
//!
//! This crate provides thread-safe multicast signals. It implements:
//!
//! - Signals generic over argument tuple, slot return type and result policy
//! - Connections that can be severed from either side, and scoped holders
//!   that sever them automatically
//! - Deferred delivery into event loops, with invalidation of calls whose
//!   subscriber has gone away
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `signals`: the signal, its slot table, connections and result combiners
//! - `dispatch`: the event loop contract, invalidation records and two loop
//!   implementations
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard_core::dispatch::{Invalidator, QueuedEventLoop};
//! use switchboard_core::signals::{ScopedConnectionList, Signal, VoidSignal};
//!
//! // A signal with one argument and no result
//! let position: VoidSignal<(u64,)> = Signal::new();
//!
//! // Same-thread subscriber, released when `connections` is dropped
//! let connections = ScopedConnectionList::new();
//! connections.add_connection(position.connect_same_thread(|frame: u64| {
//!     println!("now at {frame}");
//! }));
//!
//! // Subscriber living in the GUI loop
//! let gui = Arc::new(QueuedEventLoop::new("gui"));
//! let invalidator = Invalidator::new();
//! connections.add_connection(position.connect(
//!     |frame: u64| println!("redraw clock at {frame}"),
//!     gui.clone(),
//!     Some(invalidator.record()),
//! ));
//!
//! position.emit((48_000,)); // prints "now at 48000"
//! gui.run_pending();        // prints "redraw clock at 48000"
//! ```

pub mod dispatch;
pub mod signals;

mod config;
mod error;

pub use config::{LoopConfig, SignalConfig};
pub use error::DispatchError;
