//! Cross-Context Dispatch
//!
//! This module lets a slot run in a different scheduling context than the
//! thread emitting the signal, without risking a call after the subscriber
//! it refers to has been destroyed.
//!
//! # Overview
//!
//! - An [`EventLoop`] accepts deferred work from any thread and runs it on
//!   its own schedule.
//! - A [`PendingCall`] is that work: the slot with its arguments already
//!   bound, plus an optional [`InvalidationRecord`].
//! - The record is owned by the subscriber (through an [`Invalidator`]) and
//!   invalidated when the subscriber dies. A queued call whose record is no
//!   longer valid is dropped instead of run.
//!
//! # Provided Loops
//!
//! 1. [`QueuedEventLoop`]: drained explicitly by its owner, like a GUI main
//!    loop. Deterministic, which also makes it the loop of choice in tests.
//!
//! 2. [`TokioEventLoop`]: a dedicated task on a tokio runtime.
//!
//! Anything else (a UI toolkit's idle queue, a realtime thread's request
//! ring) only needs to implement [`EventLoop::post`].

mod event_loop;
mod invalidation;
mod queued;
mod tokio_loop;

pub use event_loop::{BoundCall, EventLoop, PendingCall};
pub use invalidation::{InvalidationRecord, Invalidator};
pub use queued::QueuedEventLoop;
pub use tokio_loop::TokioEventLoop;
