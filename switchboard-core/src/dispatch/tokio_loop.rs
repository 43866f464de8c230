//! Tokio-hosted event loop.
//!
//! ```text
//! call_slot(record, call)           worker task
//!     │                                 │
//!     └──► [unbounded queue] ─────────► PendingCall::run()
//!                                        ├─ record invalidated → dropped
//!                                        └─ panic → logged, loop continues
//! ```
//!
//! Calls run one at a time, in posting order, on a tokio worker thread.
//! Slots are synchronous, so long-running ones stall this loop (and the
//! runtime thread it is on) for their duration.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::event_loop::{EventLoop, PendingCall};
use crate::config::LoopConfig;
use crate::error::DispatchError;

/// An event loop backed by a dedicated tokio task.
pub struct TokioEventLoop {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<PendingCall>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TokioEventLoop {
    /// Start a loop on the current tokio runtime.
    ///
    /// # Errors
    /// [`DispatchError::NoRuntime`] when called outside a runtime.
    pub fn spawn(config: LoopConfig) -> Result<Self, DispatchError> {
        let handle = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        Ok(Self::spawn_on(&handle, config))
    }

    /// Start a loop on the given runtime.
    pub fn spawn_on(handle: &Handle, config: LoopConfig) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PendingCall>();
        let name = config.name.clone();
        let catch_panics = config.catch_panics;

        let worker = handle.spawn(async move {
            while let Some(call) = receiver.recv().await {
                if !catch_panics {
                    call.run();
                    continue;
                }
                if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(move || call.run())) {
                    warn!(
                        event_loop = %name,
                        reason = %panic_message(panic_err.as_ref()),
                        "deferred call panicked"
                    );
                }
            }
            debug!(event_loop = %name, "event loop stopped");
        });
        debug!(event_loop = %config.name, "event loop started");

        Self {
            name: config.name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a call, reporting a closed loop instead of logging it.
    pub fn try_post(&self, call: PendingCall) -> Result<(), DispatchError> {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => sender.send(call).map_err(|_| self.closed()),
            None => Err(self.closed()),
        }
    }

    /// Whether the loop still accepts calls.
    ///
    /// Turns false after `shutdown`, and also once the worker has died from
    /// an uncaught panic.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map(|sender| !sender.is_closed())
            .unwrap_or(false)
    }

    /// Stop accepting calls, let the worker finish what is already queued,
    /// and wait for it.
    ///
    /// Calling it again once stopped is a no-op.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        match worker {
            Some(worker) => worker.await.map_err(|e| DispatchError::Join {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn closed(&self) -> DispatchError {
        DispatchError::LoopClosed {
            name: self.name.clone(),
        }
    }
}

impl EventLoop for TokioEventLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, call: PendingCall) {
        if let Err(err) = self.try_post(call) {
            warn!(event_loop = %self.name, error = %err, label = err.as_label(), "call dropped");
        }
    }
}

impl fmt::Debug for TokioEventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioEventLoop")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

fn panic_message(panic_err: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
