//! Construction-time options for signals and event loops.

use std::borrow::Cow;

/// Options applied when a [`Signal`](crate::signals::Signal) is created.
///
/// ```rust,ignore
/// let config = SignalConfig::named("transport-state").debug_connections(true);
/// let signal: Signal<(f64,)> = Signal::with_config(config, OptionalLastValue);
/// ```
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Name used in log output.
    pub name: Cow<'static, str>,

    /// Log every connect/disconnect at `debug` level instead of `trace`.
    pub debug_connections: bool,
}

impl SignalConfig {
    /// Create a config with the given signal name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Enable or disable connection-change diagnostics.
    pub fn debug_connections(mut self, enabled: bool) -> Self {
        self.debug_connections = enabled;
        self
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("signal"),
            debug_connections: false,
        }
    }
}

/// Options applied when an event loop is created.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Name used in log output and recorded on invalidation records.
    pub name: String,

    /// Catch panics raised by deferred calls instead of tearing down the loop.
    pub catch_panics: bool,
}

impl LoopConfig {
    /// Create a config with the given loop name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Choose whether a panicking call is caught and logged.
    pub fn catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: "event-loop".to_string(),
            catch_panics: true,
        }
    }
}
