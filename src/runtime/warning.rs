//! Warning sinks.
//!
//! A native warning never aborts a call. It is forwarded to the sink attached
//! to the wrapper that made the call, or to the process-wide sink when the
//! wrapper has none (static classes, helpers without a custom handler).

use super::error::NativeException;
use std::fmt;
use std::sync::Arc;

/// Receives native warnings.
pub trait WarningSink: Send + Sync {
    fn warning(&self, warning: &NativeException);
}

impl<F> WarningSink for F
where
    F: Fn(&NativeException) + Send + Sync,
{
    fn warning(&self, warning: &NativeException) {
        self(warning)
    }
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarningSink;

impl WarningSink for TracingWarningSink {
    fn warning(&self, warning: &NativeException) {
        tracing::warn!(severity = warning.severity, "{}", warning);
    }
}

static PROCESS_SINK: TracingWarningSink = TracingWarningSink;

/// The sink used by wrappers that have no sink of their own.
pub fn process_sink() -> &'static dyn WarningSink {
    &PROCESS_SINK
}

/// Per-wrapper warning routing: an optional custom sink, falling back to
/// [`process_sink`].
#[derive(Clone, Default)]
pub struct Warnings {
    sink: Option<Arc<dyn WarningSink>>,
}

impl Warnings {
    pub fn set_sink(&mut self, sink: Arc<dyn WarningSink>) {
        self.sink = Some(sink);
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }
}

impl WarningSink for Warnings {
    fn warning(&self, warning: &NativeException) {
        match &self.sink {
            Some(sink) => sink.warning(warning),
            None => process_sink().warning(warning),
        }
    }
}

impl fmt::Debug for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Warnings")
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}
