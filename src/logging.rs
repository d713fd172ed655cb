use log::info;
use std::fmt;

/// Diagnostics collaborator for lifecycle events and unmatched requests.
///
/// The server reports when it starts, stops, is cleared, and when an incoming request
/// matched no stub. The default collaborator discards every message; pass your own
/// through [`StubServerBuilder::logger`](crate::StubServerBuilder::logger).
pub trait Logger: Send + Sync {
    /// Log a plain message.
    fn log(&self, message: &str);

    /// Log a formatted message.
    fn logf(&self, args: fmt::Arguments<'_>) {
        self.log(&args.to_string());
    }
}

/// A `Logger` that does not log anything.
pub(crate) struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _message: &str) {}
}

/// A `Logger` that forwards every message to the `log` crate at info level.
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, message: &str) {
        info!("{}", message);
    }
}
