use std::sync::Arc;

use crate::logging::{Logger, NoopLogger};
use crate::server::StubServer;

/// A builder providing a fluent API to assemble a [`StubServer`] step-by-step.
/// Use [`StubServer::builder`] to get started.
pub struct StubServerBuilder {
    logger: Arc<dyn Logger>,
}

impl StubServerBuilder {
    pub(crate) fn new() -> Self {
        Self {
            logger: Arc::new(NoopLogger),
        }
    }

    /// Set the diagnostics collaborator used for lifecycle and no-match messages.
    ///
    /// By default every message is discarded. Use [`FacadeLogger`](crate::FacadeLogger)
    /// to forward them to the `log` crate, or bring your own [`Logger`] implementation
    /// to collect them in a test.
    pub fn logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Finalise the builder into an unstarted [`StubServer`].
    pub fn build(self) -> StubServer {
        StubServer::with_logger(self.logger)
    }

    /// Finalise the builder and start the server, panicking on failure.
    pub fn start(self) -> StubServer {
        let server = self.build();
        server.must_start();
        server
    }
}
