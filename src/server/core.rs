use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::oneshot;
use url::Url;

use crate::logging::Logger;
use crate::matchers::UrlMatcher;
use crate::registry::StubRegistry;
use crate::server::hyper::run_server;
use crate::server::StubServerBuilder;
use crate::stub::Stub;

/// The errors surfaced by the [`StubServer`] lifecycle operations.
///
/// Everything else in this crate - invalid matcher configuration, invalid response
/// rules - is a test-author mistake and panics instead.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound or the serving thread could not be spawned.
    #[error("failed to start the stub server: {0}")]
    Start(#[from] std::io::Error),
    /// The server was already shut down. Closed servers cannot be restarted: create a
    /// new instance instead.
    #[error("the stub server is shut down; create a new server to serve again")]
    AlreadyClosed,
}

enum State {
    Unstarted,
    Listening {
        address: SocketAddr,
        shutdown: oneshot::Sender<()>,
        thread: JoinHandle<()>,
    },
    Closed {
        address: Option<SocketAddr>,
    },
}

/// An HTTP server running in the background, answering incoming requests with the canned
/// response of whichever registered [`Stub`] matches first.
///
/// Stubs are tried in registration order; the first stub whose whole matcher chain holds
/// wins. A request that matches no stub receives the fallback response: HTTP status
/// `666` with the plain-text body `no stubs for <METHOD> <URL>`, deliberately
/// non-standard so it can never be mistaken for a real service response.
///
/// Each instance of `StubServer` is fully isolated: [`start`](StubServer::start) binds a
/// random port available on your local machine. You should use one instance for each
/// test to ensure full isolation and no cross-test interference, or
/// [`clear`](StubServer::clear) the server between test cases to reuse the listener.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::url;
/// use httpstub::response::{with_json, with_status};
/// use httpstub::StubServer;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///
///     server
///         .stub("GET", url("/api/users?page=1"))
///         .respond([with_status(200), with_json(json!([{ "name": "john" }]))]);
///
///     // Act
///     let response = reqwest::get(server.url("/api/users?page=1")).await.unwrap();
///
///     // Assert
///     assert_eq!(response.status().as_u16(), 200);
///
///     // Requests that match no stub receive the fallback response.
///     let response = reqwest::get(server.url("/api/users?page=2")).await.unwrap();
///     assert_eq!(response.status().as_u16(), 666);
///     assert_eq!(
///         response.text().await.unwrap(),
///         "no stubs for GET /api/users?page=2"
///     );
/// }
/// ```
pub struct StubServer {
    registry: Arc<RwLock<StubRegistry>>,
    logger: Arc<dyn Logger>,
    state: Mutex<State>,
}

impl StubServer {
    /// Create an unstarted server with the default (discarding) logger.
    ///
    /// Use [`StubServer::builder`] if you need to plug in a [`Logger`] collaborator.
    pub fn new() -> Self {
        StubServerBuilder::new().build()
    }

    /// You can use `StubServer::builder` if you need to specify custom configuration -
    /// e.g. a logger collaborator for lifecycle and no-match diagnostics.
    ///
    /// If this is not your case, use [`StubServer::new`] or [`StubServer::start_new`].
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::new()
    }

    pub(crate) fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(StubRegistry::new())),
            logger,
            state: Mutex::new(State::Unstarted),
        }
    }

    /// Create a server and start it, panicking on failure.
    pub fn start_new() -> Self {
        let server = Self::new();
        server.must_start();
        server
    }

    /// Bind a random port on `127.0.0.1` and start serving in a background thread.
    ///
    /// `start` is idempotent while the server is listening: calling it again succeeds
    /// and keeps the same address. Once the server has been
    /// [`shutdown`](StubServer::shutdown) it cannot be started again -
    /// [`ServerError::AlreadyClosed`] is returned and a new instance must be created.
    pub fn start(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().expect("Poisoned lock!");
        match &*state {
            State::Listening { .. } => return Ok(()),
            State::Closed { .. } => return Err(ServerError::AlreadyClosed),
            State::Unstarted => {}
        }

        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let address = listener.local_addr()?;

        let (shutdown, shutdown_receiver) = oneshot::channel();
        let registry = Arc::clone(&self.registry);
        let logger = Arc::clone(&self.logger);
        let thread = std::thread::Builder::new()
            .name("httpstub-server".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("Cannot build local tokio runtime");

                runtime.block_on(run_server(listener, registry, logger, shutdown_receiver));
            })?;

        self.logger
            .logf(format_args!("server started at http://{}", address));

        *state = State::Listening {
            address,
            shutdown,
            thread,
        };
        Ok(())
    }

    /// Like [`start`](StubServer::start), but panics on failure.
    pub fn must_start(&self) {
        if let Err(error) = self.start() {
            panic!("{}", error);
        }
    }

    /// Stop the listener and wait for the serving thread to finish.
    ///
    /// `shutdown` is idempotent: shutting down a server that was never started, or one
    /// that is already closed, does nothing and succeeds.
    pub fn shutdown(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().expect("Poisoned lock!");
        match std::mem::replace(&mut *state, State::Closed { address: None }) {
            State::Unstarted => {
                *state = State::Unstarted;
            }
            State::Closed { address } => {
                *state = State::Closed { address };
            }
            State::Listening {
                address,
                shutdown,
                thread,
            } => {
                let _ = shutdown.send(());
                let _ = thread.join();
                self.logger
                    .logf(format_args!("server stopped at http://{}", address));
                *state = State::Closed {
                    address: Some(address),
                };
            }
        }
        Ok(())
    }

    /// Like [`shutdown`](StubServer::shutdown), but panics on failure.
    pub fn must_shutdown(&self) {
        if let Err(error) = self.shutdown() {
            panic!("{}", error);
        }
    }

    /// Drop every registered stub.
    ///
    /// Works in any lifecycle state and never closes the listener: a running server can
    /// be cleared and reused across test cases without recreating it. Until new stubs
    /// are registered, every request receives the fallback response.
    ///
    /// ### Example:
    /// ```rust
    /// use httpstub::matchers::path;
    /// use httpstub::response::with_status;
    /// use httpstub::StubServer;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     // Arrange
    ///     let server = StubServer::start_new();
    ///     server.stub("GET", path("/hello")).respond([with_status(204)]);
    ///
    ///     let response = reqwest::get(server.url("/hello")).await.unwrap();
    ///     assert_eq!(response.status().as_u16(), 204);
    ///
    ///     // Act
    ///     server.clear();
    ///
    ///     // Assert - the stub is gone, the listener is not
    ///     let response = reqwest::get(server.url("/hello")).await.unwrap();
    ///     assert_eq!(response.status().as_u16(), 666);
    /// }
    /// ```
    pub fn clear(&self) {
        self.registry.write().expect("Poisoned lock!").clear();

        if let State::Listening { address, .. } = &*self.state.lock().expect("Poisoned lock!") {
            self.logger
                .logf(format_args!("server cleared at http://{}", address));
        }
    }

    /// Register a stub matching `method` and `url`, returning it for further
    /// configuration.
    ///
    /// The returned [`Stub`] starts out with the two mandatory matchers - method
    /// equality and the given URL matcher - and replies with `200 OK` and an empty body
    /// until response rules are applied with [`Stub::respond`].
    pub fn stub<M: AsRef<str>>(&self, method: M, url: UrlMatcher) -> Stub {
        let stub = Stub::new(method, url);
        self.registry
            .write()
            .expect("Poisoned lock!")
            .register(stub.clone());
        stub
    }

    /// Return the socket address of this running instance of `StubServer`, e.g.
    /// `127.0.0.1:4372`.
    ///
    /// Panics if the server was never started. The address remains available after
    /// shutdown.
    pub fn address(&self) -> SocketAddr {
        match &*self.state.lock().expect("Poisoned lock!") {
            State::Listening { address, .. } => *address,
            State::Closed {
                address: Some(address),
            } => *address,
            _ => panic!("the stub server has not been started"),
        }
    }

    /// Return the base uri of this running instance of `StubServer`, e.g.
    /// `http://127.0.0.1:4372`.
    pub fn uri(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Resolve `path_or_url` against the server's base uri.
    ///
    /// Relative paths are rewritten to absolute URLs pointing at this server; absolute
    /// URLs pass through untouched, so request-building code under test can be pointed
    /// at the stub server without special-casing external endpoints.
    pub fn url<T: AsRef<str>>(&self, path_or_url: T) -> String {
        let path_or_url = path_or_url.as_ref();
        // Only rewrite relative URLs.
        if Url::parse(path_or_url).is_ok() {
            return path_or_url.to_string();
        }
        let base = Url::parse(&self.uri()).expect("Failed to parse the server base URL.");
        base.join(path_or_url)
            .expect("Failed to resolve the URL against the server base.")
            .to_string()
    }
}

impl Default for StubServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StubServer {
    // Clean up when the `StubServer` instance goes out of scope.
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
