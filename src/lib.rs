//! `httpstub` provides in-process HTTP stubbing to perform black-box testing of Rust
//! applications that interact with HTTP APIs.
//!
//! You declare canned responses ("stubs") for the outbound HTTP calls your code is
//! expected to make, point the client under test at the stub server, and let the
//! fallback response expose every request you did not anticipate.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Matchers](#matchers)
//! 3. [Response rules](#response-rules)
//! 4. [The fallback response](#the-fallback-response)
//! 5. [Test isolation](#test-isolation)
//! 6. [Runtime compatibility](#runtime-compatibility)
//!
//! ## Getting started
//! ```rust
//! use httpstub::matchers::path;
//! use httpstub::response::{with_body, with_status};
//! use httpstub::StubServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Start a background HTTP server on a random local port
//!     let server = StubServer::start_new();
//!
//!     // Arrange the behaviour of the StubServer adding a stub:
//!     // when it receives a GET request on '/hello' it will respond with a 200.
//!     server
//!         .stub("GET", path("/hello"))
//!         .respond([with_status(200), with_body("world")]);
//!
//!     // If we probe the StubServer using any HTTP client it behaves as expected.
//!     let response = reqwest::get(server.url("/hello")).await.unwrap();
//!     assert_eq!(response.status().as_u16(), 200);
//!     assert_eq!(response.text().await.unwrap(), "world");
//!
//!     // If the request doesn't match any stub registered on the server the
//!     // fallback response is returned: status 666.
//!     let response = reqwest::get(server.url("/missing")).await.unwrap();
//!     assert_eq!(response.status().as_u16(), 666);
//! }
//! ```
//!
//! ## Matchers
//!
//! Every stub starts from two mandatory conditions, the request method and a URL
//! matcher, passed to [`StubServer::stub`]. Further conditions are appended with
//! [`Stub::and`] - check the [`matchers`] module for the complete catalog, from header
//! and query-parameter equality to JSON body comparison and `{param}` URL templates.
//!
//! All of a stub's matchers must hold for it to reply; they run in the order they were
//! added and short-circuit on the first failure.
//!
//! You can define your own matchers using the [`Match`] trait, as well as using `Fn`
//! closures. Check [`Match`]'s documentation for more details and examples.
//!
//! ## Response rules
//!
//! A stub's canned response is shaped by the rules in the [`response`] module, applied
//! in call order by [`Stub::respond`]: status code, body (verbatim, JSON, or drained
//! from a reader), headers and an optional artificial delay. Rules are validated and
//! encoded eagerly, when the stub is configured - a broken rule panics at setup time,
//! before any request is served.
//!
//! ## The fallback response
//!
//! A request that matches no stub is answered with HTTP status `666` and the plain-text
//! body `no stubs for <METHOD> <URL>`. The status is deliberately non-standard: an
//! unmatched request can never be mistaken for a response produced by one of your stubs.
//! Wire a [`Logger`] through [`StubServer::builder`] to also get a diagnostic message
//! for every unmatched request.
//!
//! ## Test isolation
//!
//! Each instance of [`StubServer`] is fully isolated: [`start`] binds a random port
//! available on your local machine which is assigned to the new [`StubServer`].
//!
//! You should use one instance of [`StubServer`] for each test, to ensure full isolation
//! and no cross-test interference; alternatively, [`clear`] drops every registered stub
//! while keeping the listener up, so a server can be reused across test cases.
//!
//! When a [`StubServer`] instance goes out of scope (e.g. the test finishes), the
//! corresponding HTTP server running in the background is shut down to free up the port
//! it was using.
//!
//! ## Runtime compatibility
//!
//! The server runs on its own background thread with a dedicated `tokio` runtime, so the
//! `httpstub` API is synchronous and can be driven from any test - plain `#[test]`
//! functions included - regardless of the async runtime (if any) your test uses.
//!
//! [`StubServer`]: struct.StubServer.html
//! [`StubServer::stub`]: struct.StubServer.html#method.stub
//! [`StubServer::builder`]: struct.StubServer.html#method.builder
//! [`Stub::and`]: struct.Stub.html#method.and
//! [`Stub::respond`]: struct.Stub.html#method.respond
//! [`Match`]: trait.Match.html
//! [`Logger`]: trait.Logger.html
//! [`start`]: struct.StubServer.html#method.start
//! [`clear`]: struct.StubServer.html#method.clear
//! [`matchers`]: matchers/index.html
//! [`response`]: response/index.html
mod logging;
pub mod matchers;
mod pattern;
mod registry;
mod request;
pub mod response;
mod server;
mod stub;

pub use logging::{FacadeLogger, Logger};
pub use request::Request;
pub use server::{ServerError, StubServer, StubServerBuilder};
pub use stub::{Match, MatchContext, Stub};
