use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::matchers::UrlMatcher;
use crate::request::Request;
use crate::response::{ResponseRule, StubResponse};

/// Anything that implements `Match` can be used to constrain when a [`Stub`] replies to
/// an incoming request.
///
/// `Match` is the only trait in the whole `httpstub` crate and can be used to extend the
/// set of matchers provided out-of-the-box to cater to your specific testing needs:
/// ```rust
/// use httpstub::matchers::path;
/// use httpstub::response::with_status;
/// use httpstub::{Match, MatchContext, Request, StubServer};
///
/// // Check that a header with the specified name exists and its value has an odd length.
/// pub struct OddHeaderMatcher(http::HeaderName);
///
/// impl Match for OddHeaderMatcher {
///     fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
///         match request.headers.get(&self.0) {
///             Some(value) => value.as_bytes().len() % 2 == 1,
///             None => false,
///         }
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///
///     server
///         .stub("GET", path("/hello"))
///         .and(OddHeaderMatcher("custom".parse().unwrap()))
///         .respond([with_status(200)]);
///
///     let client = reqwest::Client::new();
///
///     // Even length
///     let status = client
///         .get(server.url("/hello"))
///         .header("custom", "even")
///         .send()
///         .await
///         .unwrap()
///         .status();
///     assert_eq!(status.as_u16(), 666);
///
///     // Odd length
///     let status = client
///         .get(server.url("/hello"))
///         .header("custom", "odd")
///         .send()
///         .await
///         .unwrap()
///         .status();
///     assert_eq!(status.as_u16(), 200);
/// }
/// ```
///
/// Anonymous functions that take a reference to a [`Request`] as input and return a
/// boolean as output automatically implement the `Match` trait:
/// ```rust,no_run
/// use httpstub::matchers::path;
/// use httpstub::{Request, StubServer};
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = StubServer::start_new();
/// server
///     .stub("GET", path("/hello"))
///     .and(|request: &Request| request.url.query().is_none());
/// # }
/// ```
pub trait Match: Send + Sync {
    /// Given a reference to a `Request` and the per-request [`MatchContext`], determine
    /// if the request should match or not given a specific criterion.
    fn matches(&self, request: &Request, ctx: &mut MatchContext) -> bool;
}

/// Implement the `Match` trait for all closures, out of the box, if their signature is
/// compatible.
impl<F> Match for F
where
    F: Fn(&Request) -> bool,
    F: Send + Sync,
{
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        // Just call the closure itself!
        self(request)
    }
}

/// Per-request scratch state populated while matching one incoming request against one
/// stub.
///
/// URL pattern matchers (see [`url_pattern`](crate::matchers::url_pattern) and
/// [`path_pattern`](crate::matchers::path_pattern)) write the parameters they capture in
/// here; the [`param`](crate::matchers::param) matcher reads them back. A fresh context
/// is created for every (stub, request) evaluation, so captured values never leak
/// between concurrent requests or between stubs.
#[derive(Debug, Default)]
pub struct MatchContext {
    params: HashMap<String, String>,
}

impl MatchContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The value captured for `name` by a URL pattern matcher that ran earlier in the
    /// matcher chain, if any.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn insert_param(&mut self, name: String, value: String) {
        self.params.insert(name, value);
    }
}

pub(crate) struct StubState {
    matchers: Vec<Box<dyn Match>>,
    response: StubResponse,
}

/// A registered rule pairing request-matching conditions with a canned response.
///
/// A `Stub` is created (and immediately registered) by [`StubServer::stub`], which pins
/// down the two mandatory conditions: the request method and a URL matcher. Additional
/// matchers are appended with [`and`]; the canned response is shaped with [`respond`].
///
/// **All** of a stub's matchers must hold for the stub to reply to a request; they are
/// evaluated in the order they were added, short-circuiting on the first failure.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::{header, path};
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
///         .stub("GET", path("/api/users"))
///         .and(header("authorization", "Bearer token"))
///         .respond([with_status(200), with_json(json!({ "users": [] }))]);
///
///     // Act
///     let client = reqwest::Client::new();
///     let response = client
///         .get(server.url("/api/users"))
///         .header("authorization", "Bearer token")
///         .send()
///         .await
///         .unwrap();
///
///     // Assert
///     assert_eq!(response.status().as_u16(), 200);
///     assert_eq!(response.text().await.unwrap(), r#"{"users":[]}"#);
/// }
/// ```
///
/// [`StubServer::stub`]: crate::StubServer::stub
/// [`and`]: Stub::and
/// [`respond`]: Stub::respond
#[derive(Clone)]
pub struct Stub {
    state: Arc<RwLock<StubState>>,
}

impl Stub {
    pub(crate) fn new<M: AsRef<str>>(method: M, url: UrlMatcher) -> Self {
        let matchers: Vec<Box<dyn Match>> = vec![
            Box::new(crate::matchers::method(method)),
            Box::new(url),
        ];
        Self {
            state: Arc::new(RwLock::new(StubState {
                matchers,
                response: StubResponse::new(),
            })),
        }
    }

    /// Add another request matcher to this stub.
    ///
    /// Matchers appended here are evaluated after the mandatory method and URL matchers,
    /// in the order they were added.
    pub fn and<M: Match + 'static>(self, matcher: M) -> Self {
        self.state
            .write()
            .expect("Poisoned lock!")
            .matchers
            .push(Box::new(matcher));
        self
    }

    /// Apply response rules, in order, to this stub's canned response.
    ///
    /// Later rules targeting the same field overwrite earlier ones (status code, body),
    /// while header rules merge per key. `respond` can be called more than once on the
    /// same stub: subsequent calls further mutate the response, they do not replace it.
    ///
    /// A stub that never received any response rule replies with `200 OK` and an empty
    /// body.
    pub fn respond<I>(&self, rules: I)
    where
        I: IntoIterator<Item = ResponseRule>,
    {
        let mut state = self.state.write().expect("Poisoned lock!");
        for rule in rules {
            rule.apply(&mut state.response);
        }
    }

    pub(crate) fn matches(&self, request: &Request, ctx: &mut MatchContext) -> bool {
        let state = self.state.read().expect("Poisoned lock!");
        state
            .matchers
            .iter()
            .all(|matcher| matcher.matches(request, ctx))
    }

    pub(crate) fn response(&self) -> StubResponse {
        self.state.read().expect("Poisoned lock!").response.clone()
    }
}
