//! Response rules: the building blocks of a stub's canned response.
//!
//! Each rule is a tagged value produced by one of the `with_*` constructors in this
//! module and handed to [`Stub::respond`](crate::Stub::respond), which applies the rules
//! in call order. All fallible conversions and encodings happen eagerly, inside the
//! constructors, so a broken rule fails at stub-setup time rather than mid-request.
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::io::Read;
use std::time::Duration;

// `httpstub` is a crate meant for testing - failures are most likely not
// handled/temporary mistakes. Hence we prefer to panic and provide an easier API than to
// use `Result`s thus pushing the burden of "correctness" (and conversions) on the user.
//
// All rule constructors try to accept the widest possible set of inputs and then perform
// the fallible conversion internally, bailing if the fallible conversion fails.

/// The canned response served when a stub matches an incoming request.
#[derive(Clone, Debug)]
pub(crate) struct StubResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl StubResponse {
    pub(crate) fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            delay: None,
        }
    }

    pub(crate) fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub(crate) fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::builder().status(self.status);
        *response
            .headers_mut()
            .expect("Failed to access response headers.") = self.headers;
        response
            .body(Full::new(Bytes::from(self.body)))
            .expect("Failed to build response.")
    }
}

/// A response body source accepted by [`with_body`].
///
/// Byte sequences and text pass through verbatim. For stream-like sources use
/// [`with_body_reader`]; for any other value, [`with_body_display`] falls back to its
/// human-readable text form.
#[derive(Debug)]
pub enum Body {
    /// Raw bytes, used as-is.
    Bytes(Vec<u8>),
    /// Text, encoded as UTF-8.
    Text(String),
}

impl Body {
    fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Bytes(bytes) => bytes,
            Body::Text(text) => text.into_bytes(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Body::Bytes(bytes.to_vec())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// A single response-building rule, applied to a stub via
/// [`Stub::respond`](crate::Stub::respond).
///
/// Rules apply in the order given. Later rules targeting the same field overwrite
/// earlier ones; header rules merge, overwriting per key.
#[derive(Debug)]
pub struct ResponseRule(Rule);

#[derive(Debug)]
enum Rule {
    Status(StatusCode),
    Body(Vec<u8>),
    Json(Vec<u8>),
    Header(HeaderName, HeaderValue),
    Headers(Vec<(HeaderName, HeaderValue)>),
    Delay(Duration),
}

impl ResponseRule {
    pub(crate) fn apply(self, response: &mut StubResponse) {
        match self.0 {
            Rule::Status(status) => response.status = status,
            Rule::Body(body) => response.body = body,
            Rule::Json(body) => {
                response.body = body;
                response
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Rule::Header(name, value) => {
                response.headers.insert(name, value);
            }
            Rule::Headers(pairs) => {
                for (name, value) in pairs {
                    response.headers.insert(name, value);
                }
            }
            Rule::Delay(delay) => response.delay = Some(delay),
        }
    }
}

/// Set the response status code.
///
/// Stubs that never receive this rule respond with `200 OK`.
pub fn with_status<S>(status: S) -> ResponseRule
where
    S: TryInto<StatusCode>,
    <S as TryInto<StatusCode>>::Error: std::fmt::Debug,
{
    let status = status.try_into().expect("Failed to convert into status code.");
    ResponseRule(Rule::Status(status))
}

/// Set the response body from bytes or text, verbatim.
pub fn with_body<B: Into<Body>>(body: B) -> ResponseRule {
    ResponseRule(Rule::Body(body.into().into_bytes()))
}

/// Set the response body by draining a reader.
///
/// The reader is fully drained when the rule is built; a read failure panics
/// immediately, before any request is served.
pub fn with_body_reader<R: Read>(mut reader: R) -> ResponseRule {
    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .expect("Failed to read the response body source.");
    ResponseRule(Rule::Body(body))
}

/// Set the response body to the `Display` form of an arbitrary value.
pub fn with_body_display<T: Display>(value: T) -> ResponseRule {
    ResponseRule(Rule::Body(value.to_string().into_bytes()))
}

/// Set the response body to the given pre-serialized JSON, verbatim.
///
/// The response will include the `Content-Type: application/json` header.
/// Panics if the text is not syntactically valid JSON.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::path;
/// use httpstub::response::with_raw_json;
/// use httpstub::StubServer;
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///     server
///         .stub("GET", path("/whoami"))
///         .respond([with_raw_json(r#""john""#)]);
///
///     // Act
///     let response = reqwest::get(server.url("/whoami")).await.unwrap();
///
///     // Assert
///     assert_eq!(
///         response.headers().get("content-type").unwrap(),
///         "application/json"
///     );
///     assert_eq!(response.text().await.unwrap(), r#""john""#);
/// }
/// ```
pub fn with_raw_json<T: AsRef<str>>(raw: T) -> ResponseRule {
    let raw = raw.as_ref();
    serde_json::from_str::<Value>(raw)
        .unwrap_or_else(|e| panic!("json is not valid: `{}`: {}", raw, e));
    ResponseRule(Rule::Json(raw.as_bytes().to_vec()))
}

/// Set the response body to the JSON serialization of the given value.
///
/// The response will include the `Content-Type: application/json` header.
/// Panics if the value cannot be serialized.
pub fn with_json<B: Serialize>(body: B) -> ResponseRule {
    let body = serde_json::to_vec(&body).expect("Failed to serialize the JSON body.");
    ResponseRule(Rule::Json(body))
}

/// Set a response header.
///
/// If the key was already set, by this or an earlier rule, it is overwritten.
pub fn with_header<K, V>(key: K, value: V) -> ResponseRule
where
    K: TryInto<HeaderName>,
    <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
    V: TryInto<HeaderValue>,
    <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
{
    let key = key.try_into().expect("Failed to convert into header name.");
    let value = value
        .try_into()
        .expect("Failed to convert into header value.");
    ResponseRule(Rule::Header(key, value))
}

/// Merge a set of response headers into the response.
///
/// Headers given here are added to the ones already set; any key that already exists is
/// overwritten, keys absent from this call are left alone.
pub fn with_headers<K, V, I>(headers: I) -> ResponseRule
where
    K: TryInto<HeaderName>,
    <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
    V: TryInto<HeaderValue>,
    <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
    I: IntoIterator<Item = (K, V)>,
{
    let headers = headers
        .into_iter()
        .map(|(key, value)| {
            (
                key.try_into().expect("Failed to convert into header name."),
                value
                    .try_into()
                    .expect("Failed to convert into header value."),
            )
        })
        .collect();
    ResponseRule(Rule::Headers(headers))
}

/// Impose a minimum delay before the response is written.
///
/// By default the [`StubServer`] tries to fulfill incoming requests as fast as possible.
/// You can use `with_delay` to introduce an artificial delay to simulate the behaviour
/// of a real server with non-negligible latency - in particular, to test the behaviour
/// of your timeout policies. The delay is best-effort: the server sleeps for at least
/// the given duration before writing the response.
///
/// [`StubServer`]: crate::StubServer
pub fn with_delay(delay: Duration) -> ResponseRule {
    ResponseRule(Rule::Delay(delay))
}
