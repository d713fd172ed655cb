//! A collection of different matching strategies provided out-of-the-box by `httpstub`.
//!
//! If the set of matchers provided out-of-the-box is not enough for your specific
//! testing needs you can implement your own thanks to the [`Match`] trait.
//!
//! Furthermore, `Fn` closures that take an immutable [`Request`] reference as input and
//! return a boolean automatically implement [`Match`] and can be used where a matcher
//! is expected.
//!
//! Check [`Match`]'s documentation for more details and examples.
use crate::pattern::UrlPattern;
use crate::stub::MatchContext;
use crate::{Match, Request};
use http::{HeaderName, HeaderValue, Method};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::str::FromStr;
use url::Url;

#[derive(Clone, Copy, Debug)]
enum UrlSource {
    /// The path-and-query portion of the request URL.
    Url,
    /// The path only.
    Path,
}

impl UrlSource {
    fn of(self, request: &Request) -> String {
        match self {
            UrlSource::Url => request.path_and_query(),
            UrlSource::Path => request.url.path().to_string(),
        }
    }
}

#[derive(Debug)]
enum UrlMatcherKind {
    Exact(String),
    Path(String),
    Regex { regex: Regex, source: UrlSource },
    Pattern { pattern: UrlPattern, source: UrlSource },
}

/// Decides whether a stub applies to the URL of an incoming request.
///
/// Every stub carries exactly one `UrlMatcher`, chosen when the stub is registered with
/// [`StubServer::stub`](crate::StubServer::stub). Build one with [`url`], [`path`],
/// [`url_regex`], [`path_regex`], [`url_pattern`] or [`path_pattern`].
///
/// `UrlMatcher` also implements [`Match`], so it can be appended to an existing stub
/// with [`Stub::and`](crate::Stub::and) like any other matcher.
#[derive(Debug)]
pub struct UrlMatcher(UrlMatcherKind);

impl Match for UrlMatcher {
    fn matches(&self, request: &Request, ctx: &mut MatchContext) -> bool {
        match &self.0 {
            UrlMatcherKind::Exact(expected) => *expected == request.path_and_query(),
            UrlMatcherKind::Path(expected) => {
                let path = request.url.path();
                let path = path.strip_suffix('/').unwrap_or(path);
                path == expected
            }
            UrlMatcherKind::Regex { regex, source } => regex.is_match(&source.of(request)),
            UrlMatcherKind::Pattern { pattern, source } => {
                match pattern.captures(&source.of(request)) {
                    Some(params) => {
                        for (name, value) in params {
                            ctx.insert_param(name, value);
                        }
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

/// Match **exactly** the full URL of a request, query string included.
///
/// The query string must match in the exact order and encoding it was sent with; use
/// [`query_param`] to match individual parameters instead.
pub fn url<T: Into<String>>(url: T) -> UrlMatcher {
    UrlMatcher(UrlMatcherKind::Exact(url.into()))
}

/// Match **exactly** the path of a request, ignoring the query string.
///
/// At most one trailing `/` difference between the given path and the request path is
/// tolerated: `path("/api/users")` matches requests to both `/api/users` and
/// `/api/users/`.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::path;
/// use httpstub::response::{with_body, with_status};
/// use httpstub::StubServer;
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///
///     server
///         .stub("GET", path("/hello"))
///         .respond([with_status(200), with_body("world")]);
///
///     // Act - the path matcher ignores query parameters
///     let response = reqwest::get(server.url("/hello?a_parameter=some_value"))
///         .await
///         .unwrap();
///
///     // Assert
///     assert_eq!(response.status().as_u16(), 200);
///     assert_eq!(response.text().await.unwrap(), "world");
/// }
/// ```
pub fn path<T: Into<String>>(path: T) -> UrlMatcher {
    let path = path.into();

    if path.contains('?') {
        panic!(
            "httpstub can't match the path `{}` because it contains a `?`. You must use the `query_param` matcher to match on query parameters (the part of the path after the `?`).",
            path
        );
    }

    if let Ok(url) = Url::parse(&path) {
        if let Some(host) = url.host_str() {
            panic!(
                "httpstub can't match the path `{}` because it contains the host `{}`. You don't have to specify the host - httpstub knows it. Try replacing your path with `path(\"{}\")`",
                path,
                host,
                url.path()
            );
        }
    }

    // Prepend "/" to the path if missing.
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };
    let trimmed = path.strip_suffix('/').unwrap_or(path.as_str()).to_string();

    UrlMatcher(UrlMatcherKind::Path(trimmed))
}

/// Match the full URL of a request (path and query) against a regular expression.
///
/// The regular expression searches, it does not need to cover the whole URL; anchor it
/// with `^` and `$` for a full match.
pub fn url_regex<T: AsRef<str>>(pattern: T) -> UrlMatcher {
    let regex = Regex::new(pattern.as_ref()).expect("Failed to create regex for URL matcher");
    UrlMatcher(UrlMatcherKind::Regex {
        regex,
        source: UrlSource::Url,
    })
}

/// Match the path of a request against a regular expression.
///
/// ### Example:
/// ```rust,no_run
/// use httpstub::matchers::path_regex;
/// use httpstub::response::with_status;
/// use httpstub::StubServer;
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = StubServer::start_new();
/// server
///     .stub("GET", path_regex(r"^/users/[a-z0-9-]+/posts$"))
///     .respond([with_status(200)]);
/// # }
/// ```
pub fn path_regex<T: AsRef<str>>(pattern: T) -> UrlMatcher {
    let regex = Regex::new(pattern.as_ref()).expect("Failed to create regex for path matcher");
    UrlMatcher(UrlMatcherKind::Regex {
        regex,
        source: UrlSource::Path,
    })
}

/// Match the full URL of a request against a URL template with `{param}` placeholders.
///
/// The whole path-and-query must match the template. Each placeholder captures one or
/// more characters excluding `/`, `?` and `&`; captured values can be constrained with
/// the [`param`] matcher later in the same stub's matcher chain. Placeholders may appear
/// in the query string.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::{param, url_pattern};
/// use httpstub::response::{with_body, with_status};
/// use httpstub::StubServer;
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///
///     server
///         .stub("GET", url_pattern("/api/users/{user_id}"))
///         .and(param("user_id", "42"))
///         .respond([with_status(200), with_body("the answer")]);
///
///     // Act
///     let matched = reqwest::get(server.url("/api/users/42")).await.unwrap();
///     let unmatched = reqwest::get(server.url("/api/users/43")).await.unwrap();
///
///     // Assert
///     assert_eq!(matched.status().as_u16(), 200);
///     assert_eq!(unmatched.status().as_u16(), 666);
/// }
/// ```
pub fn url_pattern<T: AsRef<str>>(template: T) -> UrlMatcher {
    UrlMatcher(UrlMatcherKind::Pattern {
        pattern: UrlPattern::compile(template.as_ref()),
        source: UrlSource::Url,
    })
}

/// Match the path of a request against a URL template with `{param}` placeholders.
///
/// Only the path is evaluated, so the template must not contain query string
/// parameters; a template that does panics at construction time.
///
/// Unlike [`path`], no trailing-slash tolerance is applied: the compiled template is
/// authoritative.
pub fn path_pattern<T: AsRef<str>>(template: T) -> UrlMatcher {
    let template = template.as_ref();

    if template.contains('?') {
        panic!(
            "httpstub can't use the path pattern `{}` because it contains query string parameters. Use `url_pattern` to match on the query string.",
            template
        );
    }

    UrlMatcher(UrlMatcherKind::Pattern {
        pattern: UrlPattern::compile(template),
        source: UrlSource::Path,
    })
}

#[derive(Debug)]
/// Match **exactly** the method of a request.
///
/// The comparison is case-sensitive; standard HTTP methods are uppercase.
pub struct MethodExactMatcher(Method);

/// Shorthand for [`MethodExactMatcher::new`].
pub fn method<T>(method: T) -> MethodExactMatcher
where
    T: AsRef<str>,
{
    MethodExactMatcher::new(method)
}

impl MethodExactMatcher {
    pub fn new<T>(method: T) -> Self
    where
        T: AsRef<str>,
    {
        let method = Method::from_str(method.as_ref()).expect("Failed to convert to HTTP method.");
        Self(method)
    }
}

impl Match for MethodExactMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        request.method == self.0
    }
}

#[derive(Debug)]
/// Match **exactly** the value of a header of a request.
///
/// ### Example:
/// ```rust,no_run
/// use httpstub::matchers::{header, path};
/// use httpstub::response::with_status;
/// use httpstub::StubServer;
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = StubServer::start_new();
/// server
///     .stub("GET", path("/protected"))
///     .and(header("x-api-key", "test value"))
///     .respond([with_status(200)]);
/// # }
/// ```
pub struct HeaderExactMatcher(HeaderName, HeaderValue);

/// Shorthand for [`HeaderExactMatcher::new`].
pub fn header<K, V>(key: K, value: V) -> HeaderExactMatcher
where
    K: TryInto<HeaderName>,
    <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
    V: TryInto<HeaderValue>,
    <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
{
    HeaderExactMatcher::new(key, value)
}

impl HeaderExactMatcher {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: std::fmt::Debug,
    {
        let key = key.try_into().expect("Failed to convert to header name.");
        let value = value.try_into().expect("Failed to convert to header value.");
        Self(key, value)
    }
}

impl Match for HeaderExactMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        request.headers.get(&self.0) == Some(&self.1)
    }
}

#[derive(Debug)]
/// Match **exactly** the first value of a query parameter of a request.
pub struct QueryParamExactMatcher(String, String);

/// Shorthand for [`QueryParamExactMatcher::new`].
pub fn query_param<K, V>(key: K, value: V) -> QueryParamExactMatcher
where
    K: Into<String>,
    V: Into<String>,
{
    QueryParamExactMatcher::new(key, value)
}

impl QueryParamExactMatcher {
    /// Specify the expected value for a query parameter.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self(key.into(), value.into())
    }
}

impl Match for QueryParamExactMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        request
            .url
            .query_pairs()
            .find(|(key, _)| key == self.0.as_str())
            .map_or(false, |(_, value)| value == self.1.as_str())
    }
}

#[derive(Debug)]
/// Match against a URL pattern parameter captured earlier in the same matcher chain.
///
/// Requires the stub's URL to be declared with [`url_pattern`] or [`path_pattern`]: the
/// pattern matcher must run, and match, before this one for the same request, otherwise
/// there is nothing to compare against and the matcher never holds.
pub struct PatternParamMatcher(String, String);

/// Shorthand for [`PatternParamMatcher::new`].
pub fn param<K, V>(name: K, value: V) -> PatternParamMatcher
where
    K: Into<String>,
    V: Into<String>,
{
    PatternParamMatcher::new(name, value)
}

impl PatternParamMatcher {
    /// Specify the expected value for a captured pattern parameter.
    pub fn new<K: Into<String>, V: Into<String>>(name: K, value: V) -> Self {
        Self(name.into(), value.into())
    }
}

impl Match for PatternParamMatcher {
    fn matches(&self, _request: &Request, ctx: &mut MatchContext) -> bool {
        ctx.param(&self.0) == Some(self.1.as_str())
    }
}

#[derive(Debug)]
/// Match requests with an empty body.
pub struct EmptyBodyMatcher;

/// Shorthand for [`EmptyBodyMatcher`].
pub fn no_body() -> EmptyBodyMatcher {
    EmptyBodyMatcher
}

impl Match for EmptyBodyMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        request.body.is_empty()
    }
}

#[derive(Debug)]
/// Match the body of a request as JSON, structurally.
///
/// The request body is parsed as JSON and deep-compared to the expected value:
/// whitespace and object key order do not matter. A request body that is not valid JSON
/// is a broken test, not a non-match - it makes the matcher panic.
///
/// ### Example:
/// ```rust
/// use httpstub::matchers::{body_json, path};
/// use httpstub::response::with_status;
/// use httpstub::StubServer;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     // Arrange
///     let server = StubServer::start_new();
///
///     server
///         .stub("POST", path("/api/users"))
///         .and(body_json(json!({ "name": "john" })))
///         .respond([with_status(201)]);
///
///     // Act - key order and whitespace in the request body are irrelevant
///     let client = reqwest::Client::new();
///     let response = client
///         .post(server.url("/api/users"))
///         .body(r#"{ "name": "john" }"#)
///         .send()
///         .await
///         .unwrap();
///
///     // Assert
///     assert_eq!(response.status().as_u16(), 201);
/// }
/// ```
pub struct BodyJsonMatcher(Value);

impl BodyJsonMatcher {
    /// Specify something JSON-serializable as the expected body.
    pub fn json<T: Serialize>(body: T) -> Self {
        let value = serde_json::to_value(body).expect("Failed to serialize JSON body");
        Self(value)
    }

    /// Specify a raw JSON string as the expected body.
    pub fn json_string(body: impl AsRef<str>) -> Self {
        let value = serde_json::from_str(body.as_ref()).expect("Failed to parse JSON string");
        Self(value)
    }
}

/// Shorthand for [`BodyJsonMatcher::json`].
pub fn body_json<T: Serialize>(body: T) -> BodyJsonMatcher {
    BodyJsonMatcher::json(body)
}

/// Shorthand for [`BodyJsonMatcher::json_string`].
pub fn body_json_string(body: impl AsRef<str>) -> BodyJsonMatcher {
    BodyJsonMatcher::json_string(body)
}

impl Match for BodyJsonMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        if request.body.is_empty() {
            // An absent body can only stand for the JSON value `null`.
            return self.0.is_null();
        }
        let body: Value = serde_json::from_slice(&request.body)
            .unwrap_or_else(|e| panic!("Failed to parse the request body as JSON: {}", e));
        body == self.0
    }
}

/// Match the body of a request as a JSON object handed to a caller-supplied predicate.
///
/// The predicate receives the body parameters as a map; if the body is empty the map is
/// empty, never null. A non-empty body that is not a JSON object makes the matcher
/// panic.
pub struct BodyMapMatcher(Box<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>);

impl BodyMapMatcher {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    {
        Self(Box::new(predicate))
    }
}

/// Shorthand for [`BodyMapMatcher::new`].
pub fn body_map_fn<F>(predicate: F) -> BodyMapMatcher
where
    F: Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
{
    BodyMapMatcher::new(predicate)
}

impl Match for BodyMapMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        if request.body.is_empty() {
            return (self.0)(&Map::new());
        }
        let value: Value = serde_json::from_slice(&request.body)
            .unwrap_or_else(|e| panic!("Failed to parse the request body as JSON: {}", e));
        match value {
            Value::Object(map) => (self.0)(&map),
            other => panic!("Expected the request body to be a JSON object, got: {}", other),
        }
    }
}

/// Match the body of a request as plain text handed to a caller-supplied predicate.
///
/// The predicate receives the body as text, an empty string if there is no body.
pub struct BodyStringMatcher(Box<dyn Fn(&str) -> bool + Send + Sync>);

impl BodyStringMatcher {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self(Box::new(predicate))
    }
}

/// Shorthand for [`BodyStringMatcher::new`].
pub fn body_string_fn<F>(predicate: F) -> BodyStringMatcher
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    BodyStringMatcher::new(predicate)
}

impl Match for BodyStringMatcher {
    fn matches(&self, request: &Request, _ctx: &mut MatchContext) -> bool {
        (self.0)(&String::from_utf8_lossy(&request.body))
    }
}
