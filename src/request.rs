use http::{HeaderMap, Method};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use url::Url;

/// An incoming request to an instance of [`StubServer`].
///
/// Each matcher gets an immutable reference to a `Request` instance in the [`matches`]
/// method defined in the [`Match`] trait.
///
/// [`StubServer`]: crate::StubServer
/// [`matches`]: crate::Match::matches
/// [`Match`]: crate::Match
///
/// ### Implementation notes:
/// We can't hand `hyper`'s request type to matchers directly: extracting the body
/// consumes it, and several matchers may want to look at the body for the same request.
///
/// We introduce our own `Request` type to perform this extraction once when the request
/// arrives on the stub server, store the result and pass an immutable reference to it
/// to all our matchers.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    /// Deserialize the request body as JSON.
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The path-and-query portion of the request URL, e.g. `/api/users?page=1`.
    ///
    /// This is the form URL matchers compare against, and the form echoed in the
    /// fallback response written when no stub matches.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    pub(crate) async fn from_hyper(request: hyper::Request<hyper::body::Incoming>) -> Request {
        let (parts, body) = request.into_parts();
        let url = match parts.uri.authority() {
            Some(_) => parts.uri.to_string(),
            None => format!("http://localhost{}", parts.uri),
        }
        .parse()
        .expect("Failed to parse the request URL.");

        let body = body
            .collect()
            .await
            .expect("Failed to read request body.")
            .to_bytes();

        Self {
            url,
            method: parts.method,
            headers: parts.headers,
            body: body.to_vec(),
        }
    }
}
