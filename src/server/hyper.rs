use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use http::{Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::debug;
use tokio::sync::oneshot;

use crate::logging::Logger;
use crate::registry::StubRegistry;
use crate::request::Request;

/// Status code of the fallback response written when no stub matches a request.
///
/// Deliberately non-standard, so an unmatched request can never be mistaken for a real
/// service response.
const NO_STUB_STATUS: u16 = 666;

/// The actual HTTP server answering incoming requests according to the registered stubs.
pub(super) async fn run_server(
    listener: std::net::TcpListener,
    registry: Arc<RwLock<StubRegistry>>,
    logger: Arc<dyn Logger>,
    mut shutdown_signal: oneshot::Receiver<()>,
) {
    let listener =
        tokio::net::TcpListener::from_std(listener).expect("Failed to adopt the server listener.");

    loop {
        tokio::select! {
            // Resolves when the sender half of the channel is either used or dropped:
            // both mean the server is shutting down.
            _ = &mut shutdown_signal => break,
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(accepted) => accepted,
                    Err(error) => {
                        debug!("Failed to accept a connection: {}", error);
                        continue;
                    }
                };
                let registry = registry.clone();
                let logger = logger.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request: hyper::Request<Incoming>| {
                        let registry = registry.clone();
                        let logger = logger.clone();
                        async move {
                            Ok::<_, Infallible>(handle_request(registry, logger, request).await)
                        }
                    });
                    if let Err(error) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("Failed to serve a connection: {}", error);
                    }
                });
            }
        }
    }
}

async fn handle_request(
    registry: Arc<RwLock<StubRegistry>>,
    logger: Arc<dyn Logger>,
    request: hyper::Request<Incoming>,
) -> Response<Full<Bytes>> {
    let request = Request::from_hyper(request).await;

    // The read guard is released before waiting out a configured delay: holding it
    // while sleeping would block stub registration and clearing for the whole delay.
    let matched = registry
        .read()
        .expect("Poisoned lock!")
        .find_response(&request);

    match matched {
        Some(response) => {
            if let Some(delay) = response.delay() {
                tokio::time::sleep(delay).await;
            }
            response.into_response()
        }
        None => {
            logger.logf(format_args!(
                "no stub matched for {} {}",
                request.method,
                request.path_and_query()
            ));
            no_stub_response(&request)
        }
    }
}

fn no_stub_response(request: &Request) -> Response<Full<Bytes>> {
    let body = format!(
        "no stubs for {} {}",
        request.method,
        request.path_and_query()
    );
    Response::builder()
        .status(StatusCode::from_u16(NO_STUB_STATUS).expect("Failed to convert into status code."))
        .body(Full::new(Bytes::from(body)))
        .expect("Failed to build the fallback response.")
}
