use std::sync::{Arc, Mutex};

use httpstub::matchers::path;
use httpstub::response::with_status;
use httpstub::{Logger, StubServer};

#[derive(Clone, Default)]
struct CapturingLogger(Arc<Mutex<Vec<String>>>);

impl Logger for CapturingLogger {
    fn log(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

impl CapturingLogger {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn the_logger_observes_lifecycle_events_and_unmatched_requests() {
    // Arrange
    let logger = CapturingLogger::default();
    let server = StubServer::builder().logger(logger.clone()).build();
    server.must_start();
    let uri = server.uri();

    server.stub("GET", path("/hello")).respond([with_status(200)]);

    // Act
    let matched = reqwest::get(server.url("/hello")).await.unwrap();
    let unmatched = reqwest::get(server.url("/missing")).await.unwrap();
    server.clear();
    server.must_shutdown();

    // Assert
    assert_eq!(matched.status().as_u16(), 200);
    assert_eq!(unmatched.status().as_u16(), 666);

    let messages = logger.messages();
    assert_eq!(
        messages,
        vec![
            format!("server started at {}", uri),
            "no stub matched for GET /missing".to_string(),
            format!("server cleared at {}", uri),
            format!("server stopped at {}", uri),
        ]
    );
}

#[tokio::test]
async fn the_default_logger_discards_everything() {
    // Arrange - no logger collaborator, nothing to observe, nothing panics
    let server = StubServer::start_new();

    // Act
    let response = reqwest::get(server.url("/missing")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 666);
    server.must_shutdown();
}
