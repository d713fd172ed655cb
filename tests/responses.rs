use std::io::Cursor;
use std::time::{Duration, Instant};

use httpstub::matchers::url;
use httpstub::response::{
    with_body, with_body_display, with_body_reader, with_delay, with_header, with_headers,
    with_json, with_raw_json, with_status,
};
use httpstub::StubServer;
use serde::Serialize;
use serde_json::json;

#[tokio::test]
async fn with_status_sets_the_status_code() {
    // Arrange
    let server = StubServer::start_new();
    for status in [200u16, 201, 204, 400, 404, 500, 503] {
        server
            .stub("GET", url(format!("/test/{}", status)))
            .respond([with_status(status)]);
    }

    for status in [200u16, 201, 204, 400, 404, 500, 503] {
        // Act
        let response = reqwest::get(server.url(format!("/test/{}", status)))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status().as_u16(), status);
    }
}

#[tokio::test]
async fn status_defaults_to_200() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test"))
        .respond([with_body("no explicit status")]);

    // Act
    let response = reqwest::get(server.url("/test")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn with_body_accepts_text_and_bytes() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test/string-body"))
        .respond([with_body("test string body")]);
    server
        .stub("GET", url("/test/bytes-body"))
        .respond([with_body(b"test bytes body".to_vec())]);

    // Act + Assert
    let response = reqwest::get(server.url("/test/string-body")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "test string body");

    let response = reqwest::get(server.url("/test/bytes-body")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "test bytes body");
}

#[tokio::test]
async fn with_body_reader_drains_the_source() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test/reader-body"))
        .respond([with_body_reader(Cursor::new("string reader body"))]);

    // Act
    let response = reqwest::get(server.url("/test/reader-body")).await.unwrap();

    // Assert
    assert_eq!(response.text().await.unwrap(), "string reader body");
}

#[tokio::test]
async fn with_body_display_renders_the_value_as_text() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test/int-body"))
        .respond([with_body_display(123)]);

    // Act
    let response = reqwest::get(server.url("/test/int-body")).await.unwrap();

    // Assert
    assert_eq!(response.text().await.unwrap(), "123");
}

#[tokio::test]
async fn later_body_rules_overwrite_earlier_ones() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test"))
        .respond([with_body("first"), with_body("second")]);

    // Act
    let response = reqwest::get(server.url("/test")).await.unwrap();

    // Assert
    assert_eq!(response.text().await.unwrap(), "second");
}

#[tokio::test]
async fn respond_can_be_called_repeatedly() {
    // Arrange
    let server = StubServer::start_new();
    let stub = server.stub("GET", url("/test"));
    stub.respond([with_status(201)]);
    stub.respond([with_body("still 201")]);

    // Act
    let response = reqwest::get(server.url("/test")).await.unwrap();

    // Assert - the second call mutated the response, it did not replace it
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(response.text().await.unwrap(), "still 201");
}

#[tokio::test]
async fn with_raw_json_sets_the_body_verbatim_and_the_content_type() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", url("/test/object"))
        .respond([with_raw_json(r#"{"name":"john","age":57}"#)]);
    server
        .stub("GET", url("/test/bare-string"))
        .respond([with_raw_json(r#""john""#)]);

    // Act + Assert
    let response = reqwest::get(server.url("/test/object")).await.unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"name":"john","age":57}"#);

    let response = reqwest::get(server.url("/test/bare-string")).await.unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#""john""#);
}

#[should_panic(expected = "json is not valid")]
#[test]
fn with_raw_json_rejects_an_invalid_object() {
    with_raw_json(r#"{"name":"john",}"#);
}

#[should_panic(expected = "json is not valid")]
#[test]
fn with_raw_json_rejects_a_bare_word() {
    with_raw_json("john");
}

#[tokio::test]
async fn with_json_serializes_the_value_and_sets_the_content_type() {
    #[derive(Serialize)]
    struct User {
        name: String,
        age: u8,
    }

    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/test/int")).respond([with_json(123)]);
    server
        .stub("GET", url("/test/float"))
        .respond([with_json(20.87)]);
    server
        .stub("GET", url("/test/string"))
        .respond([with_json("john")]);
    server
        .stub("GET", url("/test/struct"))
        .respond([with_json(User {
            name: "john".into(),
            age: 57,
        })]);
    server
        .stub("GET", url("/test/value"))
        .respond([with_json(json!({ "age": 57, "name": "john" }))]);

    // Act + Assert
    let response = reqwest::get(server.url("/test/int")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "123");

    let response = reqwest::get(server.url("/test/float")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), "20.87");

    let response = reqwest::get(server.url("/test/string")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), r#""john""#);

    let response = reqwest::get(server.url("/test/struct")).await.unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"name":"john","age":57}"#);

    let response = reqwest::get(server.url("/test/value")).await.unwrap();
    assert_eq!(response.text().await.unwrap(), r#"{"age":57,"name":"john"}"#);
}

#[tokio::test]
async fn with_header_overwrites_repeated_keys() {
    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/test/with-header")).respond([
        with_status(200),
        with_header("x-test-header1", "test value 1"),
        with_header("x-test-header2", "test value 2a"),
        with_header("x-test-header2", "test value 2b"),
    ]);

    // Act
    let response = reqwest::get(server.url("/test/with-header")).await.unwrap();

    // Assert - one value per key, the last write wins
    assert_eq!(
        response.headers().get("x-test-header1").unwrap(),
        "test value 1"
    );
    assert_eq!(
        response.headers().get("x-test-header2").unwrap(),
        "test value 2b"
    );
    assert_eq!(
        response.headers().get_all("x-test-header2").iter().count(),
        1
    );
}

#[tokio::test]
async fn with_header_is_idempotent_per_key() {
    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/test/idempotent")).respond([
        with_header("x-test-header", "v"),
        with_header("x-test-header", "v"),
    ]);

    // Act
    let response = reqwest::get(server.url("/test/idempotent")).await.unwrap();

    // Assert
    assert_eq!(
        response.headers().get_all("x-test-header").iter().count(),
        1
    );
    assert_eq!(response.headers().get("x-test-header").unwrap(), "v");
}

#[tokio::test]
async fn with_headers_merges_without_clobbering_other_keys() {
    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/test/with-headers")).respond([
        with_status(200),
        with_header("x-test-header1", "test value 1"),
        with_headers([
            ("x-test-header2", "test value 2a"),
            ("x-test-header3", "test value 3"),
        ]),
        with_headers([
            ("x-test-header2", "test value 2b"),
            ("x-test-header4", "test value 4"),
        ]),
    ]);

    // Act
    let response = reqwest::get(server.url("/test/with-headers")).await.unwrap();

    // Assert
    assert_eq!(
        response.headers().get("x-test-header1").unwrap(),
        "test value 1"
    );
    assert_eq!(
        response.headers().get("x-test-header2").unwrap(),
        "test value 2b"
    );
    assert_eq!(
        response.headers().get("x-test-header3").unwrap(),
        "test value 3"
    );
    assert_eq!(
        response.headers().get("x-test-header4").unwrap(),
        "test value 4"
    );
}

#[tokio::test]
async fn with_delay_blocks_for_at_least_the_given_duration() {
    // Arrange
    let server = StubServer::start_new();
    let delay = Duration::from_millis(300);
    server
        .stub("GET", url("/test/with-delay"))
        .respond([with_status(200), with_delay(delay)]);

    // Act
    let start = Instant::now();
    let response = reqwest::get(server.url("/test/with-delay")).await.unwrap();
    let elapsed = start.elapsed();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(elapsed >= delay, "response came back after {:?}", elapsed);
}
