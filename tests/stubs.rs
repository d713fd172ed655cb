use std::net::TcpStream;

use httpstub::matchers::{path, path_regex, url};
use httpstub::response::{with_body, with_status};
use httpstub::{ServerError, StubServer};

#[tokio::test]
async fn start_new_starts_the_server() {
    // Act
    let server = StubServer::start_new();

    // Assert
    assert!(TcpStream::connect(server.address()).is_ok())
}

#[tokio::test]
async fn start_is_idempotent_while_listening() {
    // Arrange
    let server = StubServer::new();

    // Act
    server.start().unwrap();
    let address = server.address();
    server.start().unwrap();

    // Assert - same listener, same address
    assert_eq!(address, server.address());
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    // Arrange - never started
    let server = StubServer::new();

    // Assert - shutting down an unstarted server never errors
    server.shutdown().unwrap();
    server.shutdown().unwrap();

    // Arrange - started
    let server = StubServer::start_new();

    // Assert - shutting down twice never errors
    server.shutdown().unwrap();
    server.shutdown().unwrap();
}

#[tokio::test]
async fn start_after_shutdown_fails() {
    // Arrange
    let server = StubServer::start_new();
    server.must_shutdown();

    // Act
    let result = server.start();

    // Assert - closed servers cannot be restarted
    assert!(matches!(result, Err(ServerError::AlreadyClosed)));
}

#[tokio::test]
async fn returns_the_fallback_response_if_nothing_matches() {
    // Arrange - no stubs registered
    let server = StubServer::start_new();

    // Act
    let response = reqwest::get(server.url("/api/users")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 666);
    assert_eq!(response.text().await.unwrap(), "no stubs for GET /api/users");
}

#[tokio::test]
async fn method_and_url_are_both_mandatory_to_match() {
    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/api/users"));

    let client = reqwest::Client::new();

    // Act + Assert - method and URL match
    let response = reqwest::get(server.url("/api/users")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Act + Assert - method differs
    let response = client
        .post(server.url("/api/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 666);
    assert_eq!(
        response.text().await.unwrap(),
        "no stubs for POST /api/users"
    );

    // Act + Assert - URL differs
    let response = reqwest::get(server.url("/api/users/john-doe")).await.unwrap();
    assert_eq!(response.status().as_u16(), 666);
}

#[tokio::test]
async fn method_matching_is_case_sensitive() {
    // Arrange - a lowercase method can never equal the canonical uppercase one
    let server = StubServer::start_new();
    server.stub("get", path("/hello"));

    // Act
    let response = reqwest::get(server.url("/hello")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 666);
}

#[tokio::test]
async fn stub_without_response_rules_returns_200_with_empty_body() {
    // Arrange
    let server = StubServer::start_new();
    server.stub("GET", url("/api/users"));

    // Act
    let response = reqwest::get(server.url("/api/users")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn first_registered_stub_wins() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", path("/abcd"))
        .respond([with_status(200)]);
    server
        .stub("GET", path_regex("[a-z]{4}"))
        .respond([with_status(201)]);

    // Act
    let response = reqwest::get(server.url("/abcd")).await.unwrap();

    // Assert - both stubs match, the first registered one replies
    assert_eq!(response.status().as_u16(), 200);

    // Arrange - register the same stubs in the opposite order
    let server = StubServer::start_new();
    server
        .stub("GET", path_regex("[a-z]{4}"))
        .respond([with_status(201)]);
    server
        .stub("GET", path("/abcd"))
        .respond([with_status(200)]);

    // Act
    let response = reqwest::get(server.url("/abcd")).await.unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn clear_drops_all_stubs_and_keeps_the_listener() {
    // Arrange
    let server = StubServer::start_new();
    server
        .stub("GET", path("/hello"))
        .respond([with_status(200), with_body("world")]);

    let response = reqwest::get(server.url("/hello")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Act
    server.clear();

    // Assert - every request now gets the fallback response
    let response = reqwest::get(server.url("/hello")).await.unwrap();
    assert_eq!(response.status().as_u16(), 666);

    // Assert - the server can be reused after a clear
    server
        .stub("GET", path("/hello"))
        .respond([with_status(204)]);
    let response = reqwest::get(server.url("/hello")).await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
}

#[tokio::test]
async fn url_resolves_relative_paths_against_the_server_base() {
    // Arrange
    let server = StubServer::start_new();

    // Assert
    assert_eq!(server.url("/api/users"), format!("{}/api/users", server.uri()));
    assert_eq!(
        server.url("http://example.com/api/users"),
        "http://example.com/api/users"
    );
}

#[test]
fn two_servers_listen_on_different_ports() {
    // Act
    let server_one = StubServer::start_new();
    let server_two = StubServer::start_new();

    // Assert
    assert_ne!(server_one.address(), server_two.address());
}
