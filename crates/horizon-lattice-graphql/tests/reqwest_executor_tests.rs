//! Integration tests for the blocking reqwest executor.

#![cfg(feature = "reqwest")]

use std::time::Duration;

use horizon_lattice_graphql::{
    Error, GraphQLClient, GraphQLRequest, ReqwestExecutor, TransportError,
};

#[test]
fn test_executor_creation() {
    let executor = ReqwestExecutor::new().expect("Failed to build executor");
    assert_eq!(executor.config().timeout, Some(Duration::from_secs(30)));
    assert!(executor.config().user_agent.is_some());
}

#[test]
fn test_connection_refused() {
    let executor = ReqwestExecutor::builder()
        .connect_timeout(Duration::from_secs(2))
        .build()
        .expect("Failed to build executor");
    let client = GraphQLClient::builder("http://127.0.0.1:1/graphql")
        .build()
        .unwrap();

    let err = client
        .execute(&GraphQLRequest::query("{ ping }"), &executor)
        .unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err}");
}

mod mock_server_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GraphQLClient {
        GraphQLClient::builder(format!("{}/graphql", server.uri()))
            .bearer_auth("secret")
            .build()
            .expect("Failed to build client")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("Content-Type", "application/json"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(json!({
                "query": "query Viewer { viewer { login } }",
                "operationName": "Viewer",
                "variables": {}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Request-Id", "req-1")
                    .set_body_json(json!({"data": {"viewer": {"login": "octocat"}}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = tokio::task::spawn_blocking(move || {
            let executor = ReqwestExecutor::new()?;
            let request =
                GraphQLRequest::query("query Viewer { viewer { login } }").operation_name("Viewer");
            client.execute(&request, &executor)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.extract::<String>("viewer.login").unwrap(), "octocat");
        // Captured header names are normalized to lowercase by the HTTP stack.
        assert_eq!(response.header("x-request-id"), Some("req-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_repeated_response_headers_are_kept() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("Set-Cookie", "session=abc")
                    .append_header("Set-Cookie", "theme=dark")
                    .set_body_json(json!({"data": {"ok": true}})),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = tokio::task::spawn_blocking(move || {
            let executor = ReqwestExecutor::new()?;
            client.execute(&GraphQLRequest::query("{ ok }"), &executor)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(
            response.headers()["set-cookie"],
            vec!["session=abc", "theme=dark"]
        );
        assert_eq!(response.header("set-cookie"), Some("session=abc"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status_with_graphql_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"errors": [{"message": "Bad credentials"}]})),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = tokio::task::spawn_blocking(move || {
            let executor = ReqwestExecutor::new()?;
            client.execute(&GraphQLRequest::query("{ viewer { login } }"), &executor)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response.status(), 401);
        assert_eq!(response.error_message().as_deref(), Some("Bad credentials"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status_without_graphql_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = tokio::task::spawn_blocking(move || {
            let executor = ReqwestExecutor::new()?;
            client.execute(&GraphQLRequest::query("{ ping }"), &executor)
        })
        .await
        .unwrap()
        .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { status: 503, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {}}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = tokio::task::spawn_blocking(move || {
            let executor = ReqwestExecutor::builder()
                .timeout(Duration::from_millis(100))
                .build()?;
            client.execute(&GraphQLRequest::query("{ ping }"), &executor)
        })
        .await
        .unwrap()
        .unwrap_err();

        assert!(
            matches!(err, Error::Transport(TransportError::Timeout)),
            "unexpected error: {err}"
        );
    }
}
