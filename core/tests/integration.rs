//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives an
//! `ApiClient<ReqwestTransport>` at it over real HTTP. The client is given
//! the server address as its base URL, so tests use logical paths only.

use fetch_core::{
    ApiClient, ApiError, CacheMode, ChainStep, ClientConfig, HttpMethod, ReqwestTransport,
    RequestDescriptor, RequestOptions,
};
use serde_json::{json, Value};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    format!("http://{addr}")
}

async fn client() -> ApiClient<ReqwestTransport> {
    let base = start_server().await;
    ApiClient::with_config(ReqwestTransport::new(), ClientConfig::new().with_base_url(&base))
}

#[tokio::test]
async fn fetch_success_envelope() {
    let client = client().await;

    let result = client
        .fetch(
            "/echo",
            RequestOptions::new()
                .method(HttpMethod::Post)
                .body(json!({"hello": "world"})),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(result.status(), 200);
    assert!(!result.cache());
    assert_eq!(result.data(), Some(&json!({"hello": "world"})));
}

#[tokio::test]
async fn post_body_round_trips() {
    let client = client().await;
    let original = json!({
        "name": "test",
        "nested": {"list": [1, 2.5, "three", null], "flag": false},
        "unicode": "héllo ✓"
    });

    let echoed = client.post("/echo", original.clone()).await.unwrap();

    assert_eq!(echoed, original);
}

#[tokio::test]
async fn http_failure_envelope() {
    let client = client().await;

    let result = client
        .fetch("/status/404", RequestOptions::new().cache(CacheMode::ForceCache))
        .await;

    assert!(!result.is_ok());
    assert_eq!(result.status(), 404);
    assert!(result.cache());
    let error = result.error().unwrap();
    assert_eq!(error.code, "404");
    assert_eq!(error.message.as_deref(), Some("Not Found"));
    assert_eq!(error.status, 404);
}

#[tokio::test]
async fn non_json_body_is_server_error() {
    let client = client().await;

    let result = client.fetch("/text", RequestOptions::new()).await;

    assert!(!result.is_ok());
    assert_eq!(result.status(), 500);
    assert_eq!(result.error().unwrap().code, "SERVER_ERROR");
}

#[tokio::test]
async fn unreachable_server_is_fetch_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ApiClient::with_config(
        ReqwestTransport::new(),
        ClientConfig::new().with_base_url(&format!("http://{addr}")),
    );

    let result = client.fetch("/echo", RequestOptions::new()).await;
    assert!(!result.is_ok());
    assert_eq!(result.status(), 500);
    assert_eq!(result.error().unwrap().code, "FETCH_ERROR");

    let err = client.get("/echo").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));

    let envelope = client.lenient().get("/echo").await.unwrap_err();
    assert_eq!(envelope.error().unwrap().code, "FETCH_ERROR");
}

#[tokio::test]
async fn fields_are_projected_by_the_server() {
    let client = client().await;
    let created = client
        .post("/users", json!({"name": "Ada", "email": "ada@example.com"}))
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let result = client
        .fetch(
            &format!("/users/{id}"),
            RequestOptions::new().fields(["name", "missing"]),
        )
        .await;

    assert_eq!(result.data(), Some(&json!({"name": "Ada"})));
}

#[tokio::test]
async fn strict_and_lenient_verbs() {
    let client = client().await;

    let err = client.get("/status/400").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 400,
            status_text: "Bad Request".to_string(),
        }
    );

    let envelope = client.lenient().get("/status/400").await.unwrap_err();
    assert_eq!(envelope.status(), 400);
    assert_eq!(envelope.error().unwrap().code, "400");

    let value = client.lenient().put("/echo", json!({"a": 1})).await;
    // /echo only accepts POST.
    assert_eq!(value.unwrap_err().status(), 405);
}

#[tokio::test]
async fn chain_creates_then_reads_then_deletes() {
    let client = client().await;

    let result = client
        .fetch_chain(vec![
            RequestDescriptor::new("/users")
                .method(HttpMethod::Post)
                .body(json!({"name": "Linus"}))
                .into(),
            ChainStep::deferred(|prev| {
                RequestDescriptor::new(format!("/users/{}", prev["id"].as_str().unwrap_or_default()))
            }),
            ChainStep::deferred(|prev| {
                RequestDescriptor::new(format!("/users/{}", prev["id"].as_str().unwrap_or_default()))
                    .method(HttpMethod::Delete)
            }),
        ])
        .await;

    assert!(result.is_ok(), "errors: {:?}", result.errors);
    // GET and DELETE share a URL; the later body replaces the earlier one.
    assert_eq!(result.responses.len(), 2);
    assert_eq!(result.responses["/users"]["name"], "Linus");
    assert_eq!(result.last_response, json!({}));
    assert!(result.responses.keys().all(|k| k.starts_with("/users")));
}

#[tokio::test]
async fn chain_stops_after_failed_step() {
    let client = client().await;

    let result = client
        .fetch_chain(vec![
            RequestDescriptor::new("/echo")
                .method(HttpMethod::Post)
                .body(json!({"step": 1}))
                .into(),
            ChainStep::deferred(|prev: &Value| {
                RequestDescriptor::new("/status/500").body(prev.clone())
            }),
            RequestDescriptor::new("/users")
                .method(HttpMethod::Post)
                .body(json!({"name": "never"}))
                .into(),
        ])
        .await;

    assert_eq!(result.responses.len(), 1);
    assert_eq!(result.responses["/echo"], json!({"step": 1}));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, "/status/500");
    assert_eq!(result.errors[0].error.code, "500");
}
