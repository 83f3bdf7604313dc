//! `ApiClient`: the public request surface.
//!
//! # Design
//! `ApiClient` holds an immutable `ClientConfig` and a `Transport`, nothing
//! else, so one client can serve any number of concurrent callers. There
//! are two failure conventions and they are separate types:
//!
//! - `ApiClient::{get, post, put, delete, request}` are strict: a failure
//!   is returned as `Err(ApiError)`. Each verb has a `*_with_headers`
//!   form whose headers are merged over the client defaults.
//! - `ApiClient::lenient()` returns a `Lenient` view whose verbs hand back
//!   the normalized failure envelope instead.
//!
//! `fetch` always returns a `CanonicalResult` and never fails.

use serde_json::Value;

use crate::builder::{RequestBuilder, RequestOptions};
use crate::chain::{self, ChainResult, ChainStep};
use crate::config::ClientConfig;
use crate::envelope::{from_failure, from_response, log_failure, CanonicalResult};
use crate::error::ApiError;
use crate::http::{CacheMode, Headers, HttpMethod, HttpRequest, RequestBody};
use crate::transport::Transport;

/// HTTP client over an injected transport.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(&self, url: &str, options: &RequestOptions) -> Result<HttpRequest, ApiError> {
        RequestBuilder::new(&self.config).build(url, options)
    }

    /// One request/response cycle, normalized.
    pub async fn fetch(&self, url: &str, options: RequestOptions) -> CanonicalResult {
        let cache = options.cache;
        let request = match self.build_request(url, &options) {
            Ok(request) => request,
            Err(err) => return from_failure(&err, cache),
        };
        match self.transport.send(request).await {
            Ok(response) => from_response(&response, cache),
            Err(err) => from_failure(&err, cache),
        }
    }

    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.request(HttpMethod::Get, url, None, None).await
    }

    pub async fn post(&self, url: &str, body: impl Into<RequestBody>) -> Result<Value, ApiError> {
        self.request(HttpMethod::Post, url, Some(body.into()), None).await
    }

    pub async fn put(&self, url: &str, body: impl Into<RequestBody>) -> Result<Value, ApiError> {
        self.request(HttpMethod::Put, url, Some(body.into()), None).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        self.request(HttpMethod::Delete, url, None, None).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: Headers) -> Result<Value, ApiError> {
        self.request(HttpMethod::Get, url, None, Some(headers)).await
    }

    pub async fn post_with_headers(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        headers: Headers,
    ) -> Result<Value, ApiError> {
        self.request(HttpMethod::Post, url, Some(body.into()), Some(headers))
            .await
    }

    pub async fn put_with_headers(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        headers: Headers,
    ) -> Result<Value, ApiError> {
        self.request(HttpMethod::Put, url, Some(body.into()), Some(headers))
            .await
    }

    pub async fn delete_with_headers(&self, url: &str, headers: Headers) -> Result<Value, ApiError> {
        self.request(HttpMethod::Delete, url, None, Some(headers)).await
    }

    /// Strict request: parsed body on 2xx, `Err` otherwise.
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Value, ApiError> {
        let result = self.send_verb(method, url, body, headers).await;
        if let Err(err) = &result {
            log_failure(err);
        }
        result
    }

    /// View of this client whose verbs return failure envelopes.
    pub fn lenient(&self) -> Lenient<'_, T> {
        Lenient { client: self }
    }

    /// Run `steps` sequentially, threading each parsed body into the next.
    pub async fn fetch_chain(&self, steps: Vec<ChainStep>) -> ChainResult {
        chain::run(self, steps).await
    }

    async fn send_verb(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Value, ApiError> {
        let options = RequestOptions {
            method,
            body,
            headers,
            ..Default::default()
        };
        let request = self.build_request(url, &options)?;
        self.round_trip(request).await.map(|(_, body)| body)
    }

    /// Send and decode. Non-2xx becomes `ApiError::Http`. Does not log.
    pub(crate) async fn round_trip(&self, request: HttpRequest) -> Result<(u16, Value), ApiError> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                status_text: response.status_text,
            });
        }
        let body = response.parse_body()?;
        Ok((response.status, body))
    }
}

/// Verb wrappers that return the normalized failure envelope on error.
#[derive(Debug, Clone, Copy)]
pub struct Lenient<'a, T> {
    client: &'a ApiClient<T>,
}

impl<T: Transport> Lenient<'_, T> {
    pub async fn get(&self, url: &str) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Get, url, None, None).await
    }

    pub async fn post(&self, url: &str, body: impl Into<RequestBody>) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Post, url, Some(body.into()), None).await
    }

    pub async fn put(&self, url: &str, body: impl Into<RequestBody>) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Put, url, Some(body.into()), None).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Delete, url, None, None).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: Headers) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Get, url, None, Some(headers)).await
    }

    pub async fn post_with_headers(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        headers: Headers,
    ) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Post, url, Some(body.into()), Some(headers))
            .await
    }

    pub async fn put_with_headers(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        headers: Headers,
    ) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Put, url, Some(body.into()), Some(headers))
            .await
    }

    pub async fn delete_with_headers(
        &self,
        url: &str,
        headers: Headers,
    ) -> Result<Value, CanonicalResult> {
        self.request(HttpMethod::Delete, url, None, Some(headers)).await
    }

    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<RequestBody>,
        headers: Option<Headers>,
    ) -> Result<Value, CanonicalResult> {
        self.client
            .send_verb(method, url, body, headers)
            .await
            .map_err(|err| from_failure(&err, CacheMode::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a fixed outcome and remembers the last request.
    #[derive(Debug)]
    struct Fixed {
        outcome: Result<HttpResponse, ApiError>,
        seen: Mutex<Option<HttpRequest>>,
    }

    impl Fixed {
        fn new(outcome: Result<HttpResponse, ApiError>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(None),
            }
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl Transport for Fixed {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            *self.seen.lock().unwrap() = Some(request);
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn fetch_success_reports_cache_flag() {
        let client = ApiClient::new(Fixed::new(Ok(HttpResponse::json(200, &json!({"a": 1})))));
        let result = client.fetch("/a", RequestOptions::new().cache(CacheMode::ForceCache)).await;
        assert!(result.is_ok());
        assert!(result.cache());
        assert_eq!(result.status(), 200);
        assert_eq!(result.data(), Some(&json!({"a": 1})));
    }

    #[tokio::test]
    async fn fetch_transport_failure_is_fetch_error() {
        let client = ApiClient::new(Fixed::new(Err(ApiError::Transport("refused".into()))));
        let result = client.fetch("/a", RequestOptions::new()).await;
        assert!(!result.is_ok());
        assert_eq!(result.status(), 500);
        assert_eq!(result.error().unwrap().code, "FETCH_ERROR");
    }

    #[tokio::test]
    async fn strict_get_returns_http_error() {
        let client = ApiClient::new(Fixed::new(Ok(HttpResponse::json(404, &json!({})))));
        let err = client.get("/missing").await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 404,
                status_text: "Not Found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn lenient_get_returns_envelope() {
        let client = ApiClient::new(Fixed::new(Err(ApiError::Transport("fake error message".into()))));
        let envelope = client.lenient().get("/a").await.unwrap_err();
        assert_eq!(envelope.status(), 500);
        assert!(!envelope.cache());
        assert_eq!(envelope.error().unwrap().code, "FETCH_ERROR");
    }

    #[tokio::test]
    async fn post_sends_json_body_with_default_headers() {
        let client = ApiClient::with_config(
            Fixed::new(Ok(HttpResponse::json(201, &json!({"success": true})))),
            ClientConfig::new().with_base_url("http://api.test"),
        );
        let value = client.post("/users", json!({"name": "test"})).await.unwrap();
        assert_eq!(value, json!({"success": true}));

        let sent = client.transport().last();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.url, "http://api.test/users");
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "test"}));
    }

    #[tokio::test]
    async fn verb_headers_merge_over_defaults() {
        let client = ApiClient::new(Fixed::new(Ok(HttpResponse::json(200, &json!({})))));
        let headers = vec![
            ("content-type".to_string(), "application/merge-patch+json".to_string()),
            ("Authorization".to_string(), "Bearer t".to_string()),
        ];

        client
            .put_with_headers("/users/1", json!({"name": "x"}), headers.clone())
            .await
            .unwrap();
        let sent = client.transport().last();
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.header("Content-Type"), Some("application/merge-patch+json"));
        assert_eq!(sent.header("authorization"), Some("Bearer t"));
        assert_eq!(sent.headers.len(), 2);

        client.lenient().get_with_headers("/users/1", headers).await.unwrap();
        let sent = client.transport().last();
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.header("authorization"), Some("Bearer t"));

        client.get("/users/1").await.unwrap();
        assert_eq!(client.transport().last().header("authorization"), None);
    }

    #[tokio::test]
    async fn delete_with_empty_204_body_is_ok() {
        let response = HttpResponse {
            status: 204,
            status_text: "No Content".to_string(),
            headers: Vec::new(),
            body: String::new(),
        };
        let client = ApiClient::new(Fixed::new(Ok(response)));
        let value = client.delete("/users/1").await.unwrap();
        assert_eq!(value, json!({}));
        assert_eq!(client.transport().last().method, HttpMethod::Delete);
    }
}
