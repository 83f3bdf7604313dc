//! The injected transport seam.
//!
//! # Design
//! The core never opens a socket itself. `ApiClient` hands a fully built
//! `HttpRequest` to a `Transport` and gets an `HttpResponse` (any status)
//! or a transport failure back. Non-2xx statuses are data, not errors; the
//! normalizer decides what they mean.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`. Only failures that prevented a response from
    /// arriving are errors; they should be `ApiError::Transport`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use async_trait::async_trait;
    use reqwest::header::CACHE_CONTROL;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{CacheMode, HttpMethod, HttpRequest, HttpResponse};

    /// `Transport` backed by a `reqwest::Client`.
    ///
    /// Cache modes that forbid reuse are sent as `Cache-Control`. The
    /// credentials mode is not applied: the client keeps no cookie store,
    /// which already behaves like `omit`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn cache_control(cache: CacheMode) -> Option<&'static str> {
        match cache {
            CacheMode::NoStore => Some("no-store"),
            CacheMode::NoCache | CacheMode::Reload => Some("no-cache"),
            _ => None,
        }
    }

    fn transport_error(err: reqwest::Error) -> ApiError {
        ApiError::Transport(err.to_string())
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let mut builder = self.client.request(method(request.method), &request.url);
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            if let Some(directive) = cache_control(request.cache) {
                builder = builder.header(CACHE_CONTROL, directive);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response.text().await.map_err(transport_error)?;

            Ok(HttpResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            })
        }
    }

}
