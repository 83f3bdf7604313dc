//! Turns high-level `RequestOptions` into a transport-ready `HttpRequest`.
//!
//! Pure data transformation, no I/O. The only possible failure is a body
//! that cannot be serialized.

use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{merge_headers, CacheMode, Credentials, Headers, HttpMethod, HttpRequest, RequestBody};

/// Caller-facing request options. Every field has a fetch-style default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub cache: CacheMode,
    pub credentials: Credentials,
    /// Merged over the client's default headers; `None` keeps the defaults.
    pub headers: Option<Headers>,
    pub body: Option<RequestBody>,
    /// Server-side projection, sent as `?fields=a,b`.
    pub fields: Vec<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        let headers = self.headers.get_or_insert_with(Vec::new);
        headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Builds requests against one client configuration.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a ClientConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a ClientConfig) -> Self {
        Self { config }
    }

    /// Assemble the transport call for `url`.
    ///
    /// The URL goes through the configured resolver first, then the field
    /// list is appended as `?fields=`. An existing query string is not
    /// merged; callers that already carry one should not also pass fields.
    pub fn build(&self, url: &str, options: &RequestOptions) -> Result<HttpRequest, ApiError> {
        let mut url = self.config.resolver().resolve(url);
        if !options.fields.is_empty() {
            url = format!("{url}?fields={}", options.fields.join(","));
        }

        let headers = match &options.headers {
            Some(headers) => merge_headers(self.config.default_headers(), headers),
            None => self.config.default_headers().to_vec(),
        };

        let body = match &options.body {
            Some(body) => body.encode()?,
            None => None,
        };

        Ok(HttpRequest {
            method: options.method,
            url,
            headers,
            body,
            cache: options.cache,
            credentials: options.credentials,
        })
    }
}
