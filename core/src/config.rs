//! Client configuration: base-URL resolution and default headers.
//!
//! # Design
//! Both pieces are fixed when the client is constructed and never mutated
//! afterwards. Per-call headers are merged onto a copy of the defaults, so
//! one call can never leak headers into the next.

use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::Arc;

use crate::http::{merge_headers, Headers};

/// Authority used by `BaseUrl::local()`.
pub const LOCAL_AUTHORITY: &str = "http://localhost:3000";

/// Environment variable read by `ClientConfig::from_env`.
pub const BASE_URL_ENV: &str = "FETCH_BASE_URL";

/// Turns the logical URL a caller passes in into the URL sent on the wire.
///
/// Resolvers must be `RefUnwindSafe` so a `ClientConfig` can be used inside
/// `catch_unwind` at the C boundary.
pub trait UrlResolver: Send + Sync + RefUnwindSafe + fmt::Debug {
    fn resolve(&self, url: &str) -> String;

    /// Inverse of `resolve`: map a wire URL back to its logical form.
    fn strip(&self, url: &str) -> String;
}

/// Leaves URLs untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl UrlResolver for Passthrough {
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }

    fn strip(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Prefixes every URL with a fixed base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    base: String,
}

impl BaseUrl {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// The local development authority, `http://localhost:3000`.
    pub fn local() -> Self {
        Self::new(LOCAL_AUTHORITY)
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl UrlResolver for BaseUrl {
    fn resolve(&self, url: &str) -> String {
        format!("{}{url}", self.base)
    }

    fn strip(&self, url: &str) -> String {
        url.strip_prefix(self.base.as_str()).unwrap_or(url).to_string()
    }
}

/// Headers every request starts from.
pub fn json_headers() -> Headers {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

/// Immutable per-client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    resolver: Arc<dyn UrlResolver>,
    default_headers: Headers,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            resolver: Arc::new(Passthrough),
            default_headers: json_headers(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the base URL from `FETCH_BASE_URL`; unset or blank means passthrough.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::default().with_base_url(base.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(self, base: &str) -> Self {
        self.with_resolver(BaseUrl::new(base))
    }

    pub fn with_resolver(mut self, resolver: impl UrlResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Add or replace one default header.
    pub fn with_default_header(mut self, key: &str, value: &str) -> Self {
        self.default_headers = merge_headers(
            &self.default_headers,
            &[(key.to_string(), value.to_string())],
        );
        self
    }

    pub fn resolver(&self) -> &dyn UrlResolver {
        self.resolver.as_ref()
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }
}
