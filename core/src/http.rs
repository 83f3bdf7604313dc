//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and normalizes `HttpResponse` values; the
//! actual I/O happens behind the `Transport` trait (or in the host, for FFI
//! callers). All fields use owned types so values can cross FFI boundaries
//! without lifetime concerns.
//!
//! Cache and credential modes mirror the browser fetch vocabulary. They are
//! carried on every request so a transport can honor them, and the cache
//! mode also decides the `cache` flag of the canonical envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Ordered header list. Keys compare case-insensitively when merged.
pub type Headers = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Fetch cache mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    #[default]
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CacheMode {
    /// Whether a response fetched under this mode may be reused.
    pub fn allows_reuse(&self) -> bool {
        !matches!(self, CacheMode::NoCache | CacheMode::NoStore)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Default => "default",
            CacheMode::NoStore => "no-store",
            CacheMode::Reload => "reload",
            CacheMode::NoCache => "no-cache",
            CacheMode::ForceCache => "force-cache",
            CacheMode::OnlyIfCached => "only-if-cached",
        }
    }

    /// Parse the fetch spelling (`"no-store"`, `"force-cache"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(CacheMode::Default),
            "no-store" => Some(CacheMode::NoStore),
            "reload" => Some(CacheMode::Reload),
            "no-cache" => Some(CacheMode::NoCache),
            "force-cache" => Some(CacheMode::ForceCache),
            "only-if-cached" => Some(CacheMode::OnlyIfCached),
            _ => None,
        }
    }
}

/// Fetch credentials mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Include,
    #[default]
    Omit,
    SameOrigin,
}

/// A request payload.
///
/// `Json` values are serialized exactly once when the request is built.
/// `Raw` strings are already serialized and are sent verbatim, so a body
/// that has been encoded upstream is never encoded a second time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RequestBody {
    Json(Value),
    Raw(String),
}

impl RequestBody {
    /// Serialize into the wire string. `Json(Null)` yields `None`.
    pub fn encode(&self) -> Result<Option<String>, ApiError> {
        match self {
            RequestBody::Json(Value::Null) => Ok(None),
            RequestBody::Json(value) => serde_json::to_string(value)
                .map(Some)
                .map_err(|e| ApiError::Serialization(e.to_string())),
            RequestBody::Raw(raw) => Ok(Some(raw.clone())),
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    pub cache: CacheMode,
    pub credentials: Credentials,
}

impl HttpRequest {
    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    /// Convenience constructor for a response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON. An empty body parses as `{}`.
    pub fn parse_body(&self) -> Result<Value, ApiError> {
        parse_json_body(&self.body)
    }
}

/// Parse a response body; blank bodies (e.g. 204) become an empty object.
pub fn parse_json_body(body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(body)?)
}

/// Merge `overrides` onto `base`. Keys match case-insensitively; an
/// overriding entry replaces the base value in place, new keys append.
pub fn merge_headers(base: &[(String, String)], overrides: &[(String, String)]) -> Headers {
    let mut merged: Headers = base.to_vec();
    for (key, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

/// Reason phrase for the common status codes, empty otherwise.
pub fn canonical_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
