//! The canonical result envelope and the normalizer that produces it.
//!
//! # Design
//! Every request outcome ends up as a `CanonicalResult`: either `Success`
//! with the parsed body or `Failure` with an `ErrorInfo`. HTTP failures,
//! transport failures and codec failures all go through `from_failure`, so
//! they are structurally identical once normalized.
//!
//! The serialized form is versioned (`ENVELOPE_VERSION`) and flat:
//! `{version, ok, status, cache, data, error?}`. A failure serializes
//! `data` as `{}`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::error::{ApiError, DEFAULT_ERROR_STATUS};
use crate::http::{parse_json_body, CacheMode, HttpResponse};

/// Version of the serialized envelope layout.
pub const ENVELOPE_VERSION: u32 = 1;

const DEFAULT_SUCCESS_STATUS: u16 = 200;

/// Normalized error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
}

impl From<&ApiError> for ErrorInfo {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code(),
            message: Some(err.message()),
            status: err.status(),
        }
    }
}

/// Outcome of a single request, success or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalResult<T = Value> {
    Success { status: u16, cache: bool, data: T },
    Failure { status: u16, cache: bool, error: ErrorInfo },
}

impl<T> CanonicalResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, CanonicalResult::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            CanonicalResult::Success { status, .. } | CanonicalResult::Failure { status, .. } => {
                *status
            }
        }
    }

    pub fn cache(&self) -> bool {
        match self {
            CanonicalResult::Success { cache, .. } | CanonicalResult::Failure { cache, .. } => {
                *cache
            }
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CanonicalResult::Success { data, .. } => Some(data),
            CanonicalResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            CanonicalResult::Success { .. } => None,
            CanonicalResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorInfo> {
        match self {
            CanonicalResult::Success { data, .. } => Ok(data),
            CanonicalResult::Failure { error, .. } => Err(error),
        }
    }
}

impl<T: Serialize> Serialize for CanonicalResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("version", &ENVELOPE_VERSION)?;
        map.serialize_entry("ok", &self.is_ok())?;
        map.serialize_entry("status", &self.status())?;
        map.serialize_entry("cache", &self.cache())?;
        match self {
            CanonicalResult::Success { data, .. } => map.serialize_entry("data", data)?,
            CanonicalResult::Failure { error, .. } => {
                map.serialize_entry("data", &Map::new())?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

/// Normalize a successful response body.
///
/// A body that is not well-formed JSON turns the outcome into a
/// `SERVER_ERROR` failure.
pub fn from_success(body: &str, cache: CacheMode, status: u16) -> CanonicalResult {
    match parse_json_body(body) {
        Ok(data) => CanonicalResult::Success {
            status,
            cache: cache.allows_reuse(),
            data,
        },
        Err(err) => from_failure(&err, cache),
    }
}

/// Normalize whatever the transport returned, 2xx or not.
pub fn from_response(response: &HttpResponse, cache: CacheMode) -> CanonicalResult {
    if response.is_success() {
        return from_success(&response.body, cache, response.status);
    }
    let err = ApiError::Http {
        status: response.status,
        status_text: response.status_text.clone(),
    };
    from_failure(&err, cache)
}

/// Normalize any failure. Logs before returning.
pub fn from_failure(err: &ApiError, cache: CacheMode) -> CanonicalResult {
    log_failure(err);
    let error = ErrorInfo::from(err);
    CanonicalResult::Failure {
        status: error.status,
        cache: cache.allows_reuse(),
        error,
    }
}

pub(crate) fn log_failure(err: &ApiError) {
    match err {
        ApiError::Http { status, .. } => {
            warn!(status = *status, code = %err.code(), message = %err.message(), "request failed")
        }
        _ => error!(status = err.status(), code = %err.code(), error = %err, "request failed"),
    }
}

/// Caller-supplied error for `handle_response`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorArgs {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

/// Loose inputs for `handle_response`; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResponseArgs {
    pub data: Option<Value>,
    pub error: Option<ErrorArgs>,
    pub cache: Option<bool>,
    pub status: Option<u16>,
    pub fields: Option<Map<String, Value>>,
}

/// `handle_response` output: the envelope plus the field names that were
/// passed in, for the caller's diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandledResponse {
    #[serde(flatten)]
    pub result: CanonicalResult,
    pub fields: Vec<String>,
}

/// Build an envelope from already-known parts, without any I/O.
///
/// The presence of `error` decides the branch. A missing (or zero) status
/// becomes 500 on failure and 200 on success; a missing `cache` is false.
pub fn handle_response(args: ResponseArgs) -> HandledResponse {
    let cache = args.cache.unwrap_or(false);
    let fields = args
        .fields
        .map(|fields| fields.keys().cloned().collect())
        .unwrap_or_default();

    let result = match args.error {
        Some(err) => {
            let status = err
                .status
                .filter(|s| *s != 0)
                .unwrap_or(DEFAULT_ERROR_STATUS);
            CanonicalResult::Failure {
                status,
                cache,
                error: ErrorInfo {
                    code: err.code,
                    message: err.message,
                    status,
                },
            }
        }
        None => CanonicalResult::Success {
            status: args
                .status
                .filter(|s| *s != 0)
                .unwrap_or(DEFAULT_SUCCESS_STATUS),
            cache,
            data: args.data.unwrap_or_else(|| Value::Object(Map::new())),
        },
    };

    HandledResponse { result, fields }
}

/// Log label for a failed status.
pub fn classify_failure(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        404 => "Not found",
        _ => "Request failed",
    }
}

/// Log a failed response with its decoded body. Diagnostic only.
pub fn handle_error(response: &HttpResponse) {
    let detail = parse_json_body(&response.body)
        .unwrap_or_else(|_| Value::String(response.body.clone()));
    let label = classify_failure(response.status);
    match response.status {
        400..=499 => warn!(status = response.status, detail = %detail, "{label}"),
        _ => error!(status = response.status, detail = %detail, "{label}"),
    }
}
