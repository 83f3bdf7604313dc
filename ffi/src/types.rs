//! C-layout mirrors of the `fetch-core` request and response types.
//!
//! # Design
//! Strings cross as NUL-terminated `c_char` pointers, the header list as a
//! pointer plus length, and the fetch modes as enums with fixed
//! discriminants. Conversions to and from the core types live here so
//! `lib.rs` only deals with argument checking and ownership.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use fetch_core::{ApiError, CacheMode, ClientConfig, Credentials, HttpMethod, HttpRequest, HttpResponse};

/// Opaque handle to a client configuration. C callers receive a pointer to
/// this and pass it back into every FFI function that builds requests.
pub struct FfiFetchClient {
    pub(crate) config: ClientConfig,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Request method, numbered for C.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// Fetch cache mode as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiCacheMode {
    Default = 0,
    NoStore = 1,
    Reload = 2,
    NoCache = 3,
    ForceCache = 4,
    OnlyIfCached = 5,
}

impl From<CacheMode> for FfiCacheMode {
    fn from(mode: CacheMode) -> Self {
        match mode {
            CacheMode::Default => FfiCacheMode::Default,
            CacheMode::NoStore => FfiCacheMode::NoStore,
            CacheMode::Reload => FfiCacheMode::Reload,
            CacheMode::NoCache => FfiCacheMode::NoCache,
            CacheMode::ForceCache => FfiCacheMode::ForceCache,
            CacheMode::OnlyIfCached => FfiCacheMode::OnlyIfCached,
        }
    }
}

impl From<FfiCacheMode> for CacheMode {
    fn from(mode: FfiCacheMode) -> Self {
        match mode {
            FfiCacheMode::Default => CacheMode::Default,
            FfiCacheMode::NoStore => CacheMode::NoStore,
            FfiCacheMode::Reload => CacheMode::Reload,
            FfiCacheMode::NoCache => CacheMode::NoCache,
            FfiCacheMode::ForceCache => CacheMode::ForceCache,
            FfiCacheMode::OnlyIfCached => CacheMode::OnlyIfCached,
        }
    }
}

/// Fetch credentials mode as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiCredentials {
    Include = 0,
    Omit = 1,
    SameOrigin = 2,
}

impl From<Credentials> for FfiCredentials {
    fn from(c: Credentials) -> Self {
        match c {
            Credentials::Include => FfiCredentials::Include,
            Credentials::Omit => FfiCredentials::Omit,
            Credentials::SameOrigin => FfiCredentials::SameOrigin,
        }
    }
}

// ---------------------------------------------------------------------------
// Request output
// ---------------------------------------------------------------------------

/// One header entry.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A built request, ready for the host to send.
///
/// Built by `fetch_build_request`. The C caller executes the request and
/// passes the response back through `fetch_normalize_response`. `body` is
/// null when the request carries no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub cache: FfiCacheMode,
    pub credentials: FfiCredentials,
}

impl FfiHttpRequest {
    /// Move `req` onto the heap in C layout. Freed by `fetch_free_request`.
    ///
    /// `None` if any string (URL, body, header key or value) contains an
    /// interior NUL, since C cannot see past it.
    pub(crate) fn from_core(req: HttpRequest) -> Option<*mut Self> {
        let url = CString::new(req.url).ok()?;
        let body = req.body.map(CString::new).transpose().ok()?;
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| Some((CString::new(k).ok()?, CString::new(v).ok()?)))
            .collect::<Option<Vec<_>>>()?;

        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: k.into_raw(),
                    value: v.into_raw(),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Some(Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: url.into_raw(),
            headers,
            headers_len,
            body: body.map_or(std::ptr::null_mut(), CString::into_raw),
            cache: req.cache.into(),
            credentials: req.credentials.into(),
        })))
    }
}

// ---------------------------------------------------------------------------
// Response input (owned by the host)
// ---------------------------------------------------------------------------

/// What the host received back.
///
/// The C caller constructs this on the stack after executing a request,
/// then passes a pointer to `fetch_normalize_response`. The FFI layer reads
/// but does not free these fields. Null strings are treated as empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub status_text: *const c_char,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// A body that is not UTF-8 cannot be JSON and is a decode failure.
    /// The status text is informational, so it is read lossily.
    pub(crate) fn to_core(&self) -> Result<HttpResponse, ApiError> {
        let body = match c_str(self.body) {
            Some(body) => body
                .to_str()
                .map_err(|e| ApiError::Deserialization(format!("response body: {e}")))?
                .to_string(),
            None => String::new(),
        };
        Ok(HttpResponse {
            status: self.status,
            status_text: c_str(self.status_text)
                .map(|text| text.to_string_lossy().into_owned())
                .unwrap_or_default(),
            headers: Vec::new(),
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// String helpers
// ---------------------------------------------------------------------------

/// Hand serialized JSON to C. JSON output escapes NUL, so the empty
/// fallback is unreachable.
pub(crate) fn into_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Borrow a C string as owned UTF-8. `None` for null or invalid UTF-8.
pub(crate) fn read_str(ptr: *const c_char) -> Option<String> {
    c_str(ptr)?.to_str().ok().map(str::to_string)
}

fn c_str<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) })
}
