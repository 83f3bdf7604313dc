//! C-ABI wrapper around `fetch-core`.
//!
//! # Overview
//! Exposes the I/O-free half of the client through `extern "C"` functions:
//! building a request, normalizing a response the host fetched itself,
//! `handle_response`, and field projection. The host performs the network
//! round-trip; nothing here links an async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Structured results cross as JSON strings (the versioned envelope),
//!   which any host language can decode.
//! - The C caller owns all returned pointers and must call the matching
//!   `fetch_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use fetch_core::envelope::{from_failure, from_response};
use fetch_core::{handle_response, ClientConfig, RequestBuilder, RequestOptions, ResponseArgs};
use serde_json::Value;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client configuration.
///
/// `base_url` may be null, in which case URLs are used as given.
/// The caller must free the returned pointer with `fetch_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_client_new(base_url: *const c_char) -> *mut FfiFetchClient {
    catch_unwind(|| {
        let config = match read_str(base_url) {
            Some(base) if !base.is_empty() => ClientConfig::new().with_base_url(&base),
            _ => ClientConfig::new(),
        };
        Box::into_raw(Box::new(FfiFetchClient { config }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `fetch_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_client_free(client: *mut FfiFetchClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

/// Build a request for `url`.
///
/// `options_json` is a JSON object in `RequestOptions` form (camelCase
/// keys, every key optional) and may be null for all defaults.
/// Returns null if `client` or `url` is null, if the options do not parse,
/// or if the built request would carry an interior NUL.
/// The caller must free the returned pointer with `fetch_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_build_request(
    client: *const FfiFetchClient,
    url: *const c_char,
    options_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(url) = read_str(url) else {
            return std::ptr::null_mut();
        };
        let options: RequestOptions = match read_str(options_json) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(options) => options,
                Err(_) => return std::ptr::null_mut(),
            },
            None => RequestOptions::default(),
        };
        let client = unsafe { &*client };
        match RequestBuilder::new(&client.config).build(&url, &options) {
            Ok(req) => FfiHttpRequest::from_core(req).unwrap_or(std::ptr::null_mut()),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a response the host received into the JSON envelope.
///
/// A body that is not valid UTF-8 normalizes to a `SERVER_ERROR` failure.
/// Returns null if `response` is null. The caller must free the returned
/// string with `fetch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_normalize_response(
    response: *const FfiHttpResponse,
    cache: FfiCacheMode,
) -> *mut c_char {
    catch_unwind(|| {
        if response.is_null() {
            return std::ptr::null_mut();
        }
        let result = match unsafe { &*response }.to_core() {
            Ok(response) => from_response(&response, cache.into()),
            Err(err) => from_failure(&err, cache.into()),
        };
        to_json_string(&result)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an envelope from `args_json` (`{data?, error?, cache?, status?, fields?}`).
///
/// Returns null if `args_json` is null or not valid JSON of that shape.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_handle_response(args_json: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let Some(json) = read_str(args_json) else {
            return std::ptr::null_mut();
        };
        match serde_json::from_str::<ResponseArgs>(&json) {
            Ok(args) => to_json_string(&handle_response(args)),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Project `source_json` (a JSON object) onto the comma-separated `fields`.
///
/// Returns null if either argument is null or `source_json` is not an object.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_project_fields(
    fields: *const c_char,
    source_json: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        let (Some(fields), Some(source)) = (read_str(fields), read_str(source_json)) else {
            return std::ptr::null_mut();
        };
        match serde_json::from_str::<Value>(&source) {
            Ok(Value::Object(map)) => {
                to_json_string(&Value::Object(fetch_core::fields(&fields, &map)))
            }
            _ => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

fn to_json_string<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => into_c_string(json),
        Err(_) => std::ptr::null_mut(),
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `fetch_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
