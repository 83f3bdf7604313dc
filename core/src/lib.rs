//! HTTP client core with a single canonical result envelope.
//!
//! # Overview
//! Builds `HttpRequest` values from fetch-style options, hands them to an
//! injected `Transport`, and normalizes whatever comes back (a 2xx body, a
//! non-2xx status, or a transport failure) into one `CanonicalResult`.
//! Dependent requests can be run as a chain, where each step sees the
//! previous step's parsed body and the chain stops at the first failure.
//!
//! # Design
//! - `ApiClient` holds only immutable configuration and its transport.
//! - Request building and response normalization are pure functions, so
//!   hosts that do their own I/O (see the `fetch-ffi` crate) can use them
//!   without a transport.
//! - `ReqwestTransport` (feature `reqwest`, on by default) is the stock
//!   network transport.

pub mod builder;
pub mod chain;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod http;
pub mod transport;

pub use builder::{RequestBuilder, RequestOptions};
pub use chain::{ChainResult, ChainStep, RequestDescriptor, StepFailure, StepOptions};
pub use client::{ApiClient, Lenient};
pub use config::{BaseUrl, ClientConfig, Passthrough, UrlResolver, LOCAL_AUTHORITY};
pub use envelope::{
    classify_failure, handle_error, handle_response, CanonicalResult, ErrorArgs, ErrorInfo,
    HandledResponse, ResponseArgs, ENVELOPE_VERSION,
};
pub use error::ApiError;
pub use fields::project as fields;
pub use http::{CacheMode, Credentials, Headers, HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use transport::Transport;

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
