//! Sequential, data-threaded request chains.
//!
//! # Design
//! A chain is an ordered list of steps. A step is either a fixed request or
//! a closure that builds its request from the previous step's parsed body.
//! Steps run one at a time, in order; the first failure is recorded and
//! nothing after it runs. `run` never returns an error: the caller inspects
//! `ChainResult::errors` to see how far the chain got.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::builder::{RequestBuilder, RequestOptions};
use crate::client::ApiClient;
use crate::envelope::{log_failure, ErrorInfo};
use crate::error::ApiError;
use crate::http::{merge_headers, CacheMode, Credentials, Headers, HttpMethod, RequestBody};
use crate::transport::Transport;

/// Transport options a caller attaches to a step. Values set here win over
/// anything the descriptor itself specifies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOptions {
    pub cache: Option<CacheMode>,
    pub credentials: Option<Credentials>,
    pub headers: Headers,
}

/// One concrete request in a chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Option<HttpMethod>,
    pub body: Option<RequestBody>,
    pub headers: Option<Headers>,
    pub options: Option<StepOptions>,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn options(mut self, options: StepOptions) -> Self {
        self.options = Some(options);
        self
    }

    fn into_parts(self) -> (String, RequestOptions) {
        let options = self.options.unwrap_or_default();
        let headers = merge_headers(&self.headers.unwrap_or_default(), &options.headers);
        let request_options = RequestOptions {
            method: self.method.unwrap_or_default(),
            cache: options.cache.unwrap_or_default(),
            credentials: options.credentials.unwrap_or_default(),
            headers: Some(headers),
            body: self.body,
            fields: Vec::new(),
        };
        (self.url, request_options)
    }
}

type Deferred = Box<dyn FnOnce(&Value) -> RequestDescriptor + Send>;

/// A chain step, evaluated lazily when its turn comes.
pub enum ChainStep {
    Request(RequestDescriptor),
    /// Built from the previous step's parsed body (`Null` for the first step).
    Deferred(Deferred),
}

impl ChainStep {
    pub fn deferred<F>(build: F) -> Self
    where
        F: FnOnce(&Value) -> RequestDescriptor + Send + 'static,
    {
        ChainStep::Deferred(Box::new(build))
    }

    fn resolve(self, previous: &Value) -> RequestDescriptor {
        match self {
            ChainStep::Request(descriptor) => descriptor,
            ChainStep::Deferred(build) => build(previous),
        }
    }
}

impl From<RequestDescriptor> for ChainStep {
    fn from(descriptor: RequestDescriptor) -> Self {
        ChainStep::Request(descriptor)
    }
}

impl fmt::Debug for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStep::Request(descriptor) => f.debug_tuple("Request").field(descriptor).finish(),
            ChainStep::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// The failure that stopped a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    /// Zero-based position of the failing step.
    pub index: usize,
    /// Logical URL of the failing step.
    pub url: String,
    pub error: ErrorInfo,
}

/// Everything a chain produced up to the point it stopped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainResult {
    pub last_response: Value,
    /// Parsed bodies keyed by logical URL (base URL stripped).
    pub responses: BTreeMap<String, Value>,
    /// At most one entry: the first failure.
    pub errors: Vec<StepFailure>,
}

impl ChainResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run `steps` in order against `client`.
pub(crate) async fn run<T: Transport>(client: &ApiClient<T>, steps: Vec<ChainStep>) -> ChainResult {
    let mut result = ChainResult {
        last_response: Value::Null,
        ..Default::default()
    };
    let resolver = client.config().resolver();
    let builder = RequestBuilder::new(client.config());

    for (index, step) in steps.into_iter().enumerate() {
        let (url, options) = step.resolve(&result.last_response).into_parts();
        debug!(step = index, url = %url, method = options.method.as_str(), "running chain step");

        let outcome = match builder.build(&url, &options) {
            Ok(request) => {
                let logical = resolver.strip(&request.url);
                client
                    .round_trip(request)
                    .await
                    .map(|(_, body)| (logical, body))
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok((logical, body)) => {
                result.responses.insert(logical, body.clone());
                result.last_response = body;
            }
            Err(err) => {
                record_failure(&mut result, index, url, &err);
                break;
            }
        }
    }

    result
}

fn record_failure(result: &mut ChainResult, index: usize, url: String, err: &ApiError) {
    log_failure(err);
    debug!(step = index, url = %url, "chain stopped");
    result.errors.push(StepFailure {
        index,
        url,
        error: ErrorInfo::from(err),
    });
}
