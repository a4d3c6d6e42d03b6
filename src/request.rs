use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{FetchError, Result};

/// Per-call request settings layered over the client defaults.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) headers: HeaderMap,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) abort: Option<CancellationToken>,
}

impl RequestOptions {
    /// Starts an empty request with `method`.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            abort: None,
        }
    }

    /// Shorthand for `new(Method::GET)`.
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// Shorthand for `new(Method::POST)`.
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Shorthand for `new(Method::PUT)`.
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// Shorthand for `new(Method::DELETE)`.
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Sets a header for this request. Client defaults never replace it.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serializes `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| FetchError::Decode(format!("request body is not serializable: {err}")))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// Overrides the client's per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cancels the call, including any pending retry, once `token` fires.
    ///
    /// On `wasm32` an attempt already in flight runs to completion first.
    pub fn abort_on(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    /// HTTP method this request will use.
    pub fn method(&self) -> &Method {
        &self.method
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}
