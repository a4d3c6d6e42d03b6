//! Request pipeline stages.
//!
//! The client sends every request through an ordered stack of
//! [`reqwest_middleware::Middleware`] stages:
//! [`RetryMiddleware`] first, then [`LoggingMiddleware`], then the transport.
//! Logging sits inside the retry loop so each attempt is recorded.

use std::{future::Future, time::Duration};

use http::Extensions;
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Error, Middleware, Next};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{error::AbortedMarker, ClientOptions};

/// Retry counter for one logical call, visible to inner stages through the
/// request extensions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RetryAttempt {
    retries: usize,
}

impl RetryAttempt {
    /// Number of retries performed before this attempt (0 for the first send).
    pub fn retries(&self) -> usize {
        self.retries
    }

    fn next(self) -> Self {
        Self {
            retries: self.retries + 1,
        }
    }
}

/// Cancellation token attached to a request by the client.
#[derive(Clone, Debug)]
pub(crate) struct AbortSignal(pub(crate) CancellationToken);

impl AbortSignal {
    fn is_aborted(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Records each outgoing request and its outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingMiddleware {
    log_bodies: bool,
}

impl LoggingMiddleware {
    /// Bodies are logged only when `log_bodies` is set.
    pub fn new(log_bodies: bool) -> Self {
        Self { log_bodies }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_owned();
        let attempt = extensions.get::<RetryAttempt>().map_or(0, RetryAttempt::retries);

        if self.log_bodies {
            let body = req
                .body()
                .and_then(|body| body.as_bytes())
                .map(String::from_utf8_lossy);
            debug!(
                %method,
                %path,
                attempt,
                body = body.as_deref().unwrap_or(""),
                "sending request"
            );
        } else {
            debug!(%method, %path, attempt, "sending request");
        }

        match next.run(req, extensions).await {
            Ok(response) => {
                debug!(%method, %path, status = response.status().as_u16(), "received response");
                Ok(response)
            }
            Err(err) => {
                error!(%method, %path, error = %err, "request error");
                Err(err)
            }
        }
    }
}

/// Re-sends a request after timeouts, network failures and 503 responses.
///
/// The delay before retry `n` is `base_delay × n`.
#[derive(Clone, Copy, Debug)]
pub struct RetryMiddleware {
    max_retries: usize,
    base_delay: Duration,
}

impl RetryMiddleware {
    /// Allows up to `max_retries` retries, waiting `base_delay × n` before retry `n`.
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl Middleware for RetryMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let abort = extensions.get::<AbortSignal>().cloned();
        let mut attempt = RetryAttempt::default();

        loop {
            if abort.as_ref().is_some_and(AbortSignal::is_aborted) {
                return Err(Error::middleware(AbortedMarker));
            }

            // A streaming body cannot be replayed, so it gets exactly one try.
            let Some(duplicate) = req.try_clone() else {
                extensions.insert(attempt);
                let sent = send_and_buffer(next, req, extensions);
                return match until_aborted(abort.as_ref(), sent).await {
                    Some(outcome) => outcome,
                    None => Err(Error::middleware(AbortedMarker)),
                };
            };

            extensions.insert(attempt);
            let sent = send_and_buffer(next.clone(), duplicate, extensions);
            let Some(outcome) = until_aborted(abort.as_ref(), sent).await else {
                debug!(url = %req.url(), "request aborted in flight");
                return Err(Error::middleware(AbortedMarker));
            };

            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(err) => is_retryable_error(err),
            };
            if !retryable || attempt.retries >= self.max_retries {
                return outcome;
            }
            drop(outcome);

            attempt = attempt.next();
            let delay = backoff_delay(self.base_delay, attempt.retries);
            warn!(
                retry = attempt.retries,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                url = %req.url(),
                "retrying request"
            );

            if until_aborted(abort.as_ref(), sleep(delay)).await.is_none() {
                debug!(url = %req.url(), "request aborted during backoff");
                return Err(Error::middleware(AbortedMarker));
            }
        }
    }
}

/// Sends one attempt and reads the whole body, so a timeout while the body
/// is still streaming reaches the retry decision like any other timeout.
async fn send_and_buffer(
    next: Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> reqwest_middleware::Result<Response> {
    let response = next.run(req, extensions).await?;
    buffer_body(response).await
}

#[cfg(not(target_arch = "wasm32"))]
async fn buffer_body(response: Response) -> reqwest_middleware::Result<Response> {
    let status = response.status();
    let version = response.version();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    let mut buffered = http::Response::new(body);
    *buffered.status_mut() = status;
    *buffered.version_mut() = version;
    *buffered.headers_mut() = headers;
    Ok(Response::from(buffered))
}

/// WASM: the Fetch response cannot be rebuilt from parts, so the body is
/// left for the client to read.
#[cfg(target_arch = "wasm32")]
async fn buffer_body(response: Response) -> reqwest_middleware::Result<Response> {
    Ok(response)
}

/// Runs `work` unless the call is aborted first; `None` means aborted.
#[cfg(not(target_arch = "wasm32"))]
async fn until_aborted<F: Future>(abort: Option<&AbortSignal>, work: F) -> Option<F::Output> {
    match abort {
        Some(signal) => {
            tokio::select! {
                _ = signal.0.cancelled() => None,
                output = work => Some(output),
            }
        }
        None => Some(work.await),
    }
}

/// WASM: there is no tokio runtime to race on, so an abort is observed once
/// `work` completes and its output is discarded.
#[cfg(target_arch = "wasm32")]
async fn until_aborted<F: Future>(abort: Option<&AbortSignal>, work: F) -> Option<F::Output> {
    let output = work.await;
    (!abort.is_some_and(AbortSignal::is_aborted)).then_some(output)
}

/// Builds the middleware stack in front of `http`.
pub(crate) fn build_pipeline(
    http: reqwest::Client,
    options: &ClientOptions,
) -> ClientWithMiddleware {
    ClientBuilder::new(http)
        .with(RetryMiddleware::new(
            options.max_retries,
            options.retry_base_delay(),
        ))
        .with(LoggingMiddleware::new(options.log_bodies))
        .build()
}

/// Linear backoff: the delay before retry `retry` (1-based).
pub fn backoff_delay(base: Duration, retry: usize) -> Duration {
    base.saturating_mul(u32::try_from(retry).unwrap_or(u32::MAX))
}

/// Only `503 Service Unavailable` is retried; every other status is final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
}

fn is_retryable_error(err: &Error) -> bool {
    match err {
        Error::Reqwest(err) => is_retryable_transport(err),
        _ => false,
    }
}

/// Timeouts and failures where no response arrived. Builder errors are fatal.
pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
    if err.is_builder() {
        return false;
    }
    err.is_timeout()
        || err.is_request()
        // is_connect() is not available on wasm32 targets (no TCP)
        || {
            #[cfg(not(target_arch = "wasm32"))]
            { err.is_connect() }
            #[cfg(target_arch = "wasm32")]
            { false }
        }
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// WASM: no tokio timer, so the delay goes through the global `setTimeout`.
#[cfg(target_arch = "wasm32")]
async fn sleep(delay: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let set_timeout = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        match set_timeout {
            Some(set_timeout) => {
                let _ = set_timeout.call2(&JsValue::NULL, &resolve, &JsValue::from(millis));
            }
            None => {
                let _ = resolve.call0(&JsValue::NULL);
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
