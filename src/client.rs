use std::fmt;

use http::Extensions;
use reqwest::{header::HeaderMap, Method, Response, Url};
use reqwest_middleware::ClientWithMiddleware;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, error};

use crate::{
    config::{resolve_base_url, ApiConfig, ExecutionContext},
    error::AbortedMarker,
    headers::{apply_default_headers, default_headers},
    middleware::{build_pipeline, AbortSignal},
    ApiEnvelope, ClientOptions, FetchError, RequestOptions, Result,
};

/// REST client with a fixed base URL, default headers and a retry pipeline.
#[derive(Clone)]
pub struct ApiClient {
    transport: reqwest::Client,
    pipeline: ClientWithMiddleware,
    base_url: String,
    default_headers: HeaderMap,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` with default headers and options.
    pub fn new(base_url: impl Into<String>) -> Self {
        let transport = reqwest::Client::new();
        let options = ClientOptions::default();
        Self {
            pipeline: build_pipeline(transport.clone(), &options),
            transport,
            base_url: base_url.into(),
            default_headers: default_headers(None).unwrap_or_default(),
            options,
        }
    }

    /// Creates a client from loaded configuration.
    ///
    /// The base URL is picked by [`resolve_base_url`]; timeout, body logging
    /// and `Accept-Language` come from `config`.
    pub fn from_config(config: &ApiConfig, context: ExecutionContext) -> Result<Self> {
        let options = ClientOptions {
            timeout_ms: config.timeout_ms,
            log_bodies: config.debug,
            ..ClientOptions::default()
        };
        let client = Self::new(resolve_base_url(context, config))
            .with_accept_language(config.accept_language.as_deref())?
            .with_options(options);

        debug!(
            base_url = %client.base_url,
            environment = config.environment.as_str(),
            ?context,
            "api client configured"
        );
        Ok(client)
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ApiConfig::from_env`] for the variables read.
    ///
    /// **Not available on `wasm32` targets.**
    ///
    /// # Example
    ///
    /// ```no_run
    /// use resilient_fetch::ApiClient;
    ///
    /// let api = ApiClient::from_env().expect("missing API_URL");
    /// ```
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        let config = ApiConfig::from_env()?;
        Self::from_config(&config, ExecutionContext::current())
    }

    /// Applies timeout, retry and logging options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.pipeline = build_pipeline(self.transport.clone(), &opts);
        self.options = opts;
        self
    }

    /// Sets or clears the default `Accept-Language` header.
    pub fn with_accept_language(mut self, language: Option<&str>) -> Result<Self> {
        self.default_headers = default_headers(language)?;
        Ok(self)
    }

    /// Base URL every relative request path is joined to. May be empty.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Timeout, retry and logging options in effect.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends a request and returns the decoded response body.
    ///
    /// Status and headers are not exposed. Failures are logged, then
    /// returned as a normalized [`FetchError`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
    ) -> Result<T> {
        let body = self.send(path, opts).await?;
        serde_json::from_str(&body).map_err(|err| {
            error!(%path, error = %err, "response body could not be decoded");
            FetchError::Decode(format!("invalid response JSON for {path}: {err}"))
        })
    }

    /// Sends a `GET` request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(path, RequestOptions::get()).await
    }

    /// Sends a `POST` request with a JSON body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(path, RequestOptions::post().json(body)?).await
    }

    /// Sends a request whose response is an [`ApiEnvelope`] and unwraps it.
    pub async fn request_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
    ) -> Result<T> {
        self.request::<ApiEnvelope<T>>(path, opts).await?.unwrap()
    }

    async fn send(&self, path: &str, opts: RequestOptions) -> Result<String> {
        let RequestOptions {
            method,
            mut headers,
            query,
            body,
            timeout,
            abort,
        } = opts;

        let url = self.build_url(path, &query)?;
        apply_default_headers(&mut headers, &self.default_headers);

        let mut builder = self
            .transport
            .request(method.clone(), url)
            .headers(headers)
            .timeout(timeout.unwrap_or_else(|| self.options.timeout()));
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build().map_err(|err| {
            let err = FetchError::Config(format!("invalid request for {path}: {err}"));
            error!(%method, %path, error = %err, "request could not be built");
            err
        })?;

        let mut extensions = Extensions::new();
        if let Some(token) = abort {
            extensions.insert(AbortSignal(token));
        }

        match self.pipeline.execute_with_extensions(request, &mut extensions).await {
            Ok(response) => self.read_response(&method, path, response).await,
            Err(err) => {
                let err = pipeline_error(err);
                if matches!(err, FetchError::Aborted) {
                    debug!(%method, %path, "request aborted");
                } else {
                    error!(%method, %path, error = %err, "API error");
                }
                Err(err)
            }
        }
    }

    async fn read_response(
        &self,
        method: &Method,
        path: &str,
        response: Response,
    ) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            let err = FetchError::network(err);
            error!(%method, %path, error = %err, "response body could not be read");
            err
        })?;

        if self.options.log_bodies {
            debug!(%method, %path, status = status.as_u16(), %body, "response body");
        }

        if !status.is_success() {
            let err = FetchError::Http {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            };
            error!(%method, %path, status = status.as_u16(), error = %err, "API error");
            return Err(err);
        }

        Ok(body)
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let raw = if is_absolute(path) {
            path.to_owned()
        } else if self.base_url.trim().is_empty() {
            let err = FetchError::Config(format!(
                "base URL is not configured; cannot request {path}"
            ));
            error!(%path, error = %err, "configuration error");
            return Err(err);
        } else {
            join_url(&self.base_url, path)
        };

        let mut url = Url::parse(&raw).map_err(|err| {
            let err = FetchError::Config(format!(
                "base URL '{}' does not form an absolute URL with {path}: {err}",
                self.base_url
            ));
            error!(%path, error = %err, "configuration error");
            err
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

/// Maps a pipeline failure onto the error taxonomy.
fn pipeline_error(err: reqwest_middleware::Error) -> FetchError {
    match err {
        reqwest_middleware::Error::Reqwest(err) => FetchError::network(err),
        reqwest_middleware::Error::Middleware(err) => {
            if err.downcast_ref::<AbortedMarker>().is_some() {
                FetchError::Aborted
            } else {
                FetchError::Middleware(format!("{err:#}"))
            }
        }
    }
}

fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Joins a base URL and a path with exactly one `/` between them.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{path}")
    }
}

/// Prefers a server-supplied `message` field over a generic status text.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(JsonValue::as_str)
                .filter(|message| !message.trim().is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("Request failed with status code {status}"))
}
