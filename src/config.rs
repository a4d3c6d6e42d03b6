//! Environment-driven configuration and base URL resolution.

use std::str::FromStr;

use crate::{FetchError, Result};

/// Default per-attempt timeout when `API_TIMEOUT` is unset or invalid.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Where the client runs.
///
/// Server-side callers have no rewrite proxy in front of them, so they may
/// need a different base URL than browser code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecutionContext {
    Server,
    Browser,
}

impl ExecutionContext {
    /// `Browser` on `wasm32` targets, `Server` everywhere else.
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Browser
        } else {
            Self::Server
        }
    }
}

/// Deployment environment, read from `APP_ENV`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(FetchError::Config(format!(
                "unknown APP_ENV value '{other}'"
            ))),
        }
    }
}

/// Values the client needs from the environment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ApiConfig {
    /// Public API base URL. May be a relative prefix meant for browser rewrites.
    pub public_base_url: String,
    /// Server-only upstream URL used by development servers instead of rewrites.
    pub proxy_target_url: Option<String>,
    pub accept_language: Option<String>,
    pub timeout_ms: u64,
    pub environment: Environment,
    /// Enables body logging.
    pub debug: bool,
}

impl ApiConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Reads:
    /// - `API_URL` — public base URL, required in a server context
    /// - `API_TIMEOUT` — per-attempt timeout in milliseconds
    /// - `API_ACCEPT_LANGUAGE` — optional `Accept-Language` header value
    /// - `API_TARGET_URL` — server-only proxy target
    /// - `APP_ENV` — `development`, `production` or `test`
    /// - `FEATURE_DEBUG` — `true` turns on body logging
    ///
    /// **Not available on `wasm32` targets** — there is no process
    /// environment in browser runtimes. Build an [`ApiConfig`] directly or
    /// use [`ApiConfig::from_lookup`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(ExecutionContext::current(), |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// In a server context a missing `API_URL` fails fast. In a browser
    /// context it silently defaults to an empty string, and `API_TARGET_URL`
    /// is never read.
    pub fn from_lookup<F>(context: ExecutionContext, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let public_base_url = match non_empty("API_URL") {
            Some(url) => url,
            None if context == ExecutionContext::Server => {
                return Err(FetchError::Config(
                    "required environment variable API_URL is not set".to_owned(),
                ));
            }
            None => String::new(),
        };

        let proxy_target_url = match context {
            ExecutionContext::Server => non_empty("API_TARGET_URL"),
            ExecutionContext::Browser => None,
        };

        let environment = match non_empty("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let timeout_ms = non_empty("API_TIMEOUT")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let debug = non_empty("FEATURE_DEBUG").is_some_and(|value| value == "true");

        Ok(Self {
            public_base_url,
            proxy_target_url,
            accept_language: non_empty("API_ACCEPT_LANGUAGE"),
            timeout_ms,
            environment,
            debug,
        })
    }
}

/// Picks the base URL for a client instance.
///
/// A development server prefers the proxy target so it can reach the
/// upstream API without same-origin rewrites. Everyone else uses the public
/// base URL, which may be empty when nothing is configured.
pub fn resolve_base_url(context: ExecutionContext, config: &ApiConfig) -> String {
    let proxy = config
        .proxy_target_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    match proxy {
        Some(url) if context == ExecutionContext::Server && config.environment.is_development() => {
            url.to_owned()
        }
        _ => config.public_base_url.clone(),
    }
}
