/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-success HTTP status after the retry stage gave up or declined to retry.
    #[error("API Error: {status} - {message}")]
    Http {
        status: u16,
        /// Server-supplied `message` field, or a generic status description.
        message: String,
    },
    /// No response was received (timeout, connect or send failure).
    #[error("API Error: Network - {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a result envelope whose code is not success.
    #[error("domain error {code}: {message}")]
    Domain { code: i64, message: String },
    /// Missing or invalid configuration such as an unset base URL.
    #[error("configuration error: {0}")]
    Config(String),
    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// A pipeline stage failed for a reason other than transport or abort.
    #[error("middleware error: {0}")]
    Middleware(String),
    /// The caller cancelled the request before it completed.
    #[error("request aborted")]
    Aborted,
}

impl FetchError {
    /// HTTP status of the response that caused this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure belongs to the class the retry stage re-attempts.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 503,
            Self::Network { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn network(source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            format!("timeout: {source}")
        } else {
            source.to_string()
        };
        Self::Network { message, source }
    }
}

/// Marker carried through the middleware error channel when a call is cancelled.
#[derive(Debug, thiserror::Error)]
#[error("request aborted")]
pub(crate) struct AbortedMarker;

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn http_error_message_includes_status() {
        let err = FetchError::Http {
            status: 404,
            message: "user not found".to_owned(),
        };
        assert_eq!(err.to_string(), "API Error: 404 - user not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[test]
    fn service_unavailable_is_retryable() {
        let err = FetchError::Http {
            status: 503,
            message: "maintenance".to_owned(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn domain_and_config_errors_have_no_status() {
        let domain = FetchError::Domain {
            code: 500,
            message: "lookup failed".to_owned(),
        };
        assert_eq!(domain.status(), None);
        assert!(!domain.is_retryable());
        assert_eq!(
            FetchError::Config("base URL is not configured".to_owned()).to_string(),
            "configuration error: base URL is not configured"
        );
    }
}
