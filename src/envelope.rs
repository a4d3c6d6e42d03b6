use serde::{Deserialize, Serialize};

use crate::{FetchError, Result};

/// `resultCode` value that marks a successful envelope.
pub const SUCCESS_CODE: i64 = 200;

/// Message used when a failed envelope carries no `resultMessage`.
pub const DEFAULT_DOMAIN_ERROR: &str = "the API reported a failure without a message";

/// Result wrapper used by the backend.
///
/// The backend reports business failures inside an HTTP 200 response, so a
/// successful transport does not imply a successful call. Use
/// [`ApiEnvelope::unwrap`] to turn the envelope into the payload or a
/// [`FetchError::Domain`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub result_code: i64,
    #[serde(default)]
    pub result_message: String,
    pub result: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_sys_cntc_id: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.result_code == SUCCESS_CODE
    }

    /// Returns `result` unchanged on success, a domain error otherwise.
    pub fn unwrap(self) -> Result<T> {
        self.unwrap_or_message(DEFAULT_DOMAIN_ERROR)
    }

    /// Like [`ApiEnvelope::unwrap`], with a caller-chosen message for
    /// failures that carry no `resultMessage`.
    pub fn unwrap_or_message(self, fallback: &str) -> Result<T> {
        if self.is_success() {
            return Ok(self.result);
        }

        let message = if self.result_message.trim().is_empty() {
            fallback.to_owned()
        } else {
            self.result_message
        };
        tracing::error!(code = self.result_code, %message, "API returned a failed result");
        Err(FetchError::Domain {
            code: self.result_code,
            message,
        })
    }
}
