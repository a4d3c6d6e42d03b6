use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};

use crate::{FetchError, Result};

/// Builds the headers sent with every request.
///
/// `Accept-Language` is only present when a non-empty value is configured.
pub fn default_headers(accept_language: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    if let Some(language) = accept_language.map(str::trim).filter(|value| !value.is_empty()) {
        let value = HeaderValue::from_str(language).map_err(|err| {
            FetchError::Config(format!("invalid Accept-Language value '{language}': {err}"))
        })?;
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    Ok(headers)
}

/// Adds every default header whose name the request does not already carry.
pub fn apply_default_headers(explicit: &mut HeaderMap, defaults: &HeaderMap) {
    for (name, value) in defaults {
        if !explicit.contains_key(name) {
            explicit.insert(name.clone(), value.clone());
        }
    }
}
