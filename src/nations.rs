//! Nation lookups. These endpoints wrap their payload in an [`ApiEnvelope`].

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{ApiClient, ApiEnvelope, RequestOptions, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    /// ISO 3166-1 alpha-3 code.
    pub alp3_natn_code: String,
    /// ISO 3166-1 alpha-2 code.
    pub alp2_natn_code: String,
    /// International dialing prefix.
    pub natn_intc_no: String,
    pub natn_nm: String,
    pub abrv: String,
}

/// Filters for [`get_nation_list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NationListParams {
    pub keyword: Option<String>,
}

/// `GET /common/search/nations`
///
/// Never fails: any error is logged and an empty list is returned, so
/// callers can render a select box even when the lookup is down.
pub async fn get_nations(client: &ApiClient) -> Vec<Nation> {
    let outcome = client
        .request::<ApiEnvelope<Option<Vec<Nation>>>>(
            "/common/search/nations",
            RequestOptions::get(),
        )
        .await;

    match outcome {
        Ok(envelope) => envelope.result.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "nation search failed; using an empty list");
            Vec::new()
        }
    }
}

/// `GET /common/nation/list`, optionally filtered by `keyword`.
pub async fn get_nation_list(client: &ApiClient, params: &NationListParams) -> Result<Vec<Nation>> {
    let mut opts = RequestOptions::get();
    if let Some(keyword) = params.keyword.as_deref().filter(|keyword| !keyword.is_empty()) {
        opts = opts.query("keyword", keyword);
    }

    fetch_nations(client, "/common/nation/list", opts, "failed to load the nation list").await
}

/// `GET /common/nation/frequent`
pub async fn get_frequent_nations(client: &ApiClient) -> Result<Vec<Nation>> {
    fetch_nations(
        client,
        "/common/nation/frequent",
        RequestOptions::get(),
        "failed to load frequently used nations",
    )
    .await
}

async fn fetch_nations(
    client: &ApiClient,
    path: &str,
    opts: RequestOptions,
    fallback: &str,
) -> Result<Vec<Nation>> {
    let envelope = client
        .request::<ApiEnvelope<Option<Vec<Nation>>>>(path, opts)
        .await
        .map_err(|err| {
            error!(%path, error = %err, "nation request failed");
            err
        })?;

    Ok(envelope.unwrap_or_message(fallback)?.unwrap_or_default())
}
