use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::LookupError;

/// Send `request` and decode a successful JSON body.
///
/// `what` names the request in error messages ("geocode", "forecast", ...).
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T, LookupError> {
    let res = request
        .send()
        .await
        .map_err(|e| LookupError::Network(format!("{what} request failed: {e}")))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| LookupError::Network(format!("failed to read {what} body: {e}")))?;

    if !status.is_success() {
        return Err(LookupError::Http {
            status: status.as_u16(),
            message: format!("{what}: {}", truncate_body(&body)),
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| LookupError::InvalidResponse(format!("{what} payload: {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
