//! reqwest plumbing shared by the query service and the record sink

use std::time::Duration;

use patchlog_common::api::ErrorResponse;

const USER_AGENT: &str = concat!("patchlog/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Join a base URL and an absolute path without doubling the slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Extract `(code, message)` from a non-success response
///
/// Falls back to the raw body text when it is not the store's error envelope.
pub(crate) async fn read_error(response: reqwest::Response) -> (String, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                text
            };
            (status.as_u16().to_string(), message)
        }
    }
}
