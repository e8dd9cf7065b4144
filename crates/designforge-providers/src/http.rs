//! Shared HTTP plumbing: client construction, status classification and
//! image download.

use std::time::Duration;

use designforge_core::{ProviderError, ProviderKind};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

const USER_AGENT: &str = concat!("designforge/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt carried in an error message.
const MAX_ERROR_BODY: usize = 512;

pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Map a non-success HTTP status to the matching provider error.
pub fn classify_status(provider: ProviderKind, status: StatusCode, body: &str) -> ProviderError {
    let message = format!("HTTP {}: {}", status.as_u16(), excerpt(body));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication { provider, message }
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider, message },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::InvalidParameters { provider, message }
        }
        _ => ProviderError::Upstream { provider, message },
    }
}

pub fn transport_error(provider: ProviderKind, err: reqwest::Error) -> ProviderError {
    ProviderError::Network {
        provider,
        message: err.to_string(),
    }
}

pub fn upstream(provider: ProviderKind, message: impl Into<String>) -> ProviderError {
    ProviderError::Upstream {
        provider,
        message: message.into(),
    }
}

/// Turn a non-`expected` response into an error, otherwise pass it through.
pub async fn expect_status(
    provider: ProviderKind,
    response: Response,
    expected: impl Fn(StatusCode) -> bool,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if expected(status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(provider, status, &body))
}

/// Decode a successful JSON response body.
pub async fn read_json<T: DeserializeOwned>(
    provider: ProviderKind,
    response: Response,
) -> Result<T, ProviderError> {
    let response = expect_status(provider, response, |s| s.is_success()).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(provider, e))?;
    serde_json::from_slice(&bytes).map_err(|e| upstream(provider, format!("malformed response: {e}")))
}

/// Fetch the generated image bytes from `url`.
pub async fn download_image(
    client: &Client,
    provider: ProviderKind,
    url: &str,
) -> Result<Vec<u8>, ProviderError> {
    debug!(provider = %provider, url = %url, "downloading generated image");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(upstream(
            provider,
            format!("failed to download image: HTTP {}", status.as_u16()),
        ));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(provider, e))?;
    if bytes.is_empty() {
        return Err(upstream(provider, "downloaded image is empty"));
    }
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use designforge_core::FailureKind;

    #[test]
    fn status_mapping() {
        let cases = [
            (401, FailureKind::Authentication),
            (403, FailureKind::Authentication),
            (429, FailureKind::RateLimited),
            (400, FailureKind::InvalidParameters),
            (422, FailureKind::InvalidParameters),
            (500, FailureKind::Upstream),
            (502, FailureKind::Upstream),
            (404, FailureKind::Upstream),
        ];
        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify_status(ProviderKind::Fal, status, "x").kind(), kind, "{code}");
        }
    }

    #[test]
    fn message_carries_status_and_trimmed_body() {
        let err = classify_status(ProviderKind::Bria, StatusCode::UNAUTHORIZED, "  bad token \n");
        assert!(err.to_string().contains("HTTP 401: bad token"));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(600);
        let short = excerpt(&body);
        assert!(short.len() <= MAX_ERROR_BODY + 3);
        assert!(short.ends_with("..."));
    }
}
