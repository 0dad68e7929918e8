//! Request plumbing shared by the HTTP providers

use graphrag_core::LlmError;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Send a request and decode a JSON body, mapping transport and status
/// failures onto [`LlmError`]
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, LlmError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(provider, e, timeout))?;

    let response = check_status(provider, response).await?;

    response
        .json::<T>()
        .await
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse {} response: {}", provider, e)))
}

async fn check_status(provider: &str, response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = format!("{} API error ({}): {}", provider, status, error_text.trim());

    // rate limits and server errors are worth retrying
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(LlmError::Unavailable(message))
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(LlmError::ConfigError(message))
    } else {
        Err(LlmError::InvalidResponse(message))
    }
}

fn transport_error(provider: &str, error: reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(timeout.as_secs())
    } else if error.is_connect() {
        LlmError::Unavailable(format!("{} unreachable: {}", provider, error))
    } else {
        LlmError::HttpError(error.to_string())
    }
}

/// Join a base URL and a path without doubling the slash
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("http://localhost:11434/", "/api/embed"), "http://localhost:11434/api/embed");
        assert_eq!(endpoint("https://api.openai.com/v1", "embeddings"), "https://api.openai.com/v1/embeddings");
    }
}
