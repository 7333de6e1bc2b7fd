//! Shared HTTP plumbing for provider adapters.

use crate::{LlmMetrics, classify_error};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::error;

/// Send a request and decode a JSON body, recording call metrics.
///
/// Network failures are transient, non-success statuses keep their code and
/// undecodable bodies are malformed.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    model: &str,
    request: RequestBuilder,
) -> FolioResult<T> {
    let start = Instant::now();
    let result = fetch_json(provider, request).await;
    record(provider, model, start, &result);
    result
}

/// Send a request whose response body is irrelevant.
pub(crate) async fn send_unit(
    provider: &str,
    model: &str,
    request: RequestBuilder,
) -> FolioResult<()> {
    let start = Instant::now();
    let result = dispatch(provider, request).await.map(|_| ());
    record(provider, model, start, &result);
    result
}

async fn fetch_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> FolioResult<T> {
    let response = dispatch(provider, request).await?;
    let body = response.text().await.map_err(|e| {
        ProviderError::transient(provider, format!("Failed to read response body: {}", e))
    })?;
    let value = serde_json::from_str(&body).map_err(|e| {
        error!(provider, error = %e, "Failed to parse response");
        ProviderError::malformed(provider, format!("Failed to parse response: {}", e))
    })?;
    Ok(value)
}

async fn dispatch(provider: &str, request: RequestBuilder) -> FolioResult<Response> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = ?e, "HTTP request failed");
        ProviderError::transient(provider, format!("Request failed: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(provider, status = %status, body = %body, "API returned error");
        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::Http {
                status: status.as_u16(),
                message: body,
            },
        )
        .into());
    }

    Ok(response)
}

fn record<T>(provider: &str, model: &str, start: Instant, result: &FolioResult<T>) {
    let metrics = LlmMetrics::get();
    match result {
        Ok(_) => metrics.record_request(provider, model, start.elapsed().as_secs_f64()),
        Err(e) => metrics.record_error(provider, model, classify_error(e)),
    }
}

/// Trim a reply and reject it when nothing is left.
pub(crate) fn non_empty(provider: &str, text: String) -> FolioResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ProviderError::malformed(provider, "empty completion").into())
    } else {
        Ok(trimmed.to_string())
    }
}
