//! Metrics for provider API calls.
//!
//! Provides OpenTelemetry-based metrics for tracking provider latency,
//! errors and token usage across every adapter.

use folio_error::{FolioError, FolioErrorKind, ProviderErrorKind};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Metrics for provider API interactions.
///
/// Labeled with provider name and model.
#[derive(Clone)]
pub struct LlmMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Total provider requests
    pub requests: Counter<u64>,
    /// Failed provider requests
    pub errors: Counter<u64>,
    /// Provider call duration in seconds
    pub duration: Histogram<f64>,
    /// Prompt tokens reported by providers
    pub prompt_tokens: Counter<u64>,
    /// Completion tokens reported by providers
    pub completion_tokens: Counter<u64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("folio_llm");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("llm.requests")
                .with_description("Total provider API requests")
                .build(),
            errors: meter
                .u64_counter("llm.errors")
                .with_description("Failed provider API requests")
                .build(),
            duration: meter
                .f64_histogram("llm.duration")
                .with_unit("seconds")
                .with_description("Provider API call duration")
                .build(),
            prompt_tokens: meter
                .u64_counter("llm.tokens.prompt")
                .with_description("Prompt tokens used")
                .build(),
            completion_tokens: meter
                .u64_counter("llm.tokens.completion")
                .with_description("Completion tokens used")
                .build(),
        }
    }

    /// Get the global metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful request.
    pub fn record_request(&self, provider: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed request.
    pub fn record_error(&self, provider: &str, model: &str, error_type: &'static str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_type", error_type),
        ];
        self.errors.add(1, labels);
    }

    /// Record provider-reported token usage.
    pub fn record_tokens(&self, provider: &str, model: &str, prompt: u64, completion: u64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.prompt_tokens.add(prompt, labels);
        self.completion_tokens.add(completion, labels);
    }
}

/// Classify an error for metrics labeling.
///
/// Returns one of: "rate_limit", "auth", "network", "timeout",
/// "invalid_request", "malformed", "unknown".
pub fn classify_error(error: &FolioError) -> &'static str {
    let FolioErrorKind::Provider(provider_err) = error.kind() else {
        return "unknown";
    };

    match &provider_err.kind {
        ProviderErrorKind::Http { status: 429, .. } => "rate_limit",
        ProviderErrorKind::Http {
            status: 401 | 403, ..
        }
        | ProviderErrorKind::MissingApiKey(_) => "auth",
        ProviderErrorKind::Http {
            status: 400 | 404 | 422,
            ..
        } => "invalid_request",
        ProviderErrorKind::Http { status: 408, .. } | ProviderErrorKind::PollTimeout { .. } => {
            "timeout"
        }
        ProviderErrorKind::Transient(message) if message.to_lowercase().contains("timed out") => {
            "timeout"
        }
        ProviderErrorKind::Transient(_) => "network",
        ProviderErrorKind::Malformed(_) => "malformed",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_error::{ConfigError, ProviderError};

    #[test]
    fn test_classify_provider_errors() {
        let err: FolioError = ProviderError::new(
            "groq",
            ProviderErrorKind::Http {
                status: 429,
                message: "slow down".into(),
            },
        )
        .into();
        assert_eq!(classify_error(&err), "rate_limit");

        let err: FolioError = ProviderError::transient("groq", "operation timed out").into();
        assert_eq!(classify_error(&err), "timeout");

        let err: FolioError = ProviderError::malformed("groq", "empty").into();
        assert_eq!(classify_error(&err), "malformed");
    }

    #[test]
    fn test_classify_other_errors() {
        let err: FolioError = ConfigError::new("bad").into();
        assert_eq!(classify_error(&err), "unknown");
    }
}
