//! Logging and optional OpenTelemetry setup for the binary.

use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter used when `RUST_LOG` is unset (e.g. "info", "debug")
    pub log_level: String,
    /// Emit JSON log lines instead of text
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Create a new configuration with the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: false,
        }
    }

    /// Set the service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error>> {
        Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.log_level))?)
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        if self.json_logs {
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .boxed()
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Stdout is left to
/// the interactive menus.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.fmt_layer())
        .try_init()?;
    Ok(())
}

#[cfg(feature = "observability")]
pub use otel::{ObservabilityGuard, init_observability};

#[cfg(feature = "observability")]
mod otel {
    use super::ObservabilityConfig;
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    /// Keeps the exporters alive; flushes them on [`ObservabilityGuard::shutdown`].
    pub struct ObservabilityGuard {
        tracer_provider: SdkTracerProvider,
        meter_provider: SdkMeterProvider,
    }

    impl ObservabilityGuard {
        /// Flush pending spans and metrics.
        pub fn shutdown(self) {
            if let Err(e) = self.tracer_provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
            if let Err(e) = self.meter_provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }
    }

    /// Initialize logging bridged to OpenTelemetry.
    ///
    /// This sets up:
    /// - Tracing with OpenTelemetry bridge
    /// - Stdout span and metric exporters for development
    /// - Service name and version metadata
    /// - Configurable log format (text or JSON)
    pub fn init_observability(
        config: &ObservabilityConfig,
    ) -> Result<ObservabilityGuard, Box<dyn std::error::Error>> {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes(vec![KeyValue::new(
                "service.version",
                config.service_version.clone(),
            )])
            .build();

        let tracer_provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_resource(resource.clone())
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        // Provider call metrics are recorded on the global meter
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(opentelemetry_stdout::MetricExporter::default())
            .with_resource(resource)
            .build();
        global::set_meter_provider(meter_provider.clone());

        let tracer = tracer_provider.tracer(config.service_name.clone());
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        tracing_subscriber::registry()
            .with(config.env_filter()?)
            .with(config.fmt_layer())
            .with(otel_layer)
            .try_init()?;

        Ok(ObservabilityGuard {
            tracer_provider,
            meter_provider,
        })
    }
}
