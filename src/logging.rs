//! Logging and OTEL related thingies

use std::time::Duration;

use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::attribute::SERVICE_VERSION;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

use crate::error::ZipApiError;

const SERVICE_NAME: &str = "zipapi";

/// Crates that only matter when something is badly wrong with them
const QUIET_TARGETS: [(&str, &str); 6] = [
    ("h2", "error"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("tower", "error"),
    ("rustls", "warn"),
    ("sqlx", "warn"),
];

/// The configured level for everything, with [QUIET_TARGETS] clamped.
///
/// Built from the config only, `RUST_LOG` is ignored.
pub(crate) fn build_loglevel_filter_layer(log_level: &str) -> EnvFilter {
    let filter_string = QUIET_TARGETS
        .iter()
        .fold(log_level.to_string(), |acc, (target, level)| {
            format!("{acc},{target}={level}")
        });
    EnvFilter::builder().parse_lossy(filter_string)
}

/// Compact text while developing, JSON in release builds
fn build_logger_text<S>() -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    use tracing_subscriber::fmt::format::FmtSpan;
    if cfg!(debug_assertions) {
        Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_line_number(false)
                .with_thread_names(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
    }
}

/// Install the global subscriber, with an OTLP exporter if there's an endpoint.
///
/// Hang on to the returned provider and call `shutdown` on it before exiting,
/// otherwise the last batch of spans is lost.
pub fn init_otel_subscribers(
    otel_endpoint: Option<String>,
    config_log_level: &str,
    cli_debug: bool,
) -> Result<Option<SdkTracerProvider>, ZipApiError> {
    let log_level = match (cli_debug, config_log_level) {
        (true, _) => "debug",
        (_, log_level) => log_level,
    };

    let subscriber = tracing_subscriber::registry()
        .with(build_loglevel_filter_layer(log_level))
        .with(build_logger_text());

    match otel_endpoint {
        Some(endpoint) => {
            let resource = Resource::builder()
                .with_service_name(SERVICE_NAME)
                .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
                .build();

            let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .with_timeout(Duration::from_secs(5))
                .build()
                .map_err(|err| ZipApiError::StartupError(err.to_string()))?;

            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(otlp_exporter)
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(resource)
                .build();

            global::set_tracer_provider(provider.clone());
            let subscriber =
                subscriber.with(OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)));
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| ZipApiError::StartupError(err.to_string()))?;
            Ok(Some(provider))
        }
        None => {
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| ZipApiError::StartupError(err.to_string()))?;
            Ok(None)
        }
    }
}
