use anyhow::Result;
use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::config::GatewayConfig;

const SERVICE_NAME: &str = "akave-gateway";

pub fn get_env_filter() -> tracing_subscriber::EnvFilter {
    // RUST_LOG used to control logging level.
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default()
            .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
    })
}

pub fn get_log_layer<S>(config: &GatewayConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    S: tracing::Subscriber,
{
    if config.structured_logging() {
        return Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_list(false)
                .flatten_event(true),
        );
    }

    Box::new(tracing_subscriber::fmt::layer().compact())
}

pub fn setup_tracing(config: &GatewayConfig) -> Result<Option<SdkTracerProvider>> {
    let registry = tracing_subscriber::Registry::default()
        .with(get_log_layer(config).with_filter(get_env_filter()));

    let tracer_provider = if config.telemetry.enable_tracing {
        Some(build_tracer_provider(config)?)
    } else {
        None
    };
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    if let Err(e) = tracing::subscriber::set_global_default(registry.with(otel_layer)) {
        error!("logger was already initiated, continuing: {:?}", e);
    }
    if let Some(provider) = &tracer_provider {
        global::set_tracer_provider(provider.clone());
    }
    Ok(tracer_provider)
}

/// Batch span export over OTLP/gRPC, tagged with the gateway's service name.
fn build_tracer_provider(config: &GatewayConfig) -> Result<SdkTracerProvider> {
    let mut span_exporter = SpanExporter::builder().with_tonic();
    if let Some(endpoint) = &config.telemetry.endpoint {
        span_exporter = span_exporter.with_endpoint(endpoint.clone());
    }

    Ok(SdkTracerProvider::builder()
        .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
        .with_batch_exporter(span_exporter.build()?)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_disabled_returns_no_provider() {
        let config = GatewayConfig::default();
        assert!(setup_tracing(&config).unwrap().is_none());
        // a second install only logs, it does not fail
        assert!(setup_tracing(&config).unwrap().is_none());
    }
}
