use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber: JSON fmt layer always, OTLP span
/// export only when an endpoint is configured. `RUST_LOG` overrides the
/// configured level.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    match otlp_endpoint {
        Some(endpoint) => {
            let otlp_exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            match opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(otlp_exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                ])))
                .install_batch(runtime::Tokio)
            {
                Ok(tracer) => {
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(tracing_opentelemetry::layer().with_tracer(tracer))
                        .with(
                            tracing_subscriber::fmt::layer()
                                .with_file(true)
                                .with_line_number(true)
                                .json()
                                .flatten_event(true),
                        )
                        .init();
                }
                Err(e) => {
                    eprintln!(
                        "Failed to initialize OTLP tracer for '{}' at '{}': {}; continuing with local logging only",
                        service_name, endpoint, e
                    );
                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(
                            tracing_subscriber::fmt::layer()
                                .with_file(true)
                                .with_line_number(true)
                                .json()
                                .flatten_event(true),
                        )
                        .init();
                }
            }
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_file(true)
                        .with_line_number(true)
                        .json()
                        .flatten_event(true),
                )
                .init();
        }
    }
}
