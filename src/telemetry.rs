//! Shared telemetry bootstrap for Poll Position binaries.
//!
//! Installs a `tracing` subscriber and OpenTelemetry tracer/meter providers,
//! exporting over OTLP/HTTP when an endpoint is configured. Settings come
//! from the standard `OTEL_*` variables plus:
//!
//! - POLL_POSITION_TELEMETRY_ENABLED: force OTLP export on or off
//! - POLL_POSITION_TELEMETRY_RUN_ID: tag every signal with a run identifier
//! - POLL_POSITION_LOG_FORMAT: "json" (default) or "text"

use crate::{Error, Result};

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::{self, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;
use std::collections::BTreeMap;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAMESPACE: &str = "poll-position";

/// Whether signals leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryMode {
    Disabled,
    Otlp,
}

impl TelemetryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryMode::Disabled => "disabled",
            TelemetryMode::Otlp => "otlp",
        }
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Telemetry settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub mode: TelemetryMode,
    pub log_format: LogFormat,
    pub service_name: String,
    pub otlp_endpoint: Option<String>,
    pub run_id: Option<String>,
    pub resource_attributes: Vec<KeyValue>,
    sampler: Sampler,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Result<Self> {
        let service_name = env_value("OTEL_SERVICE_NAME")
            .unwrap_or_else(|| default_service_name.to_string());
        if service_name.is_empty() {
            return Err(Error::Config("OTEL_SERVICE_NAME cannot be empty".to_string()));
        }

        let otlp_endpoint = env_value("OTEL_EXPORTER_OTLP_ENDPOINT");
        let mode = resolve_mode(
            parse_flag("POLL_POSITION_TELEMETRY_ENABLED", env_value("POLL_POSITION_TELEMETRY_ENABLED"))?,
            otlp_endpoint.is_some(),
        )?;

        let log_format = match env_value("POLL_POSITION_LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("text") => LogFormat::Text,
            Some(other) => {
                return Err(Error::Config(format!(
                    "POLL_POSITION_LOG_FORMAT must be json or text, got '{other}'"
                )))
            }
        };

        let sampler = parse_sampler(
            env_value("OTEL_TRACES_SAMPLER").as_deref().unwrap_or("parentbased_always_on"),
            env_value("OTEL_TRACES_SAMPLER_ARG").as_deref(),
        )?;

        let run_id = env_value("POLL_POSITION_TELEMETRY_RUN_ID");

        let mut attributes: BTreeMap<String, String> = match env_value("OTEL_RESOURCE_ATTRIBUTES") {
            Some(raw) => parse_resource_attributes(&raw)?.into_iter().collect(),
            None => BTreeMap::new(),
        };
        attributes.insert("service.name".to_string(), service_name.clone());
        attributes
            .entry("service.namespace".to_string())
            .or_insert_with(|| SERVICE_NAMESPACE.to_string());
        if let Some(run_id) = &run_id {
            attributes.insert("poll_position.run_id".to_string(), run_id.clone());
        }

        Ok(Self {
            mode,
            log_format,
            service_name,
            otlp_endpoint,
            run_id,
            resource_attributes: attributes
                .into_iter()
                .map(|(key, value)| KeyValue::new(key, value))
                .collect(),
            sampler,
        })
    }
}

/// Flushes and shuts down the SDK providers when dropped.
pub struct Telemetry {
    meter_provider: SdkMeterProvider,
    exporting: bool,
}

impl Telemetry {
    /// Install the subscriber and SDK providers for one binary.
    ///
    /// In OTLP mode spans leave the process through a batch exporter and a
    /// `tracing` bridge layer, and metrics through a periodic reader. The
    /// exporters take their endpoint from `OTEL_EXPORTER_OTLP_ENDPOINT`.
    /// When disabled, instruments still work but record into nothing.
    pub fn init_for_component(default_service_name: &str, log_level: &str) -> Result<Self> {
        let config = TelemetryConfig::from_env(default_service_name)?;
        let level = LevelFilter::from_level(parse_log_level(log_level)?);
        let resource = Resource::default().merge(&Resource::new(config.resource_attributes.clone()));

        let (tracer_provider, meter_provider) = match config.mode {
            TelemetryMode::Otlp => (
                Some(otlp_tracer_provider(&config, resource.clone())?),
                otlp_meter_provider(resource)?,
            ),
            TelemetryMode::Disabled => (
                None,
                SdkMeterProvider::builder().with_resource(resource).build(),
            ),
        };

        let otel_layer = tracer_provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
        });
        let registry = tracing_subscriber::registry().with(level).with(otel_layer);
        let installed = match config.log_format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(true).with_thread_ids(true))
                .try_init(),
            LogFormat::Text => registry
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .try_init(),
        };
        installed.map_err(|e| Error::Config(format!("failed to initialize log subscriber: {e}")))?;

        let exporting = tracer_provider.is_some();
        if let Some(provider) = tracer_provider {
            global::set_tracer_provider(provider);
        }
        global::set_meter_provider(meter_provider.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());

        info!(
            service_name = %config.service_name,
            telemetry_mode = config.mode.as_str(),
            otlp_endpoint = %config.otlp_endpoint.as_deref().unwrap_or("none"),
            run_id = %config.run_id.as_deref().unwrap_or("none"),
            "Telemetry bootstrap initialized"
        );

        Ok(Self {
            meter_provider,
            exporting,
        })
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        let _ = self.meter_provider.shutdown();
        if self.exporting {
            global::shutdown_tracer_provider();
        }
    }
}

fn otlp_tracer_provider(config: &TelemetryConfig, resource: Resource) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .build()
        .map_err(|e| Error::Config(format!("failed to build OTLP span exporter: {e}")))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            trace::Config::default()
                .with_sampler(config.sampler.clone())
                .with_resource(resource),
        )
        .build())
}

fn otlp_meter_provider(resource: Resource) -> Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .build()
        .map_err(|e| Error::Config(format!("failed to build OTLP metric exporter: {e}")))?;

    let reader = PeriodicReader::builder(exporter, runtime::Tokio).build();
    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_mode(enabled: Option<bool>, has_endpoint: bool) -> Result<TelemetryMode> {
    match (enabled, has_endpoint) {
        (Some(false), _) | (None, false) => Ok(TelemetryMode::Disabled),
        (Some(true), true) | (None, true) => Ok(TelemetryMode::Otlp),
        (Some(true), false) => Err(Error::Config(
            "POLL_POSITION_TELEMETRY_ENABLED=true requires OTEL_EXPORTER_OTLP_ENDPOINT".to_string(),
        )),
    }
}

fn parse_flag(name: &str, raw: Option<String>) -> Result<Option<bool>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::Config(format!("{name} must be a boolean, got '{raw}'"))),
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    raw.trim().parse::<Level>().map_err(|_| {
        Error::Config(format!(
            "invalid log level '{raw}', expected one of [trace, debug, info, warn, error]"
        ))
    })
}

fn parse_sampler(name: &str, arg: Option<&str>) -> Result<Sampler> {
    let ratio = || -> Result<f64> {
        let raw = arg.ok_or_else(|| {
            Error::Config("OTEL_TRACES_SAMPLER_ARG is required for ratio samplers".to_string())
        })?;
        match raw.trim().parse::<f64>() {
            Ok(value) if (0.0..=1.0).contains(&value) => Ok(value),
            _ => Err(Error::Config(format!(
                "OTEL_TRACES_SAMPLER_ARG must be a float in [0,1], got '{raw}'"
            ))),
        }
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "always_on" => Ok(Sampler::AlwaysOn),
        "always_off" => Ok(Sampler::AlwaysOff),
        "traceidratio" => Ok(Sampler::TraceIdRatioBased(ratio()?)),
        "parentbased_always_on" => Ok(Sampler::ParentBased(Box::new(Sampler::AlwaysOn))),
        "parentbased_always_off" => Ok(Sampler::ParentBased(Box::new(Sampler::AlwaysOff))),
        "parentbased_traceidratio" => Ok(Sampler::ParentBased(Box::new(
            Sampler::TraceIdRatioBased(ratio()?),
        ))),
        other => Err(Error::Config(format!("OTEL_TRACES_SAMPLER '{other}' is not supported"))),
    }
}

fn parse_resource_attributes(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::Config(format!(
                    "OTEL_RESOURCE_ATTRIBUTES entry '{pair}' is invalid, expected key=value"
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config(
                    "OTEL_RESOURCE_ATTRIBUTES contains an empty attribute key".to_string(),
                ));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
