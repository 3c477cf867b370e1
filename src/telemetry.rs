//! Logging and metrics bootstrap for the report server.
//!
//! Logs go to stdout through a `tracing` fmt subscriber, JSON by default and
//! plain text when `METERVIEW_LOG_FORMAT=text`. Metric instruments register
//! against a global meter provider whose resource names this service.

use crate::{Error, Result};

use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::Resource;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(Error::Config(format!(
                "log format must be json or text, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub level: Level,
    pub format: LogFormat,
    /// Resource attributes, `service.*` keys last so they win on merge
    pub resource: Vec<KeyValue>,
}

impl TelemetryConfig {
    /// Environment variables:
    /// - OTEL_SERVICE_NAME: overrides `service_name`
    /// - OTEL_RESOURCE_ATTRIBUTES: extra `key=value` pairs, comma separated
    /// - METERVIEW_LOG_FORMAT: `json` (default) or `text`
    pub fn from_env(service_name: &str, log_level: &str) -> Result<Self> {
        Self::from_lookup(service_name, log_level, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: &str, log_level: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_name = lookup("OTEL_SERVICE_NAME")
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| service_name.to_string());
        if service_name.is_empty() {
            return Err(Error::Config("service name cannot be empty".to_string()));
        }

        let level = Level::from_str(log_level.trim()).map_err(|_| {
            Error::Config(format!(
                "invalid log level '{log_level}', expected trace, debug, info, warn or error"
            ))
        })?;
        let format = match lookup("METERVIEW_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::Json,
        };

        let mut resource: Vec<KeyValue> = match lookup("OTEL_RESOURCE_ATTRIBUTES") {
            Some(raw) => resource_pairs(&raw)?
                .into_iter()
                .filter(|(key, _)| *key != "service.name")
                .map(|(key, value)| KeyValue::new(key.to_string(), value.to_string()))
                .collect(),
            None => Vec::new(),
        };
        if !resource.iter().any(|kv| kv.key.as_str() == "service.namespace") {
            resource.push(KeyValue::new("service.namespace", "meterview"));
        }
        resource.push(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")));
        resource.push(KeyValue::new("service.name", service_name.clone()));

        Ok(Self {
            service_name,
            level,
            format,
            resource,
        })
    }
}

/// `key=value` pairs of an `OTEL_RESOURCE_ATTRIBUTES` string
fn resource_pairs(raw: &str) -> Result<Vec<(&str, &str)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
            _ => Err(Error::Config(format!(
                "OTEL_RESOURCE_ATTRIBUTES entry '{pair}' is not key=value"
            ))),
        })
        .collect()
}

/// Keeps the meter provider alive for the process lifetime.
pub struct Telemetry {
    config: TelemetryConfig,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Install the log subscriber and the global meter provider.
    pub fn init_for_component(service_name: &str, log_level: &str) -> Result<Self> {
        let config = TelemetryConfig::from_env(service_name, log_level)?;

        let builder = FmtSubscriber::builder()
            .with_max_level(config.level)
            .with_target(true);
        let installed = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.try_init(),
        };
        installed.map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))?;

        let resource = Resource::default().merge(&Resource::new(config.resource.clone()));
        let meter_provider = SdkMeterProvider::builder().with_resource(resource).build();
        global::set_meter_provider(meter_provider.clone());

        info!(
            service_name = %config.service_name,
            level = %config.level,
            format = ?config.format,
            "Telemetry initialized"
        );

        Ok(Self {
            config,
            meter_provider,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        let _ = self.meter_provider.shutdown();
    }
}
