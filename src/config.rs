//! Environment configuration and backend construction
//!
//! [`ServiceConfig`] is read from `METERVIEW_*` variables; the binary's CLI
//! flags override it. [`ComponentFactory`] builds the in-memory collaborators
//! and optionally seeds them from a JSON fixture file.

use crate::api::ApiServerConfig;
use crate::ingest::{LocalMetricsRepository, MetricRecord, MetricsRepository};
use crate::metadata::{LocalReportCatalog, Report, ReportCatalog, ReportQuery, ReportTable};
use crate::query::{LocalResultsStore, ReportResultsGetter};
use crate::render::{DEFAULT_PADDING, MAX_PADDING};
use crate::results::Row;
use crate::{Error, Result};

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Runtime settings for the report server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub max_body_size: usize,
    pub tsv_padding: usize,
    /// JSON file used to seed the in-memory backends
    pub fixtures: Option<PathBuf>,
    pub enable_cors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            max_body_size: 16 * 1024 * 1024,
            tsv_padding: DEFAULT_PADDING,
            fixtures: None,
            enable_cors: true,
        }
    }
}

impl ServiceConfig {
    /// Environment variables:
    /// - METERVIEW_HTTP_PORT: listen port (default: 8080)
    /// - METERVIEW_MAX_BODY_BYTES: request body limit (default: 16MiB)
    /// - METERVIEW_TSV_PADDING: default tab padding (default: 2)
    /// - METERVIEW_FIXTURES: fixture file path (optional)
    /// - METERVIEW_ENABLE_CORS: permissive CORS (default: true)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            http_port: parse_var(get("METERVIEW_HTTP_PORT"), "METERVIEW_HTTP_PORT")?
                .unwrap_or(defaults.http_port),
            max_body_size: parse_var(get("METERVIEW_MAX_BODY_BYTES"), "METERVIEW_MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_size),
            tsv_padding: parse_var(get("METERVIEW_TSV_PADDING"), "METERVIEW_TSV_PADDING")?
                .unwrap_or(defaults.tsv_padding),
            fixtures: get("METERVIEW_FIXTURES").map(PathBuf::from),
            enable_cors: match get("METERVIEW_ENABLE_CORS") {
                Some(raw) => parse_bool(&raw, "METERVIEW_ENABLE_CORS")?,
                None => defaults.enable_cors,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but are out of range.
    pub fn validate(&self) -> Result<()> {
        if self.tsv_padding > MAX_PADDING {
            return Err(Error::Config(format!(
                "tsv padding must be at most {MAX_PADDING}, got {}",
                self.tsv_padding
            )));
        }
        Ok(())
    }

    pub fn api_config(&self) -> ApiServerConfig {
        ApiServerConfig {
            http_port: self.http_port,
            max_body_size: self.max_body_size,
            enable_cors: self.enable_cors,
            default_padding: self.tsv_padding,
        }
    }
}

fn parse_var<T>(raw: Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{name} has invalid value '{value}': {e}")))
    })
    .transpose()
}

fn parse_bool(raw: &str, name: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name} must be a boolean (true/false/1/0), got '{raw}'"
        ))),
    }
}

/// Seed data for the in-memory backends
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub reports: Vec<Report>,
    pub queries: Vec<ReportQuery>,
    pub tables: Vec<ReportTable>,
    /// Rows keyed by storage table name
    pub results: HashMap<String, Vec<Row>>,
    /// Metric records keyed by storage table name
    pub metrics: HashMap<String, Vec<MetricRecord>>,
}

impl Fixtures {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path).await.map_err(|e| {
            Error::Config(format!("unable to read fixtures {}: {e}", path.display()))
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            Error::Config(format!("invalid fixtures {}: {e}", path.display()))
        })
    }
}

/// Collaborators handed to the API layer
#[derive(Clone)]
pub struct Backends {
    pub catalog: Arc<dyn ReportCatalog>,
    pub results: Arc<dyn ReportResultsGetter>,
    pub metrics: Arc<dyn MetricsRepository>,
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Build the in-memory backends, seeded from `config.fixtures` when set.
    pub async fn create_backends(config: &ServiceConfig) -> Result<Backends> {
        let catalog = LocalReportCatalog::new();
        let results = LocalResultsStore::new();
        let metrics = LocalMetricsRepository::new();

        match &config.fixtures {
            Some(path) => {
                let fixtures = Fixtures::load(path).await?;
                info!(
                    path = %path.display(),
                    reports = fixtures.reports.len(),
                    queries = fixtures.queries.len(),
                    tables = fixtures.tables.len(),
                    "Seeding backends from fixtures"
                );
                Self::seed(&catalog, &results, &metrics, fixtures).await?;
            }
            None => info!("Using empty in-memory backends (development mode)"),
        }

        Ok(Backends {
            catalog: Arc::new(catalog),
            results: Arc::new(results),
            metrics: Arc::new(metrics),
        })
    }

    async fn seed(
        catalog: &LocalReportCatalog,
        results: &LocalResultsStore,
        metrics: &LocalMetricsRepository,
        fixtures: Fixtures,
    ) -> Result<()> {
        for report in fixtures.reports {
            catalog.insert_report(report);
        }
        for query in fixtures.queries {
            catalog.insert_query(query);
        }
        for table in fixtures.tables {
            catalog.insert_table(table);
        }
        for (table, rows) in fixtures.results {
            results.insert_results(table, rows);
        }
        for (table, records) in fixtures.metrics {
            metrics.store_metrics(&table, records).await?;
        }
        Ok(())
    }
}
