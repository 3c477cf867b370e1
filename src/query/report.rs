//! Report lookup, validation and rendering pipeline

use super::{telemetry, ReportResultsGetter};
use crate::metadata::ReportCatalog;
use crate::render::{self, RenderOptions};
use crate::schema::{reconcile, validate_result_shape};
use crate::{Error, Result};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, warn, Instrument};

/// One report render request, already validated at the API boundary
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub namespace: String,
    pub name: String,
    pub options: RenderOptions,
    /// Render even when the report records a generation failure
    pub ignore_failed: bool,
}

/// Fully encoded report body plus its response metadata
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// `<query name>.<ext>`
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub rows: usize,
}

/// Orchestrates report rendering over the catalog and the query engine
#[derive(Clone)]
pub struct ReportService {
    catalog: Arc<dyn ReportCatalog>,
    results: Arc<dyn ReportResultsGetter>,
}

impl ReportService {
    pub fn new(catalog: Arc<dyn ReportCatalog>, results: Arc<dyn ReportResultsGetter>) -> Self {
        Self { catalog, results }
    }

    /// Resolve, query, validate and encode a report.
    ///
    /// The body is encoded completely before returning, so a coercion or
    /// shape failure never produces a partial response.
    pub async fn render_report(&self, request: &ReportRequest) -> Result<RenderedReport> {
        let started = Instant::now();
        let span = info_span!(
            "report.render",
            namespace = %request.namespace,
            name = %request.name,
            api = request.options.api.as_str(),
            format = request.options.format.as_str()
        );

        let result = self.render_inner(request).instrument(span).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(rendered) => telemetry::record_report(telemetry::ReportMetrics {
                outcome: "success",
                error_class: None,
                api: request.options.api.as_str(),
                format: request.options.format.as_str(),
                duration_seconds: elapsed,
                rows_rendered: rendered.rows as u64,
                bytes_rendered: rendered.body.len() as u64,
            }),
            Err(error) => telemetry::record_report(telemetry::ReportMetrics {
                outcome: "error",
                error_class: Some(error.class()),
                api: request.options.api.as_str(),
                format: request.options.format.as_str(),
                duration_seconds: elapsed,
                rows_rendered: 0,
                bytes_rendered: 0,
            }),
        }

        result
    }

    async fn render_inner(&self, request: &ReportRequest) -> Result<RenderedReport> {
        let namespace = request.namespace.as_str();
        let name = request.name.as_str();

        let report = match self.catalog.get_report(namespace, name).await {
            Ok(report) => report,
            Err(e @ Error::NotFound(_)) => return Err(e),
            Err(e) => {
                error!(namespace, name, error = %e, "error getting report");
                return Err(Error::Upstream(
                    "failed to get report (see server logs for details)".to_string(),
                ));
            }
        };

        if !request.ignore_failed {
            if let Some(failure) = report.failure() {
                return Err(Error::ReportFailed {
                    reason: failure.reason.clone(),
                    message: failure.message.clone(),
                });
            }
        }

        let query = self
            .catalog
            .get_query(namespace, &report.generation_query_name)
            .await
            .map_err(|e| {
                error!(
                    namespace,
                    name,
                    query = %report.generation_query_name,
                    error = %e,
                    "error getting report generation query"
                );
                Error::Upstream(
                    "failed to get report generation query (see server logs for details)"
                        .to_string(),
                )
            })?;

        let table = match self.catalog.get_report_table(namespace, name).await {
            Ok(table) => table,
            Err(Error::NotReady(msg)) | Err(Error::NotFound(msg)) => {
                debug!(namespace, name, detail = %msg, "report table not materialized");
                return Err(Error::NotReady(msg));
            }
            Err(e) => {
                error!(namespace, name, error = %e, "error getting report table");
                return Err(Error::Upstream(
                    "failed to get report table (see server logs for details)".to_string(),
                ));
            }
        };

        let drift = reconcile(&query.columns, &table.columns);
        if !drift.matches {
            telemetry::record_schema_drift();
            warn!(
                namespace,
                name,
                table = %table.table_name,
                "report query columns do not match the stored table columns"
            );
            debug!(
                namespace,
                name,
                declared = ?drift.declared,
                actual = ?drift.actual,
                "report schema drift detail"
            );
        }

        let rows = self
            .results
            .get_report_results(&table.table_name, &query.columns)
            .await
            .map_err(|e| {
                error!(
                    namespace,
                    name,
                    table = %table.table_name,
                    error = %e,
                    "error querying report results"
                );
                Error::Upstream("failed to perform query (see server logs for details)".to_string())
            })?;

        if let Err(e) = validate_result_shape(&query.columns, &rows) {
            error!(
                namespace,
                name,
                error = %e,
                "report results schema doesn't match expected schema"
            );
            return Err(e);
        }

        let row_count = rows.len();
        let mut body = Vec::new();
        if let Err(e) = render::render(&mut body, &request.options, &query.columns, rows) {
            error!(namespace, name, error = %e, "error rendering report");
            return Err(e);
        }

        Ok(RenderedReport {
            filename: render::attachment_filename(&query.name, request.options.format),
            content_type: request.options.format.content_type(),
            body,
            rows: row_count,
        })
    }
}
