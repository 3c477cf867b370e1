//! Report catalog trait

use super::{Report, ReportQuery, ReportTable};
use crate::Result;
use async_trait::async_trait;

/// Report metadata lookup
///
/// Abstracts where report definitions live so the API can be served from an
/// in-memory catalog in development and a real store in production.
#[async_trait]
pub trait ReportCatalog: Send + Sync {
    /// Get a report; `Error::NotFound` when it does not exist
    async fn get_report(&self, namespace: &str, name: &str) -> Result<Report>;

    /// Get the generation query a report was built from
    async fn get_query(&self, namespace: &str, name: &str) -> Result<ReportQuery>;

    /// Get the materialized table for a report; `Error::NotReady` when the
    /// report has not produced one yet
    async fn get_report_table(&self, namespace: &str, report: &str) -> Result<ReportTable>;
}
