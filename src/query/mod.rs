//! Report query execution
//!
//! The report path resolves a report through the catalog, runs its
//! generation query through a [`ReportResultsGetter`], validates the row
//! shape, and renders the result set. Query execution itself lives behind
//! the trait; [`LocalResultsStore`] serves precomputed rows.

mod local;
mod report;
mod telemetry;

pub use local::LocalResultsStore;
pub use report::{RenderedReport, ReportRequest, ReportService};

use crate::results::Row;
use crate::schema::Column;
use crate::Result;

use async_trait::async_trait;

/// Runs a report's generation query against its stored table
#[async_trait]
pub trait ReportResultsGetter: Send + Sync {
    /// Fetch the rows stored in `table` for the declared `columns`.
    async fn get_report_results(&self, table: &str, columns: &[Column]) -> Result<Vec<Row>>;
}
