//! # meterview
//!
//! Report result rendering and metric ingestion for a metering service.
//!
//! A report's generation query declares its columns; the stored results are
//! validated against that declaration and rendered as CSV, tab-aligned TSV,
//! or JSON. Columns flagged `tableHidden` are shown or stripped depending on
//! the API version, request mode and output format.
//!
//! ## Layout
//!
//! - **results / schema**: typed values, rows, declared columns, drift checks
//! - **render**: visibility policy and the format encoders
//! - **ingest**: streaming decode of metric arrays and the metrics store
//! - **metadata / query**: catalog lookups and the report pipeline
//! - **api**: axum routes over all of the above

pub mod api;
pub mod config;
pub mod ingest;
pub mod metadata;
pub mod query;
pub mod render;
pub mod results;
pub mod schema;
pub mod telemetry;

mod error;

pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::api::{build_http_router, ApiServerConfig, ApiState};
    pub use crate::config::{ComponentFactory, ServiceConfig};
    pub use crate::ingest::{LocalMetricsRepository, MetricRecord, MetricsRepository};
    pub use crate::metadata::{LocalReportCatalog, Report, ReportCatalog, ReportQuery, ReportTable};
    pub use crate::query::{LocalResultsStore, ReportRequest, ReportResultsGetter, ReportService};
    pub use crate::render::{ApiVersion, OutputFormat, RenderMode, RenderOptions};
    pub use crate::results::{ResultValue, Row};
    pub use crate::schema::{ActualColumn, Column};
    pub use crate::{Error, Result};
}
