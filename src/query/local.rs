//! In-memory results store for development and testing

use super::ReportResultsGetter;
use crate::results::Row;
use crate::schema::Column;
use crate::{Error, Result};

use async_trait::async_trait;
use dashmap::DashMap;

/// Precomputed report rows keyed by storage table name
///
/// Rows are returned exactly as inserted; shape checks happen in the
/// report pipeline, not here.
#[derive(Debug, Default)]
pub struct LocalResultsStore {
    tables: DashMap<String, Vec<Row>>,
}

impl LocalResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows stored for `table`.
    pub fn insert_results(&self, table: impl Into<String>, rows: Vec<Row>) {
        self.tables.insert(table.into(), rows);
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }
}

#[async_trait]
impl ReportResultsGetter for LocalResultsStore {
    async fn get_report_results(&self, table: &str, _columns: &[Column]) -> Result<Vec<Row>> {
        self.tables
            .get(table)
            .map(|rows| rows.value().clone())
            .ok_or_else(|| Error::Upstream(format!("table {} does not exist", table)))
    }
}
