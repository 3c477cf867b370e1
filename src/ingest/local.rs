//! Local in-memory metrics repository for development and testing

use super::{MetricRecord, MetricsRepository, TimeRange};
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory metrics repository
///
/// Keeps every stored batch per table in insertion order.
#[derive(Debug, Default)]
pub struct LocalMetricsRepository {
    tables: RwLock<HashMap<String, Vec<MetricRecord>>>,
}

impl LocalMetricsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored for `table`
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl MetricsRepository for LocalMetricsRepository {
    async fn store_metrics(&self, table: &str, metrics: Vec<MetricRecord>) -> Result<()> {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(metrics);
        Ok(())
    }

    async fn fetch_metrics(&self, table: &str, range: TimeRange) -> Result<Vec<MetricRecord>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| range.contains(r.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
