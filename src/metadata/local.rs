//! Local in-memory report catalog for development and testing

use super::{report_table_resource_name, Report, ReportCatalog, ReportQuery, ReportTable};
use crate::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// Local in-memory report catalog
///
/// Tables are keyed by their catalog resource name, so a report without a
/// table reads as "not processed yet".
#[derive(Debug, Default)]
pub struct LocalReportCatalog {
    reports: DashMap<Key, Report>,
    queries: DashMap<Key, ReportQuery>,
    tables: DashMap<Key, ReportTable>,
}

impl LocalReportCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_report(&self, report: Report) {
        self.reports
            .insert(key(&report.namespace, &report.name), report);
    }

    pub fn insert_query(&self, query: ReportQuery) {
        self.queries.insert(key(&query.namespace, &query.name), query);
    }

    pub fn insert_table(&self, table: ReportTable) {
        let resource = report_table_resource_name(&table.namespace, &table.name);
        self.tables.insert(key(&table.namespace, &resource), table);
    }

    pub fn remove_table(&self, namespace: &str, report: &str) -> Option<ReportTable> {
        let resource = report_table_resource_name(namespace, report);
        self.tables
            .remove(&key(namespace, &resource))
            .map(|(_, table)| table)
    }
}

#[async_trait]
impl ReportCatalog for LocalReportCatalog {
    async fn get_report(&self, namespace: &str, name: &str) -> Result<Report> {
        self.reports
            .get(&key(namespace, name))
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::NotFound(format!("report {}/{}", namespace, name)))
    }

    async fn get_query(&self, namespace: &str, name: &str) -> Result<ReportQuery> {
        self.queries
            .get(&key(namespace, name))
            .map(|q| q.value().clone())
            .ok_or_else(|| Error::NotFound(format!("report query {}/{}", namespace, name)))
    }

    async fn get_report_table(&self, namespace: &str, report: &str) -> Result<ReportTable> {
        let resource = report_table_resource_name(namespace, report);
        self.tables
            .get(&key(namespace, &resource))
            .map(|t| t.value().clone())
            .ok_or_else(|| Error::NotReady(format!("table {}/{}", namespace, resource)))
    }
}
