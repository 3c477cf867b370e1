//! Report metadata
//!
//! Reports, the queries that generate them, and the tables their results
//! were written to. Lookups go through the [`ReportCatalog`] trait so the
//! HTTP layer does not care where the records live.

mod client;
mod local;

pub use client::ReportCatalog;
pub use local::LocalReportCatalog;

use crate::schema::{ActualColumn, Column};
use serde::{Deserialize, Serialize};

/// Condition type tracking report generation
pub const REPORT_RUNNING_CONDITION: &str = "Running";
/// Reason recorded on the running condition when generation failed
pub const GENERATE_REPORT_FAILED_REASON: &str = "GenerateReportFailed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatus {
    #[serde(default)]
    pub conditions: Vec<ReportCondition>,
}

impl ReportStatus {
    pub fn condition(&self, condition_type: &str) -> Option<&ReportCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// A report definition and its generation status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub namespace: String,
    pub name: String,
    #[serde(rename = "generationQuery")]
    pub generation_query_name: String,
    #[serde(default)]
    pub status: ReportStatus,
}

impl Report {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        generation_query_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generation_query_name: generation_query_name.into(),
            status: ReportStatus::default(),
        }
    }

    /// The running condition, if it records a generation failure.
    pub fn failure(&self) -> Option<&ReportCondition> {
        self.status
            .condition(REPORT_RUNNING_CONDITION)
            .filter(|c| {
                c.status == ConditionStatus::False && c.reason == GENERATE_REPORT_FAILED_REASON
            })
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status
            .conditions
            .retain(|c| c.condition_type != REPORT_RUNNING_CONDITION);
        self.status.conditions.push(ReportCondition {
            condition_type: REPORT_RUNNING_CONDITION.to_string(),
            status: ConditionStatus::False,
            reason: GENERATE_REPORT_FAILED_REASON.to_string(),
            message: message.into(),
        });
    }
}

/// Query definition declaring a report's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub namespace: String,
    pub name: String,
    pub columns: Vec<Column>,
}

/// Materialized table holding a report's results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTable {
    pub namespace: String,
    /// Report name
    pub name: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub columns: Vec<ActualColumn>,
}

impl ReportTable {
    pub fn new(namespace: &str, report: &str, columns: Vec<ActualColumn>) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: report.to_string(),
            table_name: report_table_name(namespace, report),
            columns,
        }
    }
}

/// Storage table holding a report's results
pub fn report_table_name(namespace: &str, name: &str) -> String {
    sanitized_table_name("report", namespace, name)
}

/// Storage table holding metrics for a datasource
pub fn datasource_table_name(namespace: &str, name: &str) -> String {
    sanitized_table_name("datasource", namespace, name)
}

/// Catalog resource name of a report's table
pub fn report_table_resource_name(namespace: &str, name: &str) -> String {
    format!("report-{}-{}", namespace, name)
}

fn sanitized_table_name(kind: &str, namespace: &str, name: &str) -> String {
    format!("{}_{}_{}", kind, namespace, name).replace(['-', '.'], "_")
}
