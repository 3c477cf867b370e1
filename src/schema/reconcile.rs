//! Declared-vs-stored schema checks
//!
//! Two checks with different severities:
//! - [`reconcile`] compares the query's declared columns with the stored
//!   table's columns. Disagreement only means the query changed after the
//!   report ran, so it is reported, never raised.
//! - [`validate_result_shape`] checks fetched rows against the declared
//!   columns. Disagreement here means the rows cannot be rendered.

use super::{ActualColumn, Column, ColumnKind};
use crate::results::Row;
use crate::{Error, Result};

use std::collections::{BTreeMap, HashSet};

/// Outcome of comparing declared and stored columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub matches: bool,
    pub declared: Vec<(String, ColumnKind)>,
    pub actual: Vec<(String, ColumnKind)>,
}

/// Compare declared columns against the stored table's columns.
///
/// Order-independent: both sides must name the same set of columns, each with
/// an equivalent [`ColumnKind`]. Duplicate names never match.
pub fn reconcile(declared: &[Column], actual: &[ActualColumn]) -> Reconciliation {
    let declared: Vec<(String, ColumnKind)> = declared
        .iter()
        .map(|c| (c.name.clone(), c.kind()))
        .collect();
    let actual: Vec<(String, ColumnKind)> = actual
        .iter()
        .map(|c| (c.name.clone(), c.kind()))
        .collect();

    let declared_map: BTreeMap<&str, &ColumnKind> =
        declared.iter().map(|(n, k)| (n.as_str(), k)).collect();
    let actual_map: BTreeMap<&str, &ColumnKind> =
        actual.iter().map(|(n, k)| (n.as_str(), k)).collect();

    let matches = declared_map.len() == declared.len()
        && actual_map.len() == actual.len()
        && declared_map == actual_map;

    Reconciliation {
        matches,
        declared,
        actual,
    }
}

/// Verify every fetched row has exactly the declared columns.
pub fn validate_result_shape(declared: &[Column], rows: &[Row]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let names: HashSet<&str> = declared.iter().map(|c| c.name.as_str()).collect();
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != declared.len() {
            return Err(Error::SchemaViolation(format!(
                "report results schema doesn't match expected schema, got {} columns, expected {} (row {})",
                row.len(),
                declared.len(),
                idx
            )));
        }
        if let Some(key) = row.keys().find(|key| !names.contains(key)) {
            return Err(Error::SchemaViolation(format!(
                "report results schema doesn't match expected schema, unexpected key: {:?} (row {})",
                key, idx
            )));
        }
    }
    Ok(())
}
