//! JSON result shapes
//!
//! v1 emits one flat object per row. v2 emits one entry per row holding a
//! list of `{name, value, tableHidden, unit?}` records so clients can render
//! units and hidden flags without fetching the schema separately. Both
//! materialize a single row at a time.

use super::Visibility;
use crate::results::{ResultValue, Row};
use crate::{Error, Result};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::io::Write;

/// Row object whose keys serialize in the given order.
#[derive(Debug)]
pub struct OrderedRecord<'a> {
    entries: Vec<(&'a str, &'a ResultValue)>,
}

impl<'a> OrderedRecord<'a> {
    pub fn from_row(visibility: &'a Visibility, row: &'a Row) -> Result<Self> {
        let entries = visibility
            .columns
            .iter()
            .map(|column| Ok((column.name.as_str(), lookup(row, &column.name)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OrderedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One column value in the v2 shape
#[derive(Debug, Serialize)]
pub struct ReportResultValue<'a> {
    pub name: &'a str,
    pub value: &'a ResultValue,
    #[serde(rename = "tableHidden")]
    pub table_hidden: bool,
    /// Absent for columns without a unit or with an empty one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'a str>,
}

/// One row in the v2 shape
#[derive(Debug, Serialize)]
pub struct ReportResultEntry<'a> {
    pub values: Vec<ReportResultValue<'a>>,
}

impl<'a> ReportResultEntry<'a> {
    pub fn from_row(visibility: &'a Visibility, row: &'a Row) -> Result<Self> {
        let values = visibility
            .columns
            .iter()
            .map(|column| {
                Ok(ReportResultValue {
                    name: &column.name,
                    value: lookup(row, &column.name)?,
                    table_hidden: column.table_hidden,
                    unit: column.unit.as_deref().filter(|u| !u.is_empty()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }
}

/// `[{"col": value, ...}, ...]`
pub fn write_v1<W: Write>(mut out: W, visibility: &Visibility, rows: &[Row]) -> Result<()> {
    out.write_all(b"[")?;
    for (idx, row) in rows.iter().enumerate() {
        if idx > 0 {
            out.write_all(b",")?;
        }
        let record = OrderedRecord::from_row(visibility, row)?;
        serde_json::to_writer(&mut out, &record)?;
    }
    out.write_all(b"]")?;
    out.flush()?;
    Ok(())
}

/// `{"results":[{"values":[{"name":..,"value":..,"tableHidden":..,"unit":..}]}]}`
pub fn write_v2<W: Write>(mut out: W, visibility: &Visibility, rows: &[Row]) -> Result<()> {
    out.write_all(b"{\"results\":[")?;
    for (idx, row) in rows.iter().enumerate() {
        if idx > 0 {
            out.write_all(b",")?;
        }
        let entry = ReportResultEntry::from_row(visibility, row)?;
        serde_json::to_writer(&mut out, &entry)?;
    }
    out.write_all(b"]}")?;
    out.flush()?;
    Ok(())
}

fn lookup<'a>(row: &'a Row, column: &str) -> Result<&'a ResultValue> {
    row.get(column).ok_or_else(|| {
        Error::SchemaViolation(format!(
            "report results schema doesn't match expected schema, unexpected key: {:?}",
            column
        ))
    })
}
