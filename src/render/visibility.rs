//! Column visibility policy
//!
//! Columns flagged `tableHidden` are meant for machine consumers only. The
//! v1 API never shows them. The v2 API shows them only for the full record
//! shape rendered as JSON.

use super::OutputFormat;
use crate::results::Row;
use crate::schema::Column;

use std::collections::BTreeSet;

/// Report API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

/// Request mode at the API boundary (not the output format)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Complete record shape
    Full,
    /// Table-display subset
    Table,
}

/// Columns to emit and column names to strip from every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    /// Visible columns in declared order
    pub columns: Vec<Column>,
    /// Names removed from every row before encoding
    pub hidden: BTreeSet<String>,
}

impl Visibility {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Strip hidden columns from every row.
    pub fn apply(&self, rows: &mut [Row]) {
        if self.hidden.is_empty() {
            return;
        }
        for row in rows.iter_mut() {
            for name in &self.hidden {
                row.remove(name);
            }
        }
    }
}

/// Whether hidden columns are emitted for this combination.
pub fn shows_hidden(api: ApiVersion, mode: RenderMode, format: OutputFormat) -> bool {
    matches!(
        (api, mode, format),
        (ApiVersion::V2, RenderMode::Full, OutputFormat::Json)
    )
}

/// Split declared columns into the visible list and the hidden name set.
pub fn resolve(
    columns: &[Column],
    api: ApiVersion,
    mode: RenderMode,
    format: OutputFormat,
) -> Visibility {
    let show_hidden = shows_hidden(api, mode, format);
    let mut visible = Vec::with_capacity(columns.len());
    let mut hidden = BTreeSet::new();

    for column in columns {
        if column.table_hidden && !show_hidden {
            hidden.insert(column.name.clone());
        } else {
            visible.push(column.clone());
        }
    }

    Visibility {
        columns: visible,
        hidden,
    }
}
