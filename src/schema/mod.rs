//! Column definitions for report queries and their stored tables
//!
//! A report query declares its output shape as a list of [`Column`]s. The
//! table the report was written into has its own list of [`ActualColumn`]s.
//! Both sides spell types in either Hive (`string`, `int`, `map<..>`) or
//! Presto (`varchar`, `integer`, `map(..)`) syntax, so comparisons go through
//! [`ColumnKind`], which collapses the aliases.

mod reconcile;

pub use reconcile::{reconcile, validate_result_shape, Reconciliation};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column declared by a report query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "tableHidden", default)]
    pub table_hidden: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            unit: None,
            table_hidden: false,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.table_hidden = true;
        self
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::parse(&self.column_type)
    }
}

/// A column as it exists in the stored table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ActualColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        ColumnKind::parse(&self.column_type)
    }
}

/// Normalized column type.
///
/// Holds the canonical Presto spelling: lowercase, no whitespace, Hive
/// aliases replaced, and `<..>` type parameters rewritten as `(..)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKind(String);

impl ColumnKind {
    pub fn parse(raw: &str) -> Self {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        Self(canonical_type(&compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_type(ty: &str) -> String {
    if let Some(inner) = type_parameters(ty, "array") {
        return format!("array({})", canonical_type(inner));
    }
    if let Some(inner) = type_parameters(ty, "map") {
        let params: Vec<String> = split_top_level(inner)
            .into_iter()
            .map(canonical_type)
            .collect();
        return format!("map({})", params.join(","));
    }
    match ty {
        "bool" | "boolean" => "boolean",
        "int" | "integer" => "integer",
        "float" | "real" => "real",
        "double" | "doubleprecision" => "double",
        "string" | "varchar" => "varchar",
        "binary" | "varbinary" => "varbinary",
        other => other,
    }
    .to_string()
}

/// Returns the text between the brackets of `name<..>` or `name(..)`.
fn type_parameters<'a>(ty: &'a str, name: &str) -> Option<&'a str> {
    let rest = ty.strip_prefix(name)?;
    rest.strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .or_else(|| rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')))
}

fn split_top_level(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in params.char_indices() {
        match ch {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&params[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[start..]);
    parts
}
