//! Result set rendering
//!
//! Turns declared columns plus fetched rows into CSV, tab-aligned TSV, or
//! one of the two JSON shapes. Visibility is resolved once per render and
//! applied to both the column list and the rows.

pub mod delimited;
pub mod json;
pub mod tabular;
pub mod visibility;

pub use tabular::{TabAligner, DEFAULT_PADDING, MAX_PADDING};
pub use visibility::{resolve, shows_hidden, ApiVersion, RenderMode, Visibility};

use crate::results::Row;
use crate::schema::Column;
use crate::{Error, Result};

use std::io::Write;
use std::str::FromStr;

/// Output format requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Csv,
    Tabular,
}

impl OutputFormat {
    /// Parse a case-insensitive format token.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "tab" | "tabular" => Ok(Self::Tabular),
            _ => Err(Error::InvalidRequest(
                "format must be one of: csv, json or tabular".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tabular => "tabular",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tabular => "tsv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Tabular => "text/tab-separated-values",
        }
    }

    pub fn is_table_format(&self) -> bool {
        matches!(self, Self::Csv | Self::Tabular)
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

/// Everything besides the data that selects an encoding
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub api: ApiVersion,
    pub mode: RenderMode,
    pub format: OutputFormat,
    /// Minimum padding for tab alignment
    pub padding: usize,
}

impl RenderOptions {
    pub fn new(api: ApiVersion, mode: RenderMode, format: OutputFormat) -> Self {
        Self {
            api,
            mode,
            format,
            padding: DEFAULT_PADDING,
        }
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }
}

/// `<name>.<ext>` for the Content-Disposition header
pub fn attachment_filename(name: &str, format: OutputFormat) -> String {
    format!("{}.{}", name, format.extension())
}

/// Resolve visibility, strip hidden values, and encode the rows.
pub fn render<W: Write>(
    out: W,
    options: &RenderOptions,
    columns: &[Column],
    mut rows: Vec<Row>,
) -> Result<()> {
    let visibility = resolve(columns, options.api, options.mode, options.format);
    visibility.apply(&mut rows);

    match (options.format, options.api) {
        (OutputFormat::Json, ApiVersion::V1) => json::write_v1(out, &visibility, &rows),
        (OutputFormat::Json, ApiVersion::V2) => json::write_v2(out, &visibility, &rows),
        (OutputFormat::Csv, _) => {
            delimited::write_delimited(out, b',', &visibility.columns, &rows)
        }
        (OutputFormat::Tabular, _) => {
            let mut aligner = TabAligner::new(out, options.padding);
            delimited::write_delimited(&mut aligner, b'\t', &visibility.columns, &rows)?;
            aligner.flush()?;
            Ok(())
        }
    }
}
