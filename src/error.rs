//! Error types for meterview

use std::fmt;

/// Result type alias for meterview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for meterview
#[derive(Debug)]
pub enum Error {
    /// Missing or invalid request parameters (unsupported format, bad padding, ...)
    InvalidRequest(String),
    /// Referenced report, query or table does not exist
    NotFound(String),
    /// Report table has not been materialized yet
    NotReady(String),
    /// Report is in a recorded failure state
    ReportFailed { reason: String, message: String },
    /// Metadata store or query engine failure
    Upstream(String),
    /// Result rows disagree with the declared columns
    SchemaViolation(String),
    /// A value kind with no text representation
    Coercion { value: String },
    /// Malformed JSON in an ingest payload
    Decode(String),
    /// Metric storage failure
    Storage(String),
    /// CSV writer errors
    Csv(csv::Error),
    /// IO errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// Internal error
    Internal(String),
}

impl Error {
    /// Short stable label for metrics and logs
    pub fn class(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::NotFound(_) => "not_found",
            Error::NotReady(_) => "not_ready",
            Error::ReportFailed { .. } => "report_failed",
            Error::Upstream(_) => "upstream",
            Error::SchemaViolation(_) => "schema_violation",
            Error::Coercion { .. } => "coercion",
            Error::Decode(_) => "decode",
            Error::Storage(_) => "storage",
            Error::Csv(_) | Error::Io(_) | Error::Serialization(_) => "encode",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Csv(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRequest(msg) => write!(f, "{}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::NotReady(msg) => write!(f, "Not ready: {}", msg),
            Error::ReportFailed { reason, message } => {
                write!(f, "report is in failed state, reason: {}, message: {}", reason, message)
            }
            Error::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            Error::SchemaViolation(msg) => write!(f, "Schema violation: {}", msg),
            Error::Coercion { value } => {
                write!(f, "error marshalling csv: unsupported value kind {}", value)
            }
            Error::Decode(msg) => write!(f, "Decode error: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Csv(e) => write!(f, "CSV error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
