//! Metric batch ingestion
//!
//! Externally collected Prometheus samples arrive as a JSON array of
//! [`MetricRecord`]s. The array is decoded element by element as the body
//! arrives and the full batch is handed to a [`MetricsRepository`] only once
//! every element parsed.

mod decoder;
mod local;
mod stream;

pub use decoder::{decode_batch, MetricArrayDecoder};
pub use local::LocalMetricsRepository;
pub use stream::{decode_stream, ChunkReader, CHUNK_BACKLOG};

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use futures_util::Stream;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::{debug, error};

/// One time-series sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub amount: f64,
    /// Sampling step in nanoseconds
    #[serde(rename = "stepSize", default)]
    pub step_size: i64,
    pub timestamp: DateTime<Utc>,
}

/// Optional inclusive time bounds for fetching metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| timestamp >= start)
            && self.end.map_or(true, |end| timestamp <= end)
    }
}

/// Time-series storage for ingested metrics
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Store a complete batch into `table`
    async fn store_metrics(&self, table: &str, metrics: Vec<MetricRecord>) -> Result<()>;

    /// Records of `table` within `range`, in insertion order
    async fn fetch_metrics(&self, table: &str, range: TimeRange) -> Result<Vec<MetricRecord>>;
}

/// Decode `body` and store it as one batch. Returns the number of records.
pub async fn ingest(repo: &dyn MetricsRepository, table: &str, body: &[u8]) -> Result<usize> {
    store_batch(repo, table, decode_batch(body)?).await
}

/// Like [`ingest`], decoding the body chunk by chunk as it arrives.
pub async fn ingest_stream<S, E>(
    repo: &dyn MetricsRepository,
    table: &str,
    body: S,
) -> Result<usize>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    store_batch(repo, table, decode_stream(body).await?).await
}

async fn store_batch(
    repo: &dyn MetricsRepository,
    table: &str,
    metrics: Vec<MetricRecord>,
) -> Result<usize> {
    let count = metrics.len();
    debug!(table = %table, records = count, "Decoded metric batch");

    repo.store_metrics(table, metrics).await.map_err(|e| {
        error!(table = %table, error = %e, "Failed to store metric batch");
        match e {
            Error::Storage(msg) => Error::Storage(msg),
            other => Error::Storage(other.to_string()),
        }
    })?;
    Ok(count)
}
