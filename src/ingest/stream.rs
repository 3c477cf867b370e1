//! Bridge from an async chunk stream to the blocking decoder.
//!
//! Body chunks are forwarded over a bounded channel to a decoder running on
//! the blocking pool, so at most [`CHUNK_BACKLOG`] chunks are buffered at any
//! time regardless of payload size.

use super::{decode_batch, MetricRecord};
use crate::{Error, Result};

use bytes::{Buf, Bytes};
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::io::{self, Read};
use tokio::sync::mpsc;
use tracing::debug;

/// Chunks in flight between the body and the decoder
pub const CHUNK_BACKLOG: usize = 4;

/// Blocking [`Read`] over chunks sent from an async task
pub struct ChunkReader {
    chunks: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    pub fn new(chunks: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            chunks,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.chunks.blocking_recv() {
                Some(chunk) => self.current = chunk?,
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

/// Decode a chunked body on the blocking pool while it is still arriving.
pub async fn decode_stream<S, E>(mut body: S) -> Result<Vec<MetricRecord>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    let (tx, rx) = mpsc::channel(CHUNK_BACKLOG);
    let decoder = tokio::task::spawn_blocking(move || decode_batch(ChunkReader::new(rx)));

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()));
        let failed = chunk.is_err();
        // A closed channel means the decoder already stopped on an error
        if tx.send(chunk).await.is_err() || failed {
            debug!("Metric body forwarding stopped early");
            break;
        }
    }
    drop(tx);

    decoder
        .await
        .map_err(|e| Error::Internal(format!("metric decoder task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    const RECORD: &str =
        r#"{"labels":{"pod":"p1"},"amount":1.5,"timestamp":"2024-03-01T10:00:00Z"}"#;

    fn chunked(body: &str, size: usize) -> Vec<std::result::Result<Bytes, Infallible>> {
        body.as_bytes()
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect()
    }

    #[tokio::test]
    async fn test_decodes_across_chunk_boundaries() {
        let body = format!("[{},{}]", RECORD, RECORD);
        for size in [1, 3, 7, body.len()] {
            let records = decode_stream(stream::iter(chunked(&body, size))).await.unwrap();
            assert_eq!(records.len(), 2, "chunk size {}", size);
            assert_eq!(records[0].labels["pod"], "p1");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_stops_early() {
        let mut chunks = chunked(&format!("[{}}}", RECORD), 5);
        // Trailing chunks the decoder never needs
        chunks.extend(chunked(&RECORD.repeat(50), 16));
        let err = decode_stream(stream::iter(chunks)).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_body_error_is_decode_error() {
        let chunks: Vec<std::result::Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"[")),
            Err("connection reset".to_string()),
        ];
        match decode_stream(stream::iter(chunks)).await {
            Err(Error::Decode(msg)) => assert!(msg.contains("connection reset"), "{}", msg),
            other => panic!("Expected Decode error, got: {:?}", other),
        }
    }
}
