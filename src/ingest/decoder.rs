//! Incremental decoder for a JSON array of metric records.
//!
//! Reads from any [`Read`] source and yields one [`MetricRecord`] per step,
//! so neither the raw payload nor a JSON tree of it is held in memory. The
//! first malformed delimiter or element produces a single [`Error::Decode`]
//! and ends the sequence.

use super::MetricRecord;
use crate::{Error, Result};

use std::fmt::Display;
use std::io::{self, BufRead, BufReader, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Opening `[` not read yet
    Start,
    /// Inside the array, no element read yet
    First,
    /// Inside the array, at least one element read
    Rest,
    Done,
}

/// Iterator over the elements of a JSON array of metric records
pub struct MetricArrayDecoder<R: Read> {
    reader: BufReader<R>,
    /// Bytes consumed so far
    pos: usize,
    index: usize,
    state: State,
}

impl<R: Read> MetricArrayDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pos: 0,
            index: 0,
            state: State::Start,
        }
    }

    /// Number of records decoded so far
    pub fn decoded(&self) -> usize {
        self.index
    }

    fn error(&self, msg: impl Display) -> Error {
        Error::Decode(format!("{} (byte offset {})", msg, self.pos))
    }

    fn bump(&mut self) {
        self.reader.consume(1);
        self.pos += 1;
    }

    fn peek_token(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf()?.first().copied() {
                Some(b) if b.is_ascii_whitespace() => self.bump(),
                other => return Ok(other),
            }
        }
    }

    /// Next non-whitespace byte, not consumed
    fn token(&mut self) -> Result<Option<u8>> {
        match self.peek_token() {
            Ok(token) => Ok(token),
            Err(e) => Err(self.error(format_args!("unable to read metric array: {}", e))),
        }
    }

    fn step(&mut self) -> Result<Option<MetricRecord>> {
        if self.state == State::Start {
            if self.token()? != Some(b'[') {
                return Err(self.error("expected '[' at start of metric array"));
            }
            self.bump();
            self.state = State::First;
        }

        match self.token()? {
            None => return Err(self.error("unexpected end of input, expected ']'")),
            Some(b']') => {
                self.bump();
                if self.token()?.is_some() {
                    return Err(self.error("unexpected data after closing ']'"));
                }
                return Ok(None);
            }
            Some(b',') if self.state == State::Rest => {
                self.bump();
                self.token()?;
            }
            Some(_) if self.state == State::Rest => {
                return Err(self.error("expected ',' or ']' after array element"));
            }
            Some(_) => {}
        }

        // Objects and arrays end on their closing byte, so the deserializer
        // never reads past the element.
        let (next, consumed) = {
            let mut stream = serde_json::Deserializer::from_reader(&mut self.reader)
                .into_iter::<MetricRecord>();
            let next = stream.next();
            (next, stream.byte_offset())
        };
        self.pos += consumed;

        match next {
            Some(Ok(record)) => {
                self.index += 1;
                self.state = State::Rest;
                Ok(Some(record))
            }
            Some(Err(e)) => Err(self.error(format_args!(
                "invalid metric record at index {}: {}",
                self.index, e
            ))),
            None => Err(self.error("unexpected end of input, expected array element")),
        }
    }
}

impl<R: Read> Iterator for MetricArrayDecoder<R> {
    type Item = Result<MetricRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for MetricArrayDecoder<R> {}

/// Decode every record, stopping at the first error.
pub fn decode_batch<R: Read>(reader: R) -> Result<Vec<MetricRecord>> {
    MetricArrayDecoder::new(reader).collect()
}
