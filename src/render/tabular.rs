//! Elastic tabstop alignment for tab-separated output.
//!
//! Input is tab-terminated cells: the text after the last tab on a line is a
//! trailing cell and does not take part in alignment. A column block is a
//! run of consecutive lines that all have a cell in that column; every cell
//! in the block is padded to the widest cell plus `padding`, rounded up to a
//! whole number of tab stops. Padding is written as tab characters.

use std::io::{self, Write};

/// Width of one tab stop in characters
pub const TAB_WIDTH: usize = 8;

/// Default extra padding added to the widest cell of a column
pub const DEFAULT_PADDING: usize = 2;

/// Largest accepted padding; larger values are clamped
pub const MAX_PADDING: usize = 1024;

/// Buffers written text and emits it column-aligned on [`flush`](Write::flush).
pub struct TabAligner<W: Write> {
    inner: W,
    padding: usize,
    buf: Vec<u8>,
}

impl<W: Write> TabAligner<W> {
    pub fn new(inner: W, padding: usize) -> Self {
        Self {
            inner,
            padding: padding.min(MAX_PADDING),
            buf: Vec::new(),
        }
    }

    /// Flush pending text and return the wrapped writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    fn align_pending(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.buf);
        let text = std::str::from_utf8(&pending)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let aligned = align(text, self.padding);
        self.inner.write_all(aligned.as_bytes())
    }
}

impl<W: Write> Write for TabAligner<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.align_pending()?;
        self.inner.flush()
    }
}

struct Line<'a> {
    cells: Vec<&'a str>,
    terminated: bool,
}

impl Line<'_> {
    /// Number of tab-terminated cells
    fn columns(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

fn align(text: &str, padding: usize) -> String {
    let mut lines: Vec<Line<'_>> = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (line, terminated, next) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], true, &rest[idx + 1..]),
            None => (rest, false, ""),
        };
        lines.push(Line {
            cells: line.split('\t').collect(),
            terminated,
        });
        rest = next;
    }

    let widths = column_widths(&lines, padding);

    let mut out = String::with_capacity(text.len() * 2);
    for (line, line_widths) in lines.iter().zip(&widths) {
        for (cell, width) in line.cells.iter().zip(line_widths) {
            out.push_str(cell);
            let text_width = cell.chars().count();
            let cell_width = width.div_ceil(TAB_WIDTH).saturating_mul(TAB_WIDTH);
            let tabs = cell_width.saturating_sub(text_width).div_ceil(TAB_WIDTH);
            out.extend(std::iter::repeat('\t').take(tabs));
        }
        if let Some(trailing) = line.cells.last() {
            out.push_str(trailing);
        }
        if line.terminated {
            out.push('\n');
        }
    }
    out
}

/// Per line, the padded width of each tab-terminated cell.
fn column_widths(lines: &[Line<'_>], padding: usize) -> Vec<Vec<usize>> {
    let mut widths: Vec<Vec<usize>> = lines.iter().map(|l| vec![0; l.columns()]).collect();
    let max_columns = lines.iter().map(Line::columns).max().unwrap_or(0);

    for column in 0..max_columns {
        let mut idx = 0;
        while idx < lines.len() {
            if lines[idx].columns() <= column {
                idx += 1;
                continue;
            }
            let start = idx;
            let mut width = 0;
            while idx < lines.len() && lines[idx].columns() > column {
                let cell = lines[idx].cells[column].chars().count();
                width = width.max(cell.saturating_add(padding));
                idx += 1;
            }
            for line_widths in &mut widths[start..idx] {
                line_widths[column] = width;
            }
        }
    }
    widths
}
