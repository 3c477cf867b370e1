//! CSV and tab-separated row writer

use crate::results::Row;
use crate::schema::Column;
use crate::{Error, Result};

use std::io::Write;

/// Write a header of column names followed by one record per row.
///
/// Nothing is written for an empty result set. Values are coerced with
/// [`ResultValue::to_text`](crate::results::ResultValue::to_text) in column
/// order; a row without one of the columns fails the whole write.
pub fn write_delimited<W: Write>(
    out: W,
    delimiter: u8,
    columns: &[Column],
    rows: &[Row],
) -> Result<()> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false);
    let mut writer = builder.from_writer(out);

    if !rows.is_empty() {
        let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        writer = write_line(&builder, writer, &header[..])?;
    }

    let mut record = Vec::with_capacity(columns.len());
    for row in rows {
        record.clear();
        for column in columns {
            let value = row.get(&column.name).ok_or_else(|| {
                Error::SchemaViolation(format!(
                    "report results schema doesn't match expected schema, unexpected key: {:?}",
                    column.name
                ))
            })?;
            record.push(value.to_text()?);
        }
        writer = write_line(&builder, writer, &record[..])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one record. A record holding a single empty field becomes a blank
/// line; the csv writer would otherwise emit `""` for it.
fn write_line<W: Write, T: AsRef<[u8]>>(
    builder: &csv::WriterBuilder,
    mut writer: csv::Writer<W>,
    record: &[T],
) -> Result<csv::Writer<W>> {
    if let [field] = record {
        let field: &[u8] = field.as_ref();
        if field.is_empty() {
            let mut inner = writer.into_inner().map_err(|e| e.into_error())?;
            inner.write_all(b"\n")?;
            return Ok(builder.from_writer(inner));
        }
    }
    writer.write_record(record)?;
    Ok(writer)
}
