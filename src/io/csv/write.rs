//! CSV writing operations.

use polars::{frame::DataFrame, io::SerWriter, prelude::CsvWriter};

use crate::error::Result;

/// Write a DataFrame to CSV bytes with a header row and no index column.
pub(crate) fn write_csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    CsvWriter::new(&mut out)
        .include_header(true)
        .finish(df)?;
    Ok(out)
}
