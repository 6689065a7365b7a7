//! CSV reading operations.

use std::{fs::File, path::Path};

use polars::{frame::DataFrame, io::SerReader, prelude::CsvReadOptions};

use crate::error::Result;

/// Reads a comma-delimited file with a header row, keeping every column as text
/// so codes with leading zeros survive.
pub(crate) fn read_string_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()?)
}

/// Get a text column by name, or a configuration error listing what exists.
pub(crate) fn string_column<'a>(df: &'a DataFrame, name: &str, table: &str) -> Result<Vec<Option<&'a str>>> {
    let column = df.column(name).map_err(|_| crate::error::CrosswalkError::Config(format!(
        "[{table}] missing column {name:?} (columns: {:?})",
        df.get_column_names().iter().map(|c| c.as_str()).collect::<Vec<_>>()
    )))?;
    Ok(column.str()?.into_iter().map(|v| v.map(str::trim).filter(|s| !s.is_empty())).collect())
}
