//! CSV loading and writing.
//!
//! Every column is read as text. Typing is left to the profiler, which reads
//! values through the same parsers the cleaning engine uses.

use crate::error::{AnalystError, Result, ResultExt};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn text_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
}

fn quoted_options() -> CsvReadOptions {
    text_options().with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
}

fn unquoted_options() -> CsvReadOptions {
    text_options().with_parse_options(CsvParseOptions::default().with_quote_char(None))
}

/// Load a CSV file with a header row.
///
/// Tries standard quote handling first and retries without it when the file
/// does not parse.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(AnalystError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    match quoted_options()
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => {
            info!("Loaded {}: {:?}", path.display(), df.shape());
            return Ok(df);
        }
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    let df = unquoted_options()
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .context(format!("Failed to parse CSV {}", path.display()))?;
    info!("Loaded {} without quote handling: {:?}", path.display(), df.shape());
    Ok(df)
}

/// Read CSV text from any reader, with the same fallback as [`load_csv`].
pub fn read_csv_from(mut reader: impl Read) -> Result<DataFrame> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    match quoted_options()
        .into_reader_with_file_handle(Cursor::new(bytes.clone()))
        .finish()
    {
        Ok(df) => Ok(df),
        Err(e) => {
            debug!("Standard parsing failed: {}", e);
            unquoted_options()
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
                .context("Failed to parse CSV input")
        }
    }
}

/// Write a frame as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, writer: impl Write) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}
