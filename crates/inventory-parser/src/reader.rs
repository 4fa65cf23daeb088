use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use csv::ReaderBuilder;
use polars::prelude::*;

use crate::errors::ParserError;
use crate::header::normalize_header;

/// Cell values read as missing, in addition to empty fields.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parses a CSV file into a DataFrame whose schema comes from the header row.
pub fn parse_csv_file(path: &Path) -> Result<DataFrame, ParserError> {
    let open = |path: &Path| {
        File::open(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let names = read_header(open(path)?)?;
    let df = csv_options().into_reader_with_file_handle(open(path)?).finish()?;
    apply_header(df, names)
}

pub fn parse_csv_str(content: &str) -> Result<DataFrame, ParserError> {
    parse_csv_bytes(content.as_bytes())
}

/// Column dtypes are inferred over every row; integer columns stay `Int64`,
/// any decimal makes `Float64`, anything else is `String`. Tokens in
/// [`DEFAULT_NA_VALUES`] and empty fields are null and never force a column
/// to text. Short rows are padded with nulls, long rows are an error.
pub fn parse_csv_bytes(content: &[u8]) -> Result<DataFrame, ParserError> {
    let names = read_header(content)?;
    let df = csv_options()
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()?;
    apply_header(df, names)
}

fn csv_options() -> CsvReadOptions {
    let na_values: Vec<PlSmallStr> = DEFAULT_NA_VALUES.iter().map(|v| (*v).into()).collect();
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|parse| {
            parse.with_null_values(Some(NullValues::AllColumns(na_values.clone())))
        })
}

/// Reads only the first record; the reader stops there.
fn read_header<R: Read>(input: R) -> Result<Vec<String>, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let header = reader.headers()?;
    if header.is_empty() {
        return Err(ParserError::MissingHeader);
    }
    Ok(normalize_header(header.iter()))
}

fn apply_header(mut df: DataFrame, names: Vec<String>) -> Result<DataFrame, ParserError> {
    if df.width() != names.len() {
        return Err(ParserError::HeaderMismatch {
            expected: names.len(),
            found: df.width(),
        });
    }
    df.set_column_names(names.iter().map(|name| name.as_str()))?;
    Ok(df)
}
