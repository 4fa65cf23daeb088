pub mod errors;
mod header;
mod reader;

pub use errors::ParserError;
pub use reader::{parse_csv_bytes, parse_csv_file, parse_csv_str, DEFAULT_NA_VALUES};
