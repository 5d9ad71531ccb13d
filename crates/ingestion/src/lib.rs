//! Data ingestion and normalization for the bhav analytics system.
//!
//! This crate handles:
//! - Header alias resolution across export formats
//! - Tolerant numeric and date parsing
//! - Equity-series filtering into canonical records

pub mod fields;
pub mod normalizer;
pub mod values;

pub use fields::{ColumnMap, Field};
pub use normalizer::{parse_csv, parse_snapshot, CsvNormalizer, ParseStats};
pub use values::{date_from_filename, parse_count, parse_number, parse_trade_date};
