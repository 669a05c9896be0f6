//! Parsing of extraction-tool output into in-memory tables.
//!
//! - [`csv`]: CSV-R result streams (one header row, typed per column, normalized per row kind)
//! - [`metadata`]: headerless tab-separated metadata streams (opaque text)
//! - [`coerce`]: the per-column cell coercers both build on

pub mod coerce;
pub mod csv;
pub mod metadata;

pub use csv::{normalize_by_type, read_results_csv, read_results_csv_from_path, read_results_csv_from_reader};
pub use metadata::{MetadataLayout, read_metadata_tsv};
