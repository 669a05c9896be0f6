//! In-memory reshaping of parsed tables.
//!
//! The processing layer operates on [`crate::types::Table`] values produced by ingestion. Every
//! function returns a new table (or finalizes one the caller owns); nothing is cached.
//!
//! - [`pivot_wide()`] / [`melt()`]: long ↔ wide reshaping
//! - [`append_metadata_columns()`] / [`append_result_attributes()`]: suffixed metadata merges
//! - [`finalize_columns()`]: mandatory-column guarantee plus optional pruning
//! - [`filter_by_kinds()`]: row-type restriction
//!
//! ## Example: scalar rows → one row per module
//!
//! ```rust
//! use scave_results::ingestion::read_results_csv;
//! use scave_results::processing::pivot_scalars;
//! use scave_results::types::Value;
//!
//! let csv = "type,run,module,name,value\nscalar,Run-0,Net.host,delay,3.5\n";
//! let long = read_results_csv(csv.as_bytes()).unwrap();
//! let wide = pivot_scalars(&long).unwrap();
//!
//! assert_eq!(wide.row_count(), 1);
//! assert_eq!(wide.value(0, "delay"), Some(&Value::Float64(3.5)));
//! ```

pub mod columns;
pub mod filter;
pub mod merge;
pub mod pivot;

pub use columns::{ensure_columns, finalize_columns, prune_unused_columns, to_numeric};
pub use filter::{filter, filter_by_kinds};
pub use merge::{append_metadata_columns, append_result_attributes, left_join};
pub use pivot::{melt, pivot_scalars, pivot_wide};
