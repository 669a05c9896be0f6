//! `scave-results` reads OMNeT++ simulation results through the `opp_scavetool` extraction tool
//! and reshapes them into in-memory [`types::Table`]s.
//!
//! The tool is run as a subprocess; its CSV-R export (results) or tab-separated query output
//! (run metadata) is parsed, typed per column, normalized per row kind, and pivoted so that
//! metadata and result attributes become columns next to the results they describe.
//!
//! ## Layers
//!
//! - [`ingestion`]: cell coercers plus the CSV-R and metadata parsers
//! - [`processing`]: pivoting, melting, metadata merges and column guarantees
//! - [`query`]: [`query::ResultSession`], the tool invocation, and observer hooks
//! - [`model`]: typed views ([`model::ResultItem`], [`model::MetadataRow`]) over tables
//! - [`config`]: input patterns and tool settings, loadable from JSON
//! - [`types`]: schema, cell and table types
//! - [`error`]: the error type shared by every layer
//!
//! ## Parsing captured output
//!
//! ```rust
//! use scave_results::ingestion::read_results_csv;
//! use scave_results::types::Value;
//!
//! let csv = "\
//! run,type,module,name,attrname,attrvalue,value,count,binedges
//! Run-0,scalar,Net.host[0],txBytes,,,1024,,
//! Run-0,histogram,Net.host[0],delay,,,,3,0 1 2
//! Run-0,attr,Net.host[0],txBytes,unit,B,,,
//! ";
//! let table = read_results_csv(csv.as_bytes()).unwrap();
//!
//! assert_eq!(table.row_count(), 3);
//! assert_eq!(table.value(0, "value"), Some(&Value::Float64(1024.0)));
//! assert_eq!(table.value(1, "count"), Some(&Value::Int64(3)));
//! assert_eq!(table.value(1, "binedges"), Some(&Value::FloatArray(vec![0.0, 1.0, 2.0])));
//! assert!(table.schema.contains("runID"));
//! ```
//!
//! ## Querying through the tool
//!
//! ```no_run
//! use scave_results::config::SessionConfig;
//! use scave_results::query::{MetadataInclusion, QueryOptions, ResultSession};
//!
//! # fn main() -> Result<(), scave_results::ResultsError> {
//! let mut session = ResultSession::new(SessionConfig::default());
//! session.set_inputs(["results/*.sca"]);
//!
//! let opts = QueryOptions {
//!     include: MetadataInclusion {
//!         attrs: true,
//!         itervars: true,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let scalars = session.get_scalars(Some("name =~ txBytes"), &opts)?;
//! println!("rows={}", scalars.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! With the `polars` feature, `export::to_dataframe` converts any table into a Polars
//! `DataFrame`.

pub mod config;
pub mod error;
#[cfg(feature = "polars")]
pub mod export;
pub mod ingestion;
pub mod model;
pub mod processing;
pub mod query;
pub mod types;

pub use error::{ResultsError, ResultsResult};
