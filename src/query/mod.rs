//! Query layer: runs the extraction tool and turns its output into pivoted tables.
//!
//! - [`session`]: [`ResultSession`] and its per-kind and metadata queries
//! - [`tool`]: tool trait, subprocess runner and argument construction
//! - [`observability`]: observer hooks for query outcomes

pub mod observability;
pub mod session;
pub mod tool;

pub use observability::{
    CompositeObserver, EMPTY_RESULT_HINT, QueryContext, QueryObserver, QuerySeverity, QueryStats, TracingObserver,
};
pub use session::{MetadataInclusion, QueryOptions, ResultSession, ResultsOptions, read_result_files};
pub use tool::{ExportExtras, ExtractionTool, MetadataQuery, Scavetool, ToolOutput, export_args, query_args};
