use thiserror::Error;

/// Convenience result type for ingestion and query operations.
pub type ResultsResult<T> = Result<T, ResultsError>;

/// Error type returned by parsing, pivoting and query functions.
///
/// A failing call never returns a partial table.
#[derive(Debug, Error)]
pub enum ResultsError {
    /// Underlying I/O error (e.g. the extraction tool could not be spawned).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV/TSV framing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be decoded.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller supplied an argument that cannot be used (e.g. an empty filter expression).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The extraction tool exited unsuccessfully.
    #[error("{} (exit code {})", .stderr.trim(), exit_code_text(.exit_code))]
    ToolFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The table does not have the shape an operation requires (missing key columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A cell could not be coerced to its column's declared type.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

impl ResultsError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}

fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}
