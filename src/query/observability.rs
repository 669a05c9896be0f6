use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ResultsError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QuerySeverity {
    /// Informational event.
    Info,
    /// Warning-level event (the call was rejected before any work was done).
    Warning,
    /// Error-level event (malformed tool output).
    Error,
    /// Critical error (the tool failed or could not be run).
    Critical,
}

impl QuerySeverity {
    /// Classify a failed query.
    pub fn for_error(e: &ResultsError) -> Self {
        match e {
            ResultsError::Io(_) | ResultsError::ToolFailed { .. } => Self::Critical,
            ResultsError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            ResultsError::ParseError { .. } | ResultsError::SchemaMismatch { .. } => Self::Error,
            ResultsError::InvalidArgument { .. } | ResultsError::Json(_) => Self::Warning,
        }
    }
}

/// Context about one query call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// Query entry point, e.g. `"scalars"` or `"itervars"`.
    pub query: &'static str,
    /// Filter expression as given by the caller.
    pub filter: Option<String>,
}

/// Shape of a successfully returned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStats {
    pub rows: usize,
    pub columns: usize,
}

/// Hint reported when a metadata query comes back empty.
pub const EMPTY_RESULT_HINT: &str = "scavetool returned an empty result; consider adding a project name to directory mapping, for example: -p /aloha=../aloha";

/// Observer interface for query outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait QueryObserver: Send + Sync {
    /// Called when a query returns a table.
    fn on_success(&self, _ctx: &QueryContext, _stats: QueryStats) {}

    /// Called when a query fails.
    fn on_failure(&self, _ctx: &QueryContext, _severity: QuerySeverity, _error: &ResultsError) {}

    /// Called when a query failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &QueryContext, severity: QuerySeverity, error: &ResultsError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called when a metadata query produced no rows. Not a failure.
    fn on_empty_result(&self, _ctx: &QueryContext, _hint: &str) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn QueryObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn QueryObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl QueryObserver for CompositeObserver {
    fn on_success(&self, ctx: &QueryContext, stats: QueryStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &QueryContext, severity: QuerySeverity, error: &ResultsError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &QueryContext, severity: QuerySeverity, error: &ResultsError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_empty_result(&self, ctx: &QueryContext, hint: &str) {
        for o in &self.observers {
            o.on_empty_result(ctx, hint);
        }
    }
}

/// Forwards query events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn on_success(&self, ctx: &QueryContext, stats: QueryStats) {
        info!(
            query = ctx.query,
            filter = ?ctx.filter,
            rows = stats.rows,
            columns = stats.columns,
            "query ok"
        );
    }

    fn on_failure(&self, ctx: &QueryContext, severity: QuerySeverity, error: &ResultsError) {
        warn!(query = ctx.query, filter = ?ctx.filter, ?severity, %error, "query failed");
    }

    fn on_alert(&self, ctx: &QueryContext, severity: QuerySeverity, error: &ResultsError) {
        error!(query = ctx.query, filter = ?ctx.filter, ?severity, %error, "query alert");
    }

    fn on_empty_result(&self, ctx: &QueryContext, hint: &str) {
        warn!(query = ctx.query, filter = ?ctx.filter, "{hint}");
    }
}
