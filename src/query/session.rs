//! Result queries over a caller-owned session.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::ResultsResult;
use crate::ingestion::{MetadataLayout, read_metadata_tsv, read_results_csv};
use crate::model::{ResultKind, columns};
use crate::processing::{
    append_metadata_columns, append_result_attributes, ensure_columns, filter_by_kinds, finalize_columns,
    prune_unused_columns, to_numeric,
};
use crate::types::{Table, Value};

use super::observability::{EMPTY_RESULT_HINT, QueryContext, QueryObserver, QuerySeverity, QueryStats};
use super::tool::{ExportExtras, ExtractionTool, MetadataQuery, Scavetool, export_args, query_args, validate_filter};

/// Which metadata to merge into a query's table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataInclusion {
    /// Result attributes (`unit`, `title`, ...), one column per attribute name. Result queries
    /// only.
    pub attrs: bool,
    /// Run attributes, as `<name>_runattr` columns.
    pub runattrs: bool,
    /// Iteration variables, as `<name>_itervar` columns.
    pub itervars: bool,
    /// Parameter assignments, as `<name>_param` columns. Ignored when `config_entries` is set,
    /// since config entries already contain them.
    pub param_assignments: bool,
    /// Config entries, as `<name>_config` columns.
    pub config_entries: bool,
}

impl MetadataInclusion {
    /// Include nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Include every kind of metadata.
    pub fn all() -> Self {
        Self {
            attrs: true,
            runattrs: true,
            itervars: true,
            param_assignments: true,
            config_entries: true,
        }
    }

    /// Auxiliary metadata queries to run, in merge order.
    fn auxiliary_queries(&self) -> Vec<MetadataQuery> {
        [
            (self.itervars, MetadataQuery::IterVars),
            (self.runattrs, MetadataQuery::RunAttrs),
            (self.config_entries, MetadataQuery::ConfigEntries),
            (
                self.param_assignments && !self.config_entries,
                MetadataQuery::ParamAssignments,
            ),
        ]
        .into_iter()
        .filter_map(|(wanted, q)| wanted.then_some(q))
        .collect()
    }
}

/// Options for [`ResultSession::get_results`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsOptions {
    /// Keep only rows of these kinds.
    pub row_types: Option<Vec<ResultKind>>,
    /// Drop columns that are missing in every row.
    pub omit_unused_columns: bool,
    /// Ask the tool to report statistic fields as extra scalars.
    pub include_fields_as_scalars: bool,
    /// Vector time window start.
    pub start_time: Option<f64>,
    /// Vector time window end.
    pub end_time: Option<f64>,
}

/// Options for the per-kind result queries.
///
/// `include_fields_as_scalars` applies to scalar queries and the time window to vector queries;
/// the other queries ignore them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryOptions {
    pub include: MetadataInclusion,
    pub include_fields_as_scalars: bool,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// Drop all-missing columns after the mandatory-column guarantee.
    pub omit_unused_columns: bool,
}

/// Entry point for result queries.
///
/// Owns the configuration (input patterns, tool settings) that every query reads. Each query
/// runs the extraction tool once per table it needs, parses the captured output, and returns a
/// fresh table; nothing is cached between calls.
pub struct ResultSession<T: ExtractionTool = Scavetool> {
    config: SessionConfig,
    tool: T,
    observer: Option<Arc<dyn QueryObserver>>,
    alert_at_or_above: QuerySeverity,
}

impl<T: ExtractionTool> fmt::Debug for ResultSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSession")
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl ResultSession<Scavetool> {
    /// Session running the tool named in `config`.
    pub fn new(config: SessionConfig) -> Self {
        let tool = Scavetool::from_config(&config);
        Self::with_tool(config, tool)
    }
}

impl<T: ExtractionTool> ResultSession<T> {
    /// Session running queries through `tool`.
    pub fn with_tool(config: SessionConfig, tool: T) -> Self {
        Self {
            config,
            tool,
            observer: None,
            alert_at_or_above: QuerySeverity::Critical,
        }
    }

    /// Attach an observer for query outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at which failures are also reported through `on_alert`.
    pub fn with_alert_threshold(mut self, severity: QuerySeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Replace the configured input patterns.
    pub fn set_inputs<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.inputs.set(patterns);
    }

    /// Union patterns into the configured inputs (deduplicated).
    pub fn add_inputs<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.inputs.add(patterns);
    }

    /// Add a single input pattern unless it is already configured.
    pub fn add_input(&mut self, pattern: impl Into<String>) {
        self.config.inputs.add_input(pattern);
    }

    /// All result rows matching `filter`, in the tool's mixed-kind long format.
    pub fn get_results(&self, filter: Option<&str>, opts: &ResultsOptions) -> ResultsResult<Table> {
        self.observe("results", filter, || {
            let extras = ExportExtras {
                include_fields_as_scalars: opts.include_fields_as_scalars,
                start_time: opts.start_time,
                end_time: opts.end_time,
            };
            let mut table = self.export(None, filter, &extras)?;
            if let Some(kinds) = &opts.row_types {
                table = filter_by_kinds(&table, kinds)?;
            }
            if opts.omit_unused_columns {
                prune_unused_columns(&mut table);
            }
            Ok(table)
        })
    }

    /// Scalars, one row per result item; `value` is numeric.
    pub fn get_scalars(&self, filter: Option<&str>, opts: &QueryOptions) -> ResultsResult<Table> {
        self.observe("scalars", filter, || {
            let extras = ExportExtras {
                include_fields_as_scalars: opts.include_fields_as_scalars,
                ..Default::default()
            };
            let mut table = self.results_of_kind(ResultKind::Scalar, filter, opts, &extras)?;
            to_numeric(&mut table, columns::VALUE)?;
            Ok(table)
        })
    }

    /// Vectors, optionally cropped to the `[start_time, end_time]` window.
    pub fn get_vectors(&self, filter: Option<&str>, opts: &QueryOptions) -> ResultsResult<Table> {
        self.observe("vectors", filter, || {
            let extras = ExportExtras {
                start_time: opts.start_time,
                end_time: opts.end_time,
                ..Default::default()
            };
            self.results_of_kind(ResultKind::Vector, filter, opts, &extras)
        })
    }

    pub fn get_statistics(&self, filter: Option<&str>, opts: &QueryOptions) -> ResultsResult<Table> {
        self.observe("statistics", filter, || {
            self.results_of_kind(ResultKind::Statistic, filter, opts, &ExportExtras::default())
        })
    }

    pub fn get_histograms(&self, filter: Option<&str>, opts: &QueryOptions) -> ResultsResult<Table> {
        self.observe("histograms", filter, || {
            self.results_of_kind(ResultKind::Histogram, filter, opts, &ExportExtras::default())
        })
    }

    pub fn get_parameters(&self, filter: Option<&str>, opts: &QueryOptions) -> ResultsResult<Table> {
        self.observe("parameters", filter, || {
            self.results_of_kind(ResultKind::Parameter, filter, opts, &ExportExtras::default())
        })
    }

    /// Run IDs matching `filter`.
    pub fn get_runs(&self, filter: &str, include: &MetadataInclusion) -> ResultsResult<Table> {
        self.get_metadata("runs", MetadataQuery::Runs, filter, include)
    }

    pub fn get_runattrs(&self, filter: &str, include: &MetadataInclusion) -> ResultsResult<Table> {
        self.get_metadata("runattrs", MetadataQuery::RunAttrs, filter, include)
    }

    pub fn get_itervars(&self, filter: &str, include: &MetadataInclusion) -> ResultsResult<Table> {
        self.get_metadata("itervars", MetadataQuery::IterVars, filter, include)
    }

    pub fn get_config_entries(&self, filter: &str, include: &MetadataInclusion) -> ResultsResult<Table> {
        self.get_metadata("config_entries", MetadataQuery::ConfigEntries, filter, include)
    }

    pub fn get_param_assignments(&self, filter: &str, include: &MetadataInclusion) -> ResultsResult<Table> {
        self.get_metadata("param_assignments", MetadataQuery::ParamAssignments, filter, include)
    }

    fn get_metadata(
        &self,
        name: &'static str,
        query: MetadataQuery,
        filter: &str,
        include: &MetadataInclusion,
    ) -> ResultsResult<Table> {
        self.observe(name, Some(filter), || {
            let table = self.query_metadata(name, query, filter)?;
            self.merge_metadata(table, include)
        })
    }

    fn results_of_kind(
        &self,
        kind: ResultKind,
        filter: Option<&str>,
        opts: &QueryOptions,
        extras: &ExportExtras,
    ) -> ResultsResult<Table> {
        let raw = self.export(Some(kind), filter, extras)?;
        let mut table = self.pivot_results(raw, kind, &opts.include)?;
        finalize_columns(&mut table, kind.mandatory_columns(), opts.omit_unused_columns);
        Ok(table)
    }

    /// Split a typed export into result rows and `attr` rows, attach result attributes if asked,
    /// then merge run-level metadata.
    fn pivot_results(&self, raw: Table, kind: ResultKind, include: &MetadataInclusion) -> ResultsResult<Table> {
        let (mut items, attrs) = match raw.index_of(columns::TYPE) {
            Some(type_idx) => {
                let is = |row: &[Value], k: ResultKind| {
                    matches!(&row[type_idx], Value::Utf8(tag) if ResultKind::from_type_tag(tag) == Some(k))
                };
                (
                    raw.filter_rows(|row| is(row, kind)),
                    Some(raw.filter_rows(|row| is(row, ResultKind::Attr))),
                )
            }
            None => (raw, None),
        };

        items.drop_columns_where(|field, _| {
            matches!(field.name.as_str(), columns::TYPE | columns::ATTRNAME | columns::ATTRVALUE)
        });
        ensure_columns(&mut items, &[columns::RUN_ID, columns::MODULE, columns::NAME]);

        if include.attrs {
            if let Some(attrs) = attrs.filter(|a| !a.is_empty()) {
                items = append_result_attributes(&items, &attrs)?;
            }
        }

        self.merge_metadata(items, include)
    }

    fn merge_metadata(&self, mut table: Table, include: &MetadataInclusion) -> ResultsResult<Table> {
        for query in include.auxiliary_queries() {
            let aux = self.query_metadata("auxiliary", query, "*")?;
            table = append_metadata_columns(&table, &aux, query.column_suffix())?;
        }
        Ok(table)
    }

    fn export(&self, kind: Option<ResultKind>, filter: Option<&str>, extras: &ExportExtras) -> ResultsResult<Table> {
        validate_filter(filter)?;
        if self.config.require_matching_inputs {
            self.config.inputs.check_all_match()?;
        }
        let args = export_args(
            self.config.inputs.as_slice(),
            self.config.allow_nonmatching,
            kind.and_then(|k| k.export_filter()),
            filter,
            extras,
        );
        let stdout = self.tool.run(&args)?.into_stdout()?;
        read_results_csv(&stdout)
    }

    fn query_metadata(&self, name: &'static str, query: MetadataQuery, filter: &str) -> ResultsResult<Table> {
        validate_filter(Some(filter))?;
        if self.config.require_matching_inputs {
            self.config.inputs.check_all_match()?;
        }
        let args = query_args(self.config.inputs.as_slice(), self.config.allow_nonmatching, filter, query);
        let stdout = self.tool.run(&args)?.into_stdout()?;

        let layout = match query {
            MetadataQuery::Runs => MetadataLayout::Runs,
            _ => MetadataLayout::NameValue,
        };
        let table = read_metadata_tsv(&stdout, layout)?;
        debug!(query = name, flag = query.flag(), rows = table.row_count(), "metadata query");

        if table.is_empty() {
            warn!(query = name, filter, "{EMPTY_RESULT_HINT}");
            if let Some(obs) = self.observer.as_ref() {
                let ctx = QueryContext {
                    query: name,
                    filter: Some(filter.to_string()),
                };
                obs.on_empty_result(&ctx, EMPTY_RESULT_HINT);
            }
        }
        Ok(table)
    }

    fn observe<F>(&self, query: &'static str, filter: Option<&str>, run: F) -> ResultsResult<Table>
    where
        F: FnOnce() -> ResultsResult<Table>,
    {
        let result = run();

        if let Some(obs) = self.observer.as_ref() {
            let ctx = QueryContext {
                query,
                filter: filter.map(str::to_string),
            };
            match &result {
                Ok(table) => obs.on_success(
                    &ctx,
                    QueryStats {
                        rows: table.row_count(),
                        columns: table.column_count(),
                    },
                ),
                Err(e) => {
                    let sev = QuerySeverity::for_error(e);
                    obs.on_failure(&ctx, sev, e);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, e);
                    }
                }
            }
        }

        result
    }
}

/// One-shot export over explicit files, independent of any session's input patterns.
pub fn read_result_files<T, S>(tool: &T, files: &[S], filter: Option<&str>, extras: &ExportExtras) -> ResultsResult<Table>
where
    T: ExtractionTool + ?Sized,
    S: AsRef<str>,
{
    validate_filter(filter)?;
    let files: Vec<String> = files.iter().map(|f| f.as_ref().to_string()).collect();
    let args = export_args(&files, true, None, filter, extras);
    let stdout = tool.run(&args)?.into_stdout()?;
    read_results_csv(&stdout)
}
