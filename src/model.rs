//! Typed view over result tables.
//!
//! A parsed CSV-R stream is a mixed-kind [`Table`]: every row carries a `type` tag and only the
//! columns that matter for that kind. [`ResultItem`] is the per-row tagged union, projected on
//! demand with [`Table::result_items`] / [`Table::items_of_kind`].

use std::fmt;

use crate::error::{ResultsError, ResultsResult};
use crate::types::{DataType, Table, Value};

/// Column names used across the pipeline.
pub mod columns {
    pub const RUN: &str = "run";
    pub const RUN_ID: &str = "runID";
    pub const TYPE: &str = "type";
    pub const MODULE: &str = "module";
    pub const NAME: &str = "name";
    pub const VALUE: &str = "value";
    pub const ATTRNAME: &str = "attrname";
    pub const ATTRVALUE: &str = "attrvalue";
    pub const COUNT: &str = "count";
    pub const SUMWEIGHTS: &str = "sumweights";
    pub const MEAN: &str = "mean";
    pub const STDDEV: &str = "stddev";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const UNDERFLOWS: &str = "underflows";
    pub const OVERFLOWS: &str = "overflows";
    pub const BINEDGES: &str = "binedges";
    pub const BINVALUES: &str = "binvalues";
    pub const VECTIME: &str = "vectime";
    pub const VECVALUE: &str = "vecvalue";
}

use columns::*;

const SCALAR_COLUMNS: &[&str] = &[VALUE];
const STATISTIC_COLUMNS: &[&str] = &[COUNT, SUMWEIGHTS, MEAN, STDDEV, MIN, MAX];
const HISTOGRAM_COLUMNS: &[&str] = &[
    COUNT, SUMWEIGHTS, MEAN, STDDEV, MIN, MAX, UNDERFLOWS, OVERFLOWS, BINEDGES, BINVALUES,
];
const VECTOR_COLUMNS: &[&str] = &[VECTIME, VECVALUE];
const PARAMETER_COLUMNS: &[&str] = &[VALUE];

/// Declared type of a known CSV-R column; anything else is [`DataType::Generic`].
pub fn column_data_type(name: &str) -> DataType {
    match name {
        COUNT => DataType::Int64,
        SUMWEIGHTS | MEAN | STDDEV | MIN | MAX | UNDERFLOWS | OVERFLOWS => DataType::Float64,
        BINEDGES | BINVALUES | VECTIME | VECVALUE => DataType::FloatArray,
        RUN | RUN_ID | TYPE | MODULE | NAME | ATTRNAME | ATTRVALUE => DataType::Utf8,
        _ => DataType::Generic,
    }
}

/// Kind of a CSV-R row, as given by its `type` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Scalar,
    Vector,
    Statistic,
    Histogram,
    Parameter,
    /// Result attribute (e.g. `unit`, `title`) attached to one result item.
    Attr,
    RunAttr,
    IterVar,
    Config,
}

impl ResultKind {
    /// The five kinds that carry a result payload.
    pub const RESULTS: [ResultKind; 5] = [
        ResultKind::Scalar,
        ResultKind::Vector,
        ResultKind::Statistic,
        ResultKind::Histogram,
        ResultKind::Parameter,
    ];

    /// Parse a CSV-R `type` cell.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "scalar" => Some(Self::Scalar),
            "vector" => Some(Self::Vector),
            "statistic" => Some(Self::Statistic),
            "histogram" => Some(Self::Histogram),
            "param" | "parameter" => Some(Self::Parameter),
            "attr" => Some(Self::Attr),
            "runattr" => Some(Self::RunAttr),
            "itervar" => Some(Self::IterVar),
            "config" => Some(Self::Config),
            _ => None,
        }
    }

    /// The tag this kind is written with in CSV-R output.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Statistic => "statistic",
            Self::Histogram => "histogram",
            Self::Parameter => "param",
            Self::Attr => "attr",
            Self::RunAttr => "runattr",
            Self::IterVar => "itervar",
            Self::Config => "config",
        }
    }

    /// Letter passed to the export command's `-T` type filter.
    pub fn export_filter(&self) -> Option<&'static str> {
        match self {
            Self::Scalar => Some("s"),
            Self::Vector => Some("v"),
            Self::Statistic => Some("t"),
            Self::Histogram => Some("h"),
            Self::Parameter => Some("p"),
            _ => None,
        }
    }

    /// Columns every pivoted table of this kind must contain.
    pub fn mandatory_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Scalar => SCALAR_COLUMNS,
            Self::Vector => VECTOR_COLUMNS,
            Self::Statistic => STATISTIC_COLUMNS,
            Self::Histogram => HISTOGRAM_COLUMNS,
            Self::Parameter => PARAMETER_COLUMNS,
            _ => &[],
        }
    }

    /// `true` for kinds that carry a result payload (as opposed to metadata rows).
    pub fn is_result(&self) -> bool {
        Self::RESULTS.contains(self)
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Summary statistics shared by statistics and histograms.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub count: Option<i64>,
    pub sumweights: f64,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Kind-specific payload of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Scalar {
        value: f64,
    },
    Vector {
        vectime: Vec<f64>,
        vecvalue: Vec<f64>,
    },
    Statistic(Statistics),
    Histogram {
        stats: Statistics,
        underflows: f64,
        overflows: f64,
        binedges: Vec<f64>,
        binvalues: Vec<f64>,
    },
    Parameter {
        value: Option<String>,
    },
    /// Attribute row (`attr`, `runattr`, `itervar`, `config`).
    Attribute {
        kind: ResultKind,
        name: Option<String>,
        value: Option<String>,
    },
}

impl ResultPayload {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Scalar { .. } => ResultKind::Scalar,
            Self::Vector { .. } => ResultKind::Vector,
            Self::Statistic(_) => ResultKind::Statistic,
            Self::Histogram { .. } => ResultKind::Histogram,
            Self::Parameter { .. } => ResultKind::Parameter,
            Self::Attribute { kind, .. } => *kind,
        }
    }
}

/// One extracted item: a row of a CSV-R stream in typed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub run_id: String,
    pub module: Option<String>,
    pub name: Option<String>,
    pub payload: ResultPayload,
}

/// One row of a metadata query (`runID`, and for non-run-list queries `name`/`value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub run_id: String,
    pub name: Option<String>,
    pub value: Option<String>,
}

/// A column position resolved once per table, with its name kept for error messages.
#[derive(Debug, Clone, Copy)]
struct Col {
    idx: Option<usize>,
    name: &'static str,
}

impl Col {
    fn resolve(table: &Table, name: &'static str) -> Self {
        Self {
            idx: table.index_of(name),
            name,
        }
    }
}

/// Positions of every CSV-R column a projection reads.
#[derive(Debug, Clone, Copy)]
struct ItemColumns {
    run: Col,
    kind: Col,
    module: Col,
    name: Col,
    value: Col,
    attrname: Col,
    attrvalue: Col,
    count: Col,
    sumweights: Col,
    mean: Col,
    stddev: Col,
    min: Col,
    max: Col,
    underflows: Col,
    overflows: Col,
    binedges: Col,
    binvalues: Col,
    vectime: Col,
    vecvalue: Col,
}

impl ItemColumns {
    fn resolve(table: &Table) -> Self {
        let run = if table.schema.contains(RUN_ID) { RUN_ID } else { RUN };
        let col = |name| Col::resolve(table, name);
        Self {
            run: col(run),
            kind: col(TYPE),
            module: col(MODULE),
            name: col(NAME),
            value: col(VALUE),
            attrname: col(ATTRNAME),
            attrvalue: col(ATTRVALUE),
            count: col(COUNT),
            sumweights: col(SUMWEIGHTS),
            mean: col(MEAN),
            stddev: col(STDDEV),
            min: col(MIN),
            max: col(MAX),
            underflows: col(UNDERFLOWS),
            overflows: col(OVERFLOWS),
            binedges: col(BINEDGES),
            binvalues: col(BINVALUES),
            vectime: col(VECTIME),
            vecvalue: col(VECVALUE),
        }
    }
}

/// Typed accessor over one table row.
struct RowView<'a> {
    row: &'a [Value],
    row_num: usize,
}

impl<'a> RowView<'a> {
    fn cell(&self, col: Col) -> Option<&'a Value> {
        col.idx.map(|i| &self.row[i])
    }

    fn string(&self, col: Col) -> Option<String> {
        match self.cell(col)? {
            Value::Null => None,
            Value::Utf8(s) => Some(s.clone()),
            other => other.group_key(),
        }
    }

    fn required_string(&self, col: Col) -> ResultsResult<String> {
        self.string(col).ok_or_else(|| {
            ResultsError::schema_mismatch(format!("row {} has no '{}'", self.row_num, col.name))
        })
    }

    fn float(&self, col: Col) -> ResultsResult<f64> {
        match self.cell(col) {
            None => Ok(f64::NAN),
            Some(Value::Utf8(raw)) => raw.trim().parse::<f64>().map_err(|e| ResultsError::ParseError {
                row: self.row_num,
                column: col.name.to_string(),
                raw: raw.clone(),
                message: e.to_string(),
            }),
            Some(v) => v.as_f64().ok_or_else(|| {
                ResultsError::schema_mismatch(format!(
                    "row {} column '{}' is not numeric",
                    self.row_num, col.name
                ))
            }),
        }
    }

    fn array(&self, col: Col) -> Vec<f64> {
        self.cell(col)
            .and_then(Value::as_array)
            .map(<[f64]>::to_vec)
            .unwrap_or_default()
    }

    fn statistics(&self, cols: &ItemColumns) -> ResultsResult<Statistics> {
        Ok(Statistics {
            count: self.cell(cols.count).and_then(Value::as_i64),
            sumweights: self.float(cols.sumweights)?,
            mean: self.float(cols.mean)?,
            stddev: self.float(cols.stddev)?,
            min: self.float(cols.min)?,
            max: self.float(cols.max)?,
        })
    }
}

impl Table {
    /// Project every row into a typed [`ResultItem`].
    ///
    /// The kind of each row comes from its `type` cell; tables without a `type` column must use
    /// [`Table::items_of_kind`] instead.
    pub fn result_items(&self) -> ResultsResult<Vec<ResultItem>> {
        if !self.schema.contains(TYPE) {
            return Err(ResultsError::schema_mismatch(
                "table has no 'type' column; use items_of_kind for type-filtered exports",
            ));
        }
        self.project(None)
    }

    /// Project the rows of one kind. Rows of other kinds are skipped; a table without a `type`
    /// column is treated as holding only `kind`.
    pub fn items_of_kind(&self, kind: ResultKind) -> ResultsResult<Vec<ResultItem>> {
        self.project(Some(kind))
    }

    fn project(&self, only: Option<ResultKind>) -> ResultsResult<Vec<ResultItem>> {
        let cols = ItemColumns::resolve(self);
        let mut out = Vec::with_capacity(self.row_count());

        for (idx0, row) in self.rows.iter().enumerate() {
            let view = RowView { row, row_num: idx0 + 2 };
            let kind = match view.cell(cols.kind) {
                Some(Value::Utf8(tag)) => ResultKind::from_type_tag(tag).ok_or_else(|| {
                    ResultsError::schema_mismatch(format!(
                        "row {} has unknown result type '{tag}'",
                        view.row_num
                    ))
                })?,
                Some(_) => {
                    return Err(ResultsError::schema_mismatch(format!(
                        "row {} has no result type",
                        view.row_num
                    )));
                }
                None => only.ok_or_else(|| ResultsError::schema_mismatch("table has no 'type' column"))?,
            };
            if only.is_some_and(|k| k != kind) {
                continue;
            }

            let payload = match kind {
                ResultKind::Scalar => ResultPayload::Scalar {
                    value: view.float(cols.value)?,
                },
                ResultKind::Vector => ResultPayload::Vector {
                    vectime: view.array(cols.vectime),
                    vecvalue: view.array(cols.vecvalue),
                },
                ResultKind::Statistic => ResultPayload::Statistic(view.statistics(&cols)?),
                ResultKind::Histogram => ResultPayload::Histogram {
                    stats: view.statistics(&cols)?,
                    underflows: view.float(cols.underflows)?,
                    overflows: view.float(cols.overflows)?,
                    binedges: view.array(cols.binedges),
                    binvalues: view.array(cols.binvalues),
                },
                ResultKind::Parameter => ResultPayload::Parameter {
                    value: view.string(cols.value),
                },
                ResultKind::Attr | ResultKind::RunAttr | ResultKind::IterVar | ResultKind::Config => {
                    ResultPayload::Attribute {
                        kind,
                        name: view.string(cols.attrname),
                        value: view.string(cols.attrvalue),
                    }
                }
            };

            out.push(ResultItem {
                run_id: view.required_string(cols.run)?,
                module: view.string(cols.module),
                name: view.string(cols.name),
                payload,
            });
        }

        Ok(out)
    }

    /// Project a metadata table (`runID` plus optional `name`/`value`) into [`MetadataRow`]s.
    pub fn metadata_rows(&self) -> ResultsResult<Vec<MetadataRow>> {
        if !self.schema.contains(RUN_ID) {
            return Err(ResultsError::schema_mismatch("metadata table has no 'runID' column"));
        }
        let (run, name, value) = (
            Col::resolve(self, RUN_ID),
            Col::resolve(self, NAME),
            Col::resolve(self, VALUE),
        );
        self.rows
            .iter()
            .enumerate()
            .map(|(idx0, row)| {
                let view = RowView { row, row_num: idx0 + 1 };
                Ok(MetadataRow {
                    run_id: view.required_string(run)?,
                    name: view.string(name),
                    value: view.string(value),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Schema};

    fn utf8(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    #[test]
    fn type_tags_round_trip_and_accept_parameter_alias() {
        for kind in [
            ResultKind::Scalar,
            ResultKind::Vector,
            ResultKind::Statistic,
            ResultKind::Histogram,
            ResultKind::Parameter,
            ResultKind::Attr,
            ResultKind::RunAttr,
            ResultKind::IterVar,
            ResultKind::Config,
        ] {
            assert_eq!(ResultKind::from_type_tag(kind.type_tag()), Some(kind));
        }
        assert_eq!(ResultKind::from_type_tag("parameter"), Some(ResultKind::Parameter));
        assert_eq!(ResultKind::from_type_tag("bogus"), None);
    }

    #[test]
    fn histogram_mandatory_columns_extend_statistics() {
        let hist = ResultKind::Histogram.mandatory_columns();
        for c in ResultKind::Statistic.mandatory_columns() {
            assert!(hist.contains(c));
        }
        assert!(hist.contains(&"binedges"));
        assert!(ResultKind::RunAttr.mandatory_columns().is_empty());
    }

    #[test]
    fn projects_mixed_rows_into_tagged_payloads() {
        let schema = Schema::new(vec![
            Field::new("runID", DataType::Utf8),
            Field::new("type", DataType::Utf8),
            Field::new("module", DataType::Utf8),
            Field::new("name", DataType::Utf8),
            Field::new("attrname", DataType::Utf8),
            Field::new("attrvalue", DataType::Utf8),
            Field::new("value", DataType::Generic),
            Field::new("vectime", DataType::FloatArray),
            Field::new("vecvalue", DataType::FloatArray),
        ]);
        let rows = vec![
            vec![
                utf8("Run-0"),
                utf8("scalar"),
                utf8("Net.host"),
                utf8("delay"),
                Value::Null,
                Value::Null,
                Value::Float64(3.5),
                Value::Null,
                Value::Null,
            ],
            vec![
                utf8("Run-0"),
                utf8("vector"),
                utf8("Net.host"),
                utf8("queueLen"),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::FloatArray(vec![0.0, 1.0]),
                Value::FloatArray(vec![2.0, 3.0]),
            ],
            vec![
                utf8("Run-0"),
                utf8("itervar"),
                Value::Null,
                Value::Null,
                utf8("N"),
                utf8("10"),
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        ];
        let table = Table::new(schema, rows);

        let items = table.result_items().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].payload, ResultPayload::Scalar { value: 3.5 });
        assert_eq!(
            items[1].payload,
            ResultPayload::Vector {
                vectime: vec![0.0, 1.0],
                vecvalue: vec![2.0, 3.0]
            }
        );
        assert_eq!(items[2].payload.kind(), ResultKind::IterVar);
        assert_eq!(items[2].module, None);

        let vectors = table.items_of_kind(ResultKind::Vector).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].name.as_deref(), Some("queueLen"));
    }

    #[test]
    fn projection_reads_columns_by_position_in_any_order() {
        // no `type` column, `mean` first, `stddev` absent
        let schema = Schema::new(vec![
            Field::new("mean", DataType::Utf8),
            Field::new("name", DataType::Utf8),
            Field::new("count", DataType::Int64),
            Field::new("run", DataType::Utf8),
        ]);
        let rows = vec![
            vec![utf8("2.5"), utf8("delay"), Value::Int64(4), utf8("Run-0")],
            vec![utf8("oops"), utf8("jitter"), Value::Int64(1), utf8("Run-1")],
        ];
        let table = Table::new(schema, rows);

        let err = table.items_of_kind(ResultKind::Statistic).unwrap_err();
        assert!(matches!(err, ResultsError::ParseError { row: 3, ref column, .. } if column == "mean"));

        let first = table.filter_rows(|row| row[1] == utf8("delay"));
        let items = first.items_of_kind(ResultKind::Statistic).unwrap();
        assert_eq!(items[0].run_id, "Run-0");
        match &items[0].payload {
            ResultPayload::Statistic(stats) => {
                assert_eq!(stats.count, Some(4));
                assert_eq!(stats.mean, 2.5);
                assert!(stats.stddev.is_nan());
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn metadata_rows_require_run_id() {
        let schema = Schema::new(vec![Field::new("runID", DataType::Utf8)]);
        let table = Table::new(schema, vec![vec![utf8("Run-0")], vec![utf8("Run-1")]]);
        let rows = table.metadata_rows().unwrap();
        assert_eq!(rows[1].run_id, "Run-1");
        assert_eq!(rows[1].name, None);

        let bare = Table::default();
        assert!(bare.metadata_rows().is_err());
    }
}
