//! CSV-R result stream parsing.
//!
//! The extraction tool writes one header row followed by one record per result item. The column
//! set is the union over every kind present; cells that do not apply to a row's kind are empty.

use std::path::Path;

use tracing::debug;

use crate::error::{ResultsError, ResultsResult};
use crate::model::{ResultKind, column_data_type, columns};
use crate::types::{Field, Schema, Table, Value};

use super::coerce::{coerce_cell, parse_float};

/// Parse a CSV-R file into a [`Table`].
pub fn read_results_csv_from_path(path: impl AsRef<Path>) -> ResultsResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    read_results_csv_from_reader(&mut rdr)
}

/// Parse CSV-R output captured in memory.
pub fn read_results_csv(bytes: &[u8]) -> ResultsResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    read_results_csv_from_reader(&mut rdr)
}

/// Parse CSV-R data from an existing CSV reader.
///
/// Rules:
///
/// - Every column is coerced by its declared type (see [`column_data_type`]); unknown columns are
///   kept as opaque text.
/// - If a `type` column exists, rows are normalized by kind (see [`normalize_by_type`]).
/// - The `run` column is renamed to `runID`.
/// - An empty stream yields an empty table.
pub fn read_results_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> ResultsResult<Table> {
    let headers = rdr.headers()?.clone();
    let fields: Vec<Field> = headers
        .iter()
        .map(|h| Field::new(h, column_data_type(h)))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            row.push(coerce_cell(user_row, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    let mut table = Table::new(Schema::new(fields), rows);
    if !table.is_empty() && table.schema.contains(columns::TYPE) {
        normalize_by_type(&mut table)?;
    }
    table.rename_column(columns::RUN, columns::RUN_ID);

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "parsed result stream"
    );
    Ok(table)
}

/// Column positions used by [`normalize_by_type`], resolved once per table.
#[derive(Debug, Clone, Copy)]
struct KindColumns {
    type_idx: usize,
    value: Option<usize>,
    vectime: Option<usize>,
    vecvalue: Option<usize>,
    binedges: Option<usize>,
    binvalues: Option<usize>,
}

impl KindColumns {
    fn resolve(schema: &Schema) -> Option<Self> {
        Some(Self {
            type_idx: schema.index_of(columns::TYPE)?,
            value: schema.index_of(columns::VALUE),
            vectime: schema.index_of(columns::VECTIME),
            vecvalue: schema.index_of(columns::VECVALUE),
            binedges: schema.index_of(columns::BINEDGES),
            binvalues: schema.index_of(columns::BINVALUES),
        })
    }
}

/// One pass over a mixed-kind table, fixing up cells by each row's declared kind:
///
/// - `scalar`: `value` is forced through the float coercer.
/// - `vector`: absent `vectime`/`vecvalue` become empty arrays.
/// - `histogram`: absent `binedges`/`binvalues` become empty arrays.
///
/// Rows of other kinds are left as coerced. Tables without a `type` column are untouched.
pub fn normalize_by_type(table: &mut Table) -> ResultsResult<()> {
    let Some(cols) = KindColumns::resolve(&table.schema) else {
        return Ok(());
    };

    for (row_idx0, row) in table.rows.iter_mut().enumerate() {
        let kind = match &row[cols.type_idx] {
            Value::Utf8(tag) => ResultKind::from_type_tag(tag),
            _ => None,
        };
        match kind {
            Some(ResultKind::Scalar) => {
                if let Some(i) = cols.value {
                    row[i] = scalar_value(row_idx0 + 2, &row[i])?;
                }
            }
            Some(ResultKind::Vector) => {
                fill_empty_array(row, cols.vectime);
                fill_empty_array(row, cols.vecvalue);
            }
            Some(ResultKind::Histogram) => {
                fill_empty_array(row, cols.binedges);
                fill_empty_array(row, cols.binvalues);
            }
            _ => {}
        }
    }
    Ok(())
}

fn scalar_value(row: usize, cell: &Value) -> ResultsResult<Value> {
    match cell {
        Value::Null => Ok(Value::Float64(f64::NAN)),
        Value::Utf8(raw) => parse_float(raw).map_err(|message| ResultsError::ParseError {
            row,
            column: columns::VALUE.to_string(),
            raw: raw.clone(),
            message,
        }),
        Value::Int64(v) => Ok(Value::Float64(*v as f64)),
        other => Ok(other.clone()),
    }
}

fn fill_empty_array(row: &mut [Value], idx: Option<usize>) {
    if let Some(i) = idx {
        if matches!(row[i], Value::Null) {
            row[i] = Value::FloatArray(Vec::new());
        }
    }
}
