//! Column-set guarantees applied after pivoting.

use crate::error::{ResultsError, ResultsResult};
use crate::ingestion::coerce::parse_float;
use crate::model::column_data_type;
use crate::types::{DataType, Table, Value};

/// Make sure every column in `names` exists, creating absent ones as all-missing columns of the
/// column's declared type.
pub fn ensure_columns(table: &mut Table, names: &[&str]) {
    for name in names {
        table.ensure_column(name, column_data_type(name));
    }
}

/// Drop columns whose cells are all missing. A zero-row table has no values in any column, so it
/// loses every column.
pub fn prune_unused_columns(table: &mut Table) {
    table.drop_columns_where(|_, cells| cells.iter().all(|v| v.is_missing()));
}

/// Apply the mandatory-column guarantee, then prune if requested. Pruning sees the guaranteed
/// columns, so an all-missing mandatory column survives only when `prune` is `false`.
pub fn finalize_columns(table: &mut Table, mandatory: &[&str], prune: bool) {
    ensure_columns(table, mandatory);
    if prune {
        prune_unused_columns(table);
    }
}

/// Convert a column to [`DataType::Float64`], failing on any text that is not a number.
///
/// Error rows are 1-based and count the header line, like the CSV-R parser's.
pub fn to_numeric(table: &mut Table, name: &str) -> ResultsResult<()> {
    let Some(idx) = table.index_of(name) else {
        return Ok(());
    };

    for (row_idx0, row) in table.rows.iter_mut().enumerate() {
        let converted = match &row[idx] {
            Value::Null => Value::Float64(f64::NAN),
            Value::Int64(v) => Value::Float64(*v as f64),
            Value::Float64(v) => Value::Float64(*v),
            Value::Utf8(raw) => parse_float(raw).map_err(|message| ResultsError::ParseError {
                row: row_idx0 + 2,
                column: name.to_string(),
                raw: raw.clone(),
                message,
            })?,
            Value::FloatArray(_) => {
                return Err(ResultsError::ParseError {
                    row: row_idx0 + 2,
                    column: name.to_string(),
                    raw: "<array>".to_string(),
                    message: "array is not a number".to_string(),
                });
            }
        };
        row[idx] = converted;
    }
    table.schema.fields[idx].data_type = DataType::Float64;
    Ok(())
}
