//! Conversion of result tables into Polars data frames.

use std::collections::HashSet;

use polars::prelude::*;

use crate::error::{ResultsError, ResultsResult};
use crate::types::{DataType, Field, Table, Value};

/// Convert `table` into a [`DataFrame`] with one column per field.
///
/// Missing cells become nulls; array columns become `List(Float64)` columns, with empty arrays
/// kept as empty lists.
pub fn to_dataframe(table: &Table) -> ResultsResult<DataFrame> {
    let mut seen = HashSet::new();
    for name in table.schema.field_names() {
        if !seen.insert(name) {
            return Err(ResultsError::schema_mismatch(format!("duplicate column '{name}'")));
        }
    }

    Ok(table
        .schema
        .fields
        .iter()
        .enumerate()
        .map(|(idx, field)| column_series(table, idx, field))
        .collect())
}

fn column_series(table: &Table, idx: usize, field: &Field) -> Series {
    let name: PlSmallStr = field.name.as_str().into();
    let cells = || table.rows.iter().map(move |row| &row[idx]);

    match field.data_type {
        DataType::Int64 => Series::new(name, cells().map(Value::as_i64).collect::<Vec<_>>()),
        DataType::Float64 => Series::new(name, cells().map(float_cell).collect::<Vec<_>>()),
        DataType::FloatArray => {
            let lists: Vec<Series> = cells()
                .map(|v| Series::new(PlSmallStr::EMPTY, v.as_array().unwrap_or(&[])))
                .collect();
            Series::new(name, lists)
        }
        DataType::Utf8 | DataType::Generic => {
            let numeric = cells().all(|v| matches!(v, Value::Null | Value::Int64(_) | Value::Float64(_)));
            if numeric && field.data_type == DataType::Generic {
                Series::new(name, cells().map(float_cell).collect::<Vec<_>>())
            } else {
                Series::new(name, cells().map(text_cell).collect::<Vec<_>>())
            }
        }
    }
}

fn float_cell(v: &Value) -> Option<f64> {
    if v.is_missing() { None } else { v.as_f64() }
}

fn text_cell(v: &Value) -> Option<String> {
    match v {
        Value::Utf8(s) => Some(s.clone()),
        other => other.group_key(),
    }
}
