//! Per-column cell coercion.
//!
//! Absence is decided on the raw text before any parsing: only the empty string is missing.
//! Anything else, including `0`, `0.0` and whitespace, goes to the parser and either yields a
//! value or fails the ingestion.

use crate::error::{ResultsError, ResultsResult};
use crate::types::{DataType, Value};

/// Integer-or-missing. Empty → NaN; otherwise the cell must parse as an integer.
pub fn parse_int(raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return Ok(Value::Float64(f64::NAN));
    }
    raw.trim()
        .parse::<i64>()
        .map(Value::Int64)
        .map_err(|e| e.to_string())
}

/// Float-or-missing. Empty → NaN; otherwise the cell must parse as a float.
pub fn parse_float(raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return Ok(Value::Float64(f64::NAN));
    }
    raw.trim()
        .parse::<f64>()
        .map(Value::Float64)
        .map_err(|e| e.to_string())
}

/// Numeric-array-or-missing. Empty → [`Value::Null`] (normalized later by row type); otherwise
/// whitespace-separated floats in order.
pub fn parse_array(raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    raw.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|e| format!("invalid array element '{tok}': {e}"))
        })
        .collect::<Result<Vec<f64>, String>>()
        .map(Value::FloatArray)
}

/// Opaque text. Empty → [`Value::Null`].
pub fn parse_text(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::Utf8(raw.to_owned())
    }
}

/// Coerce one raw cell according to its column's declared type.
///
/// `row` is the 1-based line number reported on failure.
pub fn coerce_cell(row: usize, column: &str, data_type: DataType, raw: &str) -> ResultsResult<Value> {
    let parsed = match data_type {
        DataType::Int64 => parse_int(raw),
        DataType::Float64 => parse_float(raw),
        DataType::FloatArray => parse_array(raw),
        DataType::Utf8 | DataType::Generic => Ok(parse_text(raw)),
    };
    parsed.map_err(|message| ResultsError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    })
}
