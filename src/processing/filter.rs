//! Row filtering for [`crate::types::Table`].

use crate::error::{ResultsError, ResultsResult};
use crate::model::{ResultKind, columns};
use crate::types::{Table, Value};

/// Returns a new [`Table`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`Table::filter_rows`].
pub fn filter<F>(table: &Table, predicate: F) -> Table
where
    F: FnMut(&[Value]) -> bool,
{
    table.filter_rows(predicate)
}

/// Keep only rows whose `type` cell names one of `kinds`.
///
/// A zero-row table passes through unchanged even without a `type` column.
pub fn filter_by_kinds(table: &Table, kinds: &[ResultKind]) -> ResultsResult<Table> {
    let Some(type_idx) = table.index_of(columns::TYPE) else {
        if table.is_empty() {
            return Ok(table.clone());
        }
        return Err(ResultsError::schema_mismatch(
            "cannot restrict row types: table has no 'type' column",
        ));
    };

    Ok(table.filter_rows(|row| match &row[type_idx] {
        Value::Utf8(tag) => ResultKind::from_type_tag(tag).is_some_and(|k| kinds.contains(&k)),
        _ => false,
    }))
}
