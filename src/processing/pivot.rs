//! Long ↔ wide reshaping.
//!
//! [`pivot_wide`] turns one row per (entity, attribute) into one row per entity with one column
//! per attribute; [`melt`] goes the other way.

use std::collections::HashMap;

use crate::error::{ResultsError, ResultsResult};
use crate::model::columns;
use crate::types::{DataType, Field, Schema, Table, Value};

/// Reshape `table` so each distinct `columns` cell becomes a column holding the `values` cell,
/// with one output row per distinct combination of the `index` columns.
///
/// - Groups and new columns appear in first-seen order.
/// - Rows whose index or column-name cell is missing are skipped.
/// - If a (group, column) pair occurs more than once, the first row wins.
/// - Unfilled cells get the missing marker of the `values` column's type, so the result is always
///   rectangular.
/// - A new column whose name collides with an index column is named `<name>_<values>`.
///
/// ```rust
/// use scave_results::processing::pivot_wide;
/// use scave_results::types::{DataType, Field, Schema, Table, Value};
///
/// let long = Table::new(
///     Schema::new(vec![
///         Field::new("runID", DataType::Utf8),
///         Field::new("name", DataType::Utf8),
///         Field::new("value", DataType::Utf8),
///     ]),
///     vec![
///         vec![Value::Utf8("Run-0".into()), Value::Utf8("N".into()), Value::Utf8("10".into())],
///         vec![Value::Utf8("Run-1".into()), Value::Utf8("N".into()), Value::Utf8("20".into())],
///     ],
/// );
/// let wide = pivot_wide(&long, &["runID"], "name", "value").unwrap();
/// assert_eq!(wide.value(1, "N"), Some(&Value::Utf8("20".into())));
/// ```
pub fn pivot_wide(table: &Table, index: &[&str], columns: &str, values: &str) -> ResultsResult<Table> {
    let index_idxs = index
        .iter()
        .map(|name| require_column(table, name))
        .collect::<ResultsResult<Vec<usize>>>()?;
    let column_idx = require_column(table, columns)?;
    let value_idx = require_column(table, values)?;
    let value_type = table.schema.fields[value_idx].data_type;

    let mut group_lookup: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, HashMap<usize, Value>)> = Vec::new();
    let mut column_lookup: HashMap<String, usize> = HashMap::new();
    let mut new_columns: Vec<String> = Vec::new();

    for row in &table.rows {
        let Some(key) = index_idxs
            .iter()
            .map(|&i| row[i].group_key())
            .collect::<Option<Vec<String>>>()
        else {
            continue;
        };
        let Some(column_name) = row[column_idx].group_key() else {
            continue;
        };

        let col_pos = *column_lookup.entry(column_name).or_insert_with_key(|name| {
            new_columns.push(name.clone());
            new_columns.len() - 1
        });
        let group_pos = *group_lookup.entry(key).or_insert_with(|| {
            let ids = index_idxs.iter().map(|&i| row[i].clone()).collect();
            groups.push((ids, HashMap::new()));
            groups.len() - 1
        });

        groups[group_pos]
            .1
            .entry(col_pos)
            .or_insert_with(|| row[value_idx].clone());
    }

    let mut fields: Vec<Field> = index_idxs
        .iter()
        .map(|&i| table.schema.fields[i].clone())
        .collect();
    for name in &new_columns {
        let out_name = if index.contains(&name.as_str()) {
            format!("{name}_{values}")
        } else {
            name.clone()
        };
        fields.push(Field::new(out_name, value_type));
    }

    let marker = value_type.missing_marker();
    let rows = groups
        .into_iter()
        .map(|(mut ids, mut cells)| {
            ids.extend((0..new_columns.len()).map(|c| cells.remove(&c).unwrap_or_else(|| marker.clone())));
            ids
        })
        .collect();

    Ok(Table::new(Schema::new(fields), rows))
}

/// Wide scalar table: one row per (`runID`, `module`), one column per scalar `name`.
pub fn pivot_scalars(table: &Table) -> ResultsResult<Table> {
    pivot_wide(table, &[columns::RUN_ID, columns::MODULE], columns::NAME, columns::VALUE)
}

/// Inverse of [`pivot_wide`]: one output row per (input row, non-id column).
///
/// The value column keeps the source type when every melted column shares it, and is
/// [`DataType::Generic`] otherwise.
pub fn melt(table: &Table, id_vars: &[&str], var_name: &str, value_name: &str) -> ResultsResult<Table> {
    let id_idxs = id_vars
        .iter()
        .map(|name| require_column(table, name))
        .collect::<ResultsResult<Vec<usize>>>()?;
    let value_idxs: Vec<usize> = (0..table.column_count())
        .filter(|i| !id_idxs.contains(i))
        .collect();

    let mut value_types = value_idxs.iter().map(|&i| table.schema.fields[i].data_type);
    let value_type = match value_types.next() {
        Some(first) if value_types.all(|t| t == first) => first,
        Some(_) => DataType::Generic,
        None => DataType::Generic,
    };

    let mut fields: Vec<Field> = id_idxs
        .iter()
        .map(|&i| table.schema.fields[i].clone())
        .collect();
    fields.push(Field::new(var_name, DataType::Utf8));
    fields.push(Field::new(value_name, value_type));

    let mut rows = Vec::with_capacity(table.row_count() * value_idxs.len());
    for row in &table.rows {
        for &v in &value_idxs {
            let mut out: Vec<Value> = id_idxs.iter().map(|&i| row[i].clone()).collect();
            out.push(Value::Utf8(table.schema.fields[v].name.clone()));
            out.push(row[v].clone());
            rows.push(out);
        }
    }

    Ok(Table::new(Schema::new(fields), rows))
}

pub(crate) fn require_column(table: &Table, name: &str) -> ResultsResult<usize> {
    table.index_of(name).ok_or_else(|| {
        ResultsError::schema_mismatch(format!(
            "missing required column '{name}'. columns={:?}",
            table.schema.field_names().collect::<Vec<_>>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    fn long_table() -> Table {
        Table::new(
            Schema::new(vec![
                Field::new("runID", DataType::Utf8),
                Field::new("name", DataType::Utf8),
                Field::new("value", DataType::Float64),
            ]),
            vec![
                vec![utf8("Run-0"), utf8("a"), Value::Float64(1.0)],
                vec![utf8("Run-0"), utf8("b"), Value::Float64(2.0)],
                vec![utf8("Run-1"), utf8("a"), Value::Float64(3.0)],
            ],
        )
    }

    #[test]
    fn pivot_fills_missing_combinations_with_type_marker() {
        let wide = pivot_wide(&long_table(), &["runID"], "name", "value").unwrap();
        assert_eq!(wide.schema.field_names().collect::<Vec<_>>(), vec!["runID", "a", "b"]);
        assert_eq!(wide.row_count(), 2);
        assert_eq!(wide.value(0, "b"), Some(&Value::Float64(2.0)));
        assert!(wide.value(1, "b").unwrap().is_missing());
        assert_eq!(wide.schema.fields[2].data_type, DataType::Float64);
    }

    #[test]
    fn pivot_of_array_values_fills_empty_arrays() {
        let t = Table::new(
            Schema::new(vec![
                Field::new("runID", DataType::Utf8),
                Field::new("name", DataType::Utf8),
                Field::new("vecvalue", DataType::FloatArray),
            ]),
            vec![
                vec![utf8("Run-0"), utf8("q"), Value::FloatArray(vec![1.0])],
                vec![utf8("Run-1"), utf8("r"), Value::FloatArray(vec![2.0])],
            ],
        );
        let wide = pivot_wide(&t, &["runID"], "name", "vecvalue").unwrap();
        assert_eq!(wide.value(0, "r"), Some(&Value::FloatArray(vec![])));
        assert_eq!(wide.value(1, "q"), Some(&Value::FloatArray(vec![])));
    }

    #[test]
    fn pivot_keeps_first_duplicate_and_skips_missing_keys() {
        let mut t = long_table();
        t.rows.push(vec![utf8("Run-0"), utf8("a"), Value::Float64(99.0)]);
        t.rows.push(vec![Value::Null, utf8("a"), Value::Float64(5.0)]);
        t.rows.push(vec![utf8("Run-1"), Value::Null, Value::Float64(5.0)]);
        let wide = pivot_wide(&t, &["runID"], "name", "value").unwrap();
        assert_eq!(wide.row_count(), 2);
        assert_eq!(wide.value(0, "a"), Some(&Value::Float64(1.0)));
    }

    #[test]
    fn pivot_disambiguates_names_colliding_with_index() {
        let mut t = long_table();
        t.rows.push(vec![utf8("Run-1"), utf8("runID"), Value::Float64(7.0)]);
        let wide = pivot_wide(&t, &["runID"], "name", "value").unwrap();
        assert_eq!(wide.value(1, "runID_value"), Some(&Value::Float64(7.0)));
        assert_eq!(wide.value(1, "runID"), Some(&utf8("Run-1")));
    }

    #[test]
    fn pivot_reports_missing_columns() {
        let err = pivot_wide(&long_table(), &["module"], "name", "value").unwrap_err();
        assert!(err.to_string().contains("missing required column 'module'"));
    }

    #[test]
    fn melt_then_filter_missing_reproduces_long_triples() {
        let long = long_table();
        let wide = pivot_wide(&long, &["runID"], "name", "value").unwrap();
        let back = melt(&wide, &["runID"], "name", "value").unwrap();
        let back = back.filter_rows(|row| !row[2].is_missing());

        let mut got: Vec<(String, String, f64)> = back
            .rows
            .iter()
            .map(|r| {
                (
                    r[0].as_str().unwrap().to_string(),
                    r[1].as_str().unwrap().to_string(),
                    r[2].as_f64().unwrap(),
                )
            })
            .collect();
        got.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(
            got,
            vec![
                ("Run-0".to_string(), "a".to_string(), 1.0),
                ("Run-0".to_string(), "b".to_string(), 2.0),
                ("Run-1".to_string(), "a".to_string(), 3.0),
            ]
        );
    }

    #[test]
    fn pivoting_a_melted_rectangular_table_is_identity() {
        let wide = Table::new(
            Schema::new(vec![
                Field::new("runID", DataType::Utf8),
                Field::new("x", DataType::Utf8),
                Field::new("y", DataType::Utf8),
            ]),
            vec![
                vec![utf8("Run-0"), utf8("1"), utf8("2")],
                vec![utf8("Run-1"), utf8("3"), utf8("4")],
            ],
        );
        let long = melt(&wide, &["runID"], "name", "value").unwrap();
        assert_eq!(long.row_count(), 4);
        let again = pivot_wide(&long, &["runID"], "name", "value").unwrap();
        assert_eq!(again, wide);
    }
}
