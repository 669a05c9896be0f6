//! Joining auxiliary columns onto a primary table.

use std::collections::HashMap;

use crate::error::{ResultsError, ResultsResult};
use crate::model::columns;
use crate::types::{Field, Table, Value};

use super::pivot::{pivot_wide, require_column};

/// Left join: every row of `primary` is kept, in order, extended by the non-key columns of `aux`
/// from the first `aux` row with equal keys.
///
/// Primary rows without a match (or with a missing key cell) get each auxiliary column's missing
/// marker. Auxiliary rows that match nothing are dropped. An auxiliary column whose name is
/// already taken is suffixed with `_y` until unique.
pub fn left_join(primary: &Table, aux: &Table, keys: &[&str]) -> ResultsResult<Table> {
    let primary_keys = keys
        .iter()
        .map(|k| require_column(primary, k))
        .collect::<ResultsResult<Vec<usize>>>()?;
    let aux_keys = keys
        .iter()
        .map(|k| require_column(aux, k))
        .collect::<ResultsResult<Vec<usize>>>()?;
    let aux_cols: Vec<usize> = (0..aux.column_count())
        .filter(|i| !aux_keys.contains(i))
        .collect();

    let mut lookup: HashMap<Vec<String>, usize> = HashMap::new();
    for (row_idx, row) in aux.rows.iter().enumerate() {
        if let Some(key) = row_key(row, &aux_keys) {
            lookup.entry(key).or_insert(row_idx);
        }
    }

    let mut out = primary.clone();
    for &c in &aux_cols {
        let field = &aux.schema.fields[c];
        let mut name = field.name.clone();
        while out.schema.contains(&name) {
            name.push_str("_y");
        }
        let marker = field.data_type.missing_marker();
        let values: Vec<Value> = primary
            .rows
            .iter()
            .map(|row| {
                row_key(row, &primary_keys)
                    .and_then(|key| lookup.get(&key))
                    .map_or_else(|| marker.clone(), |&r| aux.rows[r][c].clone())
            })
            .collect();
        out.add_column(Field::new(name, field.data_type), values);
    }

    Ok(out)
}

fn row_key(row: &[Value], idxs: &[usize]) -> Option<Vec<String>> {
    idxs.iter().map(|&i| row[i].group_key()).collect()
}

/// Pivot a long metadata table (`runID`, `name`, `value`) by run and join it onto `primary` by
/// `runID`, naming each new column `<name><suffix>` (e.g. `N_itervar`).
pub fn append_metadata_columns(primary: &Table, metadata: &Table, suffix: &str) -> ResultsResult<Table> {
    if !primary.schema.contains(columns::RUN_ID) {
        return Err(ResultsError::schema_mismatch(format!(
            "cannot append '{suffix}' columns: primary table has no '{}' column",
            columns::RUN_ID
        )));
    }

    let mut long = metadata.clone();
    long.rename_column(columns::NAME, columns::ATTRNAME);
    long.rename_column(columns::VALUE, columns::ATTRVALUE);

    let mut wide = pivot_wide(&long, &[columns::RUN_ID], columns::ATTRNAME, columns::ATTRVALUE)?;
    for field in wide.schema.fields.iter_mut().skip(1) {
        field.name = format!("{}{suffix}", field.name);
    }

    left_join(primary, &wide, &[columns::RUN_ID])
}

/// Pivot `attr` rows (`runID`, `module`, `name`, `attrname`, `attrvalue`) per result item and
/// join them onto `primary`; each attribute name becomes a column.
pub fn append_result_attributes(primary: &Table, attrs: &Table) -> ResultsResult<Table> {
    let keys = [columns::RUN_ID, columns::MODULE, columns::NAME];
    let wide = pivot_wide(attrs, &keys, columns::ATTRNAME, columns::ATTRVALUE)?;
    left_join(primary, &wide, &keys)
}
