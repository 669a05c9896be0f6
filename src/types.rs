//! Core table model.
//!
//! Every query produces a fresh [`Table`]: a [`Schema`] (ordered, typed [`Field`]s) plus
//! row-major [`Value`] storage. Tables are rectangular; a cell that has nothing to hold carries
//! the missing marker of its column's [`DataType`] (see [`DataType::missing_marker`]).

/// Logical data type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Integer-or-missing. Missing cells hold NaN (as [`Value::Float64`]).
    Int64,
    /// Float-or-missing. Missing cells hold NaN.
    Float64,
    /// UTF-8 string. Missing cells hold [`Value::Null`].
    Utf8,
    /// Whitespace-delimited numeric sequence. Missing cells hold an empty array.
    FloatArray,
    /// Column whose cells depend on each row's result kind (e.g. `value`).
    Generic,
}

impl DataType {
    /// The value a cell of this type holds when no source row populated it.
    pub fn missing_marker(&self) -> Value {
        match self {
            DataType::Int64 | DataType::Float64 => Value::Float64(f64::NAN),
            DataType::FloatArray => Value::FloatArray(Vec::new()),
            DataType::Utf8 | DataType::Generic => Value::Null,
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing a table's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns `true` if a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent generic/string value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float; NaN is the numeric missing marker.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Numeric sequence (bin edges, vector samples, ...).
    FloatArray(Vec<f64>),
}

impl Value {
    /// `true` for [`Value::Null`] and NaN floats. Empty arrays are values, not missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Borrow the string payload, if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell; integers widen to `f64`, missing becomes NaN.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Null => Some(f64::NAN),
            _ => None,
        }
    }

    /// Integer view of the cell; `None` for missing or non-integer cells.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the array payload, if this is a [`Value::FloatArray`].
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::FloatArray(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Textual key used for grouping and joining (run IDs, module and item names).
    ///
    /// Returns `None` for missing cells so they never match each other.
    pub fn group_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Utf8(s) => Some(s.clone()),
            Value::Int64(v) => Some(v.to_string()),
            Value::Float64(v) if v.is_nan() => None,
            Value::Float64(v) => Some(v.to_string()),
            Value::FloatArray(v) => Some(format!("{v:?}")),
        }
    }
}

/// In-memory rectangular table.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// A zero-row table with the given schema.
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Number of rows in the table.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the table.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    /// Iterate the cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.index_of(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at (`row`, column `name`).
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.index_of(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Create a new table containing only rows that match `predicate`.
    ///
    /// The returned table preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Rename column `from` to `to`. Returns `false` if `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.schema.fields.iter_mut().find(|f| f.name == from) {
            Some(field) => {
                field.name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Append a column. `values` must hold one cell per row.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn add_column(&mut self, field: Field, values: Vec<Value>) {
        assert!(
            values.len() == self.rows.len(),
            "column '{}' has {} values but table has {} rows",
            field.name,
            values.len(),
            self.rows.len()
        );
        self.schema.fields.push(field);
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
    }

    /// Append an all-missing column unless a column with this name already exists.
    ///
    /// Returns `true` if the column was created.
    pub fn ensure_column(&mut self, name: &str, data_type: DataType) -> bool {
        if self.schema.contains(name) {
            return false;
        }
        let marker = data_type.missing_marker();
        let values = vec![marker; self.rows.len()];
        self.add_column(Field::new(name, data_type), values);
        true
    }

    /// Drop every column for which `predicate(field, cells)` returns `true`.
    pub fn drop_columns_where<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&Field, &[&Value]) -> bool,
    {
        let keep: Vec<bool> = self
            .schema
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let cells: Vec<&Value> = self.rows.iter().map(|row| &row[idx]).collect();
                !predicate(field, &cells)
            })
            .collect();

        if keep.iter().all(|k| *k) {
            return;
        }

        let mut flags = keep.iter();
        self.schema.fields.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    /// Project onto the named columns, in the given order. Unknown names are skipped.
    pub fn select_columns(&self, names: &[&str]) -> Self {
        let idxs: Vec<usize> = names.iter().filter_map(|n| self.index_of(n)).collect();
        let fields = idxs
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self::new(Schema::new(fields), rows)
    }
}
