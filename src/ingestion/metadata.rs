//! Tab-separated metadata stream parsing.
//!
//! Metadata queries (runs, run attributes, iteration variables, config entries, parameter
//! assignments) come back headerless, one tab-separated line per row. Values are heterogeneous
//! and consumer-interpreted, so every cell is kept as text.

use crate::error::{ResultsError, ResultsResult};
use crate::model::columns;
use crate::types::{DataType, Field, Schema, Table, Value};

use super::coerce::parse_text;

/// Column layout of a metadata query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLayout {
    /// `runID` only (plain run list).
    Runs,
    /// `runID`, `name`, `value`.
    NameValue,
}

impl MetadataLayout {
    /// Output column names, in order.
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            Self::Runs => &[columns::RUN_ID],
            Self::NameValue => &[columns::RUN_ID, columns::NAME, columns::VALUE],
        }
    }

    /// Schema of a table with this layout.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.column_names()
                .iter()
                .map(|n| Field::new(*n, DataType::Utf8))
                .collect(),
        )
    }
}

/// Parse a headerless tab-separated stream into a table with the given layout.
///
/// Surrounding whitespace of the whole stream is ignored; zero remaining lines yield an empty
/// table. A field enclosed in double quotes loses the quotes, and `""` inside it is one quote
/// character. Missing trailing cells are [`Value::Null`]; extra
/// cells are an error.
pub fn read_metadata_tsv(bytes: &[u8], layout: MetadataLayout) -> ResultsResult<Table> {
    let schema = layout.schema();
    let trimmed = trim_ascii_whitespace(bytes);
    if trimmed.is_empty() {
        return Ok(Table::empty(schema));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(trimmed);

    let width = schema.fields.len();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > width {
            return Err(ResultsError::ParseError {
                row: row_idx0 + 1,
                column: schema.fields[width - 1].name.clone(),
                raw: record.iter().collect::<Vec<_>>().join("\t"),
                message: format!("expected at most {width} tab-separated fields, found {}", record.len()),
            });
        }
        let row = (0..width)
            .map(|i| parse_text(record.get(i).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(schema, rows))
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    #[test]
    fn parses_name_value_rows_as_text() {
        let input = b"Run-0\tN\t10\nRun-0\tmode\tfast\nRun-1\tN\t20\n";
        let t = read_metadata_tsv(input, MetadataLayout::NameValue).unwrap();
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.rows[0], vec![utf8("Run-0"), utf8("N"), utf8("10")]);
        assert_eq!(t.rows[1][2], utf8("fast"));
    }

    #[test]
    fn quoted_values_lose_enclosing_quotes() {
        let t = read_metadata_tsv(b"Run-0\tproto\t\"tcp\"\n", MetadataLayout::NameValue).unwrap();
        assert_eq!(t.rows[0][2], utf8("tcp"));

        let input = b"Run-0\tlabel\t\"a\tb \"\"x\"\"\"\nRun-0\tnote\t\"\"\n";
        let t = read_metadata_tsv(input, MetadataLayout::NameValue).unwrap();
        assert_eq!(t.rows[0][2], utf8("a\tb \"x\""));
        assert_eq!(t.rows[1][2], Value::Null);
    }

    #[test]
    fn run_list_has_single_column() {
        let t = read_metadata_tsv(b"Run-0\nRun-1\n", MetadataLayout::Runs).unwrap();
        assert_eq!(t.schema.field_names().collect::<Vec<_>>(), vec!["runID"]);
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn empty_output_is_an_empty_table() {
        let inputs: [&[u8]; 3] = [b"", b"\n", b"  \n\t\n"];
        for input in inputs {
            let t = read_metadata_tsv(input, MetadataLayout::NameValue).unwrap();
            assert!(t.is_empty());
            assert_eq!(t.column_count(), 3);
        }
    }

    #[test]
    fn short_rows_are_padded_with_null() {
        let t = read_metadata_tsv(b"Run-0\tdescription\n", MetadataLayout::NameValue).unwrap();
        assert_eq!(t.rows[0][2], Value::Null);
    }

    #[test]
    fn value_with_inner_spaces_is_kept_whole() {
        let t = read_metadata_tsv(b"Run-0\tdescription\tsome long text\n", MetadataLayout::NameValue).unwrap();
        assert_eq!(t.rows[0][2], utf8("some long text"));
    }

    #[test]
    fn too_many_fields_is_malformed() {
        let err = read_metadata_tsv(b"Run-0\ta\tb\tc\n", MetadataLayout::NameValue).unwrap_err();
        assert!(err.to_string().contains("at most 3"));
    }
}
