//! Owned result-set data for a completed row-returning query.

use crate::protocol::{FieldDescription, FormatCode};

/// A fully-received result set: column metadata plus raw cell bytes.
///
/// Cells are kept exactly as they arrived on the wire; interpreting them is
/// the decoder's job, and only after the shape has been verified. `None`
/// cells are SQL NULL.
///
/// A `ResultSet` is exclusively owned and released by drop, so the
/// release-exactly-once obligation holds on every exit path by construction.
#[derive(Debug)]
pub struct ResultSet {
    columns: Vec<FieldDescription>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    tag: String,
}

impl ResultSet {
    /// Assembles a result set from received column metadata, rows, and the
    /// command completion tag.
    pub fn new(
        columns: Vec<FieldDescription>,
        rows: Vec<Vec<Option<Vec<u8>>>>,
        tag: String,
    ) -> Self {
        Self { columns, rows, tag }
    }

    /// Number of rows received.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of result columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column metadata, in result order.
    pub fn columns(&self) -> &[FieldDescription] {
        &self.columns
    }

    /// Name of column `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds; callers check the column count
    /// first.
    pub fn column_name(&self, index: usize) -> &str {
        &self.columns[index].name
    }

    /// Type OID of column `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn column_type(&self, index: usize) -> i32 {
        self.columns[index].type_oid
    }

    /// Wire format of column `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn column_format(&self, index: usize) -> FormatCode {
        self.columns[index].format
    }

    /// Raw bytes of the cell at (`row`, `column`). `None` for SQL NULL,
    /// and for a cell the row does not carry; rows received from a server
    /// always carry one cell per described column.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn cell(&self, row: usize, column: usize) -> Option<&[u8]> {
        self.rows[row].get(column).and_then(|cell| cell.as_deref())
    }

    /// Command completion tag reported by the server (e.g. `"SELECT 1"`).
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, type_oid: i32, format: FormatCode) -> FieldDescription {
        FieldDescription {
            name: name.to_string(),
            table_oid: 0,
            column_attr: 0,
            type_oid,
            type_size: -1,
            type_modifier: -1,
            format,
        }
    }

    #[test]
    fn test_accessors() {
        let result = ResultSet::new(
            vec![
                field("number", 23, FormatCode::Binary),
                field("english", 1043, FormatCode::Binary),
            ],
            vec![vec![Some(vec![0, 0, 0, 1]), None]],
            "SELECT 1".to_string(),
        );

        assert_eq!(result.num_rows(), 1);
        assert_eq!(result.num_columns(), 2);
        assert_eq!(result.column_name(0), "number");
        assert_eq!(result.column_type(1), 1043);
        assert_eq!(result.column_format(0), FormatCode::Binary);
        assert_eq!(result.cell(0, 0), Some(&[0u8, 0, 0, 1][..]));
        assert_eq!(result.cell(0, 1), None);
        assert_eq!(result.tag(), "SELECT 1");
    }
}
