use snafu::prelude::*;

/// Error type for table lookups and table construction.
///
/// Lookup failures are hard errors: a dangling index means either a corrupt
/// class file or a decoder bug, never a legitimately absent value.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    #[snafu(display("Table {} is already registered", table))]
    DuplicateTable { table: String },

    #[snafu(display("Table {} not found", table))]
    TableNotFound { table: String },

    #[snafu(display("Row index {} is already registered", index))]
    DuplicateRowIndex { index: u32 },

    #[snafu(display("Row with index {} not found", index))]
    RowNotFound { index: u32 },

    #[snafu(display("Row with index {} not found in table {}", index, table))]
    RowNotInTable { index: u32, table: String },

    #[snafu(display("Column index {} is out of range, the row has {} columns", index, len))]
    ColumnIndexOutOfRange { index: u16, len: usize },

    #[snafu(display("Column with name '{}' not found", name))]
    ColumnNotFound { name: String },

    #[snafu(display("Length of column types ({}) and names ({}) must be equal, table: {}", types, names, table))]
    ColumnShapeMismatch {
        table: String,
        types: usize,
        names: usize,
    },

    #[snafu(display("Table {} must declare at least one column", table))]
    EmptyColumnSet { table: String },

    #[snafu(display("Row of table {} has {} cells but the table declares {} columns", table, cells, columns))]
    CellCountMismatch {
        table: String,
        cells: usize,
        columns: usize,
    },

    #[snafu(display("Column {} holds a {} value, expected {}", column, found, expected))]
    UnexpectedValue {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[snafu(display("Unsupported method handle reference kind: {}", kind))]
    InvalidReferenceKind { kind: u8 },
}
