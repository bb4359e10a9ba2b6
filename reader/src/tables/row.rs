use snafu::{ensure, OptionExt};

use super::{
    cell::{Cell, Value},
    error::*,
    reference::Reference,
    TableTag,
};

/// One record instance: an ordered collection of cells.
///
/// Cells appear in column-index order. The transparent index is assigned
/// once, when the row is registered in its [super::Tables] collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    table: T,
    index: u32,
    cells: Vec<Cell<T>>,
}

impl<T: TableTag> Row<T> {
    pub fn new(table: T, index: u32, cells: Vec<Cell<T>>) -> Result<Self, TableError> {
        ensure!(
            !cells.is_empty(),
            CellCountMismatchSnafu {
                table: table.to_string(),
                cells: 0usize,
                columns: 1usize,
            }
        );
        Ok(Self {
            table,
            index,
            cells,
        })
    }

    /// Tag of the table owning the row.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Transparent index of the row.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn cells(&self) -> &[Cell<T>] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `column_index`, bounds-checked.
    pub fn cell(&self, column_index: u16) -> Result<&Cell<T>, TableError> {
        self.cells
            .get(column_index as usize)
            .context(ColumnIndexOutOfRangeSnafu {
                index: column_index,
                len: self.cells.len(),
            })
    }

    /// First cell whose column is named `name`.
    pub fn cell_by_name(&self, name: &str) -> Result<&Cell<T>, TableError> {
        self.cells
            .iter()
            .find(|cell| cell.column().name() == name)
            .context(ColumnNotFoundSnafu { name })
    }

    pub fn u8(&self, column_index: u16) -> Result<u8, TableError> {
        self.value(column_index, "byte", Value::as_u8)
    }

    pub fn u16(&self, column_index: u16) -> Result<u16, TableError> {
        self.value(column_index, "u2", Value::as_u16)
    }

    pub fn u32(&self, column_index: u16) -> Result<u32, TableError> {
        self.value(column_index, "u4", Value::as_u32)
    }

    pub fn bytes(&self, column_index: u16) -> Result<&[u8], TableError> {
        self.value(column_index, "byte array", Value::as_bytes)
    }

    pub fn shorts(&self, column_index: u16) -> Result<&[u16], TableError> {
        self.value(column_index, "u2 array", Value::as_shorts)
    }

    pub fn str(&self, column_index: u16) -> Result<&str, TableError> {
        self.value(column_index, "string", Value::as_str)
    }

    pub fn references(&self, column_index: u16) -> Result<&[Reference<T>], TableError> {
        self.value(column_index, "reference array", Value::as_references)
    }

    fn value<'a, V>(
        &'a self,
        column_index: u16,
        expected: &'static str,
        get: impl FnOnce(&'a Value<T>) -> Option<V>,
    ) -> Result<V, TableError> {
        let cell = self.cell(column_index)?;
        get(cell.value()).context(UnexpectedValueSnafu {
            column: cell.column().name(),
            expected,
            found: cell.value().kind(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::tables::{Column, ColumnType};

    fn line_number_row() -> Row<String> {
        let tag = "LineNumberTableRef".to_string();
        let start_pc = Arc::new(Column::new(tag.clone(), "start_pc", 0, ColumnType::UInt16));
        let line_number = Arc::new(Column::new(tag.clone(), "line_number", 1, ColumnType::UInt16));
        let cells = vec![
            Cell::new(start_pc, 0, Value::UInt16(0), 2).unwrap(),
            Cell::new(line_number, 12, Value::UInt16(12), 2).unwrap(),
        ];
        Row::new(tag, 0, cells).unwrap()
    }

    #[test]
    fn lookup_by_index_and_name() {
        let row = line_number_row();
        assert_eq!(row.cell(1).unwrap().raw_value(), 12);
        assert_eq!(row.cell_by_name("line_number").unwrap().column().index(), 1);
        assert_eq!(row.u16(0).unwrap(), 0);
        assert!(matches!(
            row.cell(2),
            Err(TableError::ColumnIndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            row.cell_by_name("end_pc"),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn typed_getter_rejects_other_shape() {
        let row = line_number_row();
        assert!(matches!(
            row.u32(0),
            Err(TableError::UnexpectedValue { expected: "u4", found: "u2", .. })
        ));
        assert!(row.bytes(1).is_err());
    }

    #[test]
    fn empty_rows_are_rejected() {
        assert!(Row::<String>::new("Code".to_string(), 0, vec![]).is_err());
    }
}
