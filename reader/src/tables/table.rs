use std::sync::Arc;

use snafu::{ensure, OptionExt};

use super::{column::Column, error::*, row::Row, TableTag};

/// Homogeneous collection of rows sharing one record shape.
///
/// The column set is fixed for the lifetime of the table and rows are
/// append-only. Rows are added through the owning [super::Tables], which
/// assigns their transparent indexes.
#[derive(Debug, Clone)]
pub struct Table<T> {
    tag: T,
    columns: Vec<Arc<Column<T>>>,
    rows: Vec<Row<T>>,
}

impl<T: TableTag> Table<T> {
    pub fn new(tag: T, columns: Vec<Arc<Column<T>>>) -> Result<Self, TableError> {
        ensure!(
            !columns.is_empty(),
            EmptyColumnSetSnafu {
                table: tag.to_string(),
            }
        );
        Ok(Self {
            tag,
            columns,
            rows: Vec::new(),
        })
    }

    pub fn tag(&self) -> &T {
        &self.tag
    }

    pub fn columns(&self) -> &[Arc<Column<T>>] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row of this table with the transparent index `index`.
    ///
    /// Only this table's rows are searched, so a row registered elsewhere in
    /// the collection under the same index is reported as missing.
    pub fn row(&self, index: u32) -> Result<&Row<T>, TableError> {
        self.rows
            .iter()
            .find(|row| row.index() == index)
            .context(RowNotInTableSnafu {
                index,
                table: self.tag.to_string(),
            })
    }

    /// Append a row, returning its position in [Self::rows].
    pub(crate) fn push(&mut self, row: Row<T>) -> Result<usize, TableError> {
        ensure!(
            row.len() == self.columns.len(),
            CellCountMismatchSnafu {
                table: self.tag.to_string(),
                cells: row.len(),
                columns: self.columns.len(),
            }
        );
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }
}
