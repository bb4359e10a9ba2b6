use std::fmt;

use super::{collection::Tables, error::TableError, row::Row, TableTag};

/// Typed pointer to a row of a [Tables] collection.
///
/// A reference is only a relation: it stores the expected table and the
/// transparent index, and is resolved lazily against the collection it was
/// created for. When an expected table is set, the row must live in that
/// table; otherwise the global row map of the collection is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference<T> {
    table: Option<T>,
    index: u32,
}

impl<T: TableTag> Reference<T> {
    /// Reference a row that must live in `table`.
    pub fn new(table: T, index: u32) -> Self {
        Self {
            table: Some(table),
            index,
        }
    }

    /// Reference a row by its transparent index only, whatever its table.
    pub fn untyped(index: u32) -> Self {
        Self { table: None, index }
    }

    pub fn table(&self) -> Option<&T> {
        self.table.as_ref()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Resolve the reference to its target row.
    ///
    /// Fails if the row does not exist, or does not live in the expected table.
    pub fn resolve<'a>(&self, root: &'a Tables<T>) -> Result<&'a Row<T>, TableError> {
        match &self.table {
            Some(table) => root.table(table)?.row(self.index),
            None => root.row_by_index(self.index),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}#{}", table, self.index),
            None => write!(f, "#{}", self.index),
        }
    }
}
