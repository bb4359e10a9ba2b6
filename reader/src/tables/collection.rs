use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
};

use snafu::{ensure, OptionExt};

use super::{error::*, reference::Reference, row::Row, table::Table, TableTag};

/// Collection of all the tables of one pool.
///
/// The collection owns the tables, keyed by tag, and a global row map keyed
/// by transparent index. Transparent indexes are unique across the whole
/// collection, not per table, which lets a [Reference] point anywhere.
#[derive(Debug)]
pub struct Tables<T: TableTag> {
    tables: HashMap<T, Table<T>>,
    /// Registration order of the tables.
    order: Vec<T>,
    /// Transparent index -> (table, position in the table's rows).
    rows: HashMap<u32, (T, usize)>,
    next_row_index: AtomicU32,
}

impl<T: TableTag> Default for Tables<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableTag> Tables<T> {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            order: Vec::new(),
            rows: HashMap::new(),
            next_row_index: AtomicU32::new(0),
        }
    }

    /// Register a table under its tag. A tag can only be registered once.
    pub fn add_table(&mut self, table: Table<T>) -> Result<(), TableError> {
        let tag = table.tag().clone();
        ensure!(
            !self.tables.contains_key(&tag),
            DuplicateTableSnafu {
                table: tag.to_string(),
            }
        );
        self.order.push(tag.clone());
        self.tables.insert(tag, table);
        Ok(())
    }

    /// Table registered under `tag`.
    pub fn table(&self, tag: &T) -> Result<&Table<T>, TableError> {
        self.tables.get(tag).context(TableNotFoundSnafu {
            table: tag.to_string(),
        })
    }

    /// Table registered under `tag`, `None` if it never was.
    pub fn find_table(&self, tag: &T) -> Option<&Table<T>> {
        self.tables.get(tag)
    }

    pub fn contains_table(&self, tag: &T) -> bool {
        self.tables.contains_key(tag)
    }

    /// Tables in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Table<T>> + '_ {
        self.order.iter().filter_map(|tag| self.tables.get(tag))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of rows registered across all tables.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Mint the next transparent index.
    ///
    /// The counter is incremented exactly once per call, so concurrent callers
    /// never observe the same index.
    fn next_index(&self) -> u32 {
        self.next_row_index.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Register `row` in its table under a freshly minted transparent index.
    pub fn add_row(&mut self, row: Row<T>) -> Result<u32, TableError> {
        let index = self.next_index();
        self.add_row_at(index, row)?;
        Ok(index)
    }

    /// Register `row` in its table under a caller-supplied index.
    ///
    /// The constant pool uses this to align indexes with the class-file slot
    /// numbers.
    pub fn add_row_at(&mut self, index: u32, mut row: Row<T>) -> Result<(), TableError> {
        ensure!(!self.rows.contains_key(&index), DuplicateRowIndexSnafu { index });
        let tag = row.table().clone();
        let table = self.tables.get_mut(&tag).context(TableNotFoundSnafu {
            table: tag.to_string(),
        })?;
        row.set_index(index);
        let position = table.push(row)?;
        self.rows.insert(index, (tag, position));
        Ok(())
    }

    /// Row registered under the transparent index `index`, in any table.
    pub fn row_by_index(&self, index: u32) -> Result<&Row<T>, TableError> {
        self.rows
            .get(&index)
            .and_then(|(tag, position)| self.tables.get(tag)?.rows().get(*position))
            .context(RowNotFoundSnafu { index })
    }

    /// Every registered transparent index, in ascending order.
    pub fn row_indexes(&self) -> Vec<u32> {
        let mut indexes: Vec<u32> = self.rows.keys().copied().collect();
        indexes.sort_unstable();
        indexes
    }

    pub fn resolve(&self, reference: &Reference<T>) -> Result<&Row<T>, TableError> {
        reference.resolve(self)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;
    use crate::tables::{column::describe, Cell, ColumnType, Value};

    fn tables() -> Tables<String> {
        let mut tables = Tables::new();
        for name in ["SourceFile", "Signature"] {
            let tag = name.to_string();
            let columns = describe(&tag, &[ColumnType::UInt16], &["index"]).unwrap();
            tables.add_table(Table::new(tag, columns).unwrap()).unwrap();
        }
        tables
    }

    fn row(tables: &Tables<String>, name: &str, value: u16) -> Row<String> {
        let tag = name.to_string();
        let column = tables.table(&tag).unwrap().columns()[0].clone();
        let cell = Cell::new(column, value.into(), Value::UInt16(value), 2).unwrap();
        Row::new(tag, 0, vec![cell]).unwrap()
    }

    #[test]
    fn transparent_indexes_are_unique_across_tables() {
        let mut tables = tables();
        let mut assigned = HashSet::new();
        for i in 0..10u16 {
            let name = if i % 2 == 0 { "SourceFile" } else { "Signature" };
            let row = row(&tables, name, i);
            let index = tables.add_row(row).unwrap();
            assert!(assigned.insert(index), "index {} assigned twice", index);
        }
        assert_eq!(tables.row_count(), 10);
        for index in assigned {
            let row = tables.row_by_index(index).unwrap();
            assert_eq!(row.index(), index);
            let position = (index - 1) as u16;
            assert_eq!(row.u16(0).unwrap(), position);
        }
    }

    #[test]
    fn duplicate_registrations_fail() {
        let mut tables = tables();
        let tag = "SourceFile".to_string();
        let columns = describe(&tag, &[ColumnType::UInt16], &["index"]).unwrap();
        assert!(matches!(
            tables.add_table(Table::new(tag, columns).unwrap()),
            Err(TableError::DuplicateTable { .. })
        ));

        let first = row(&tables, "SourceFile", 1);
        tables.add_row_at(4, first).unwrap();
        let second = row(&tables, "Signature", 2);
        assert!(matches!(
            tables.add_row_at(4, second),
            Err(TableError::DuplicateRowIndex { index: 4 })
        ));
    }

    #[test]
    fn lookups_fail_loudly() {
        let mut tables = tables();
        let index = tables.add_row(row(&tables, "Signature", 3)).unwrap();
        assert!(matches!(
            tables.row_by_index(index + 1),
            Err(TableError::RowNotFound { .. })
        ));
        let source_file = tables.table(&"SourceFile".to_string()).unwrap();
        assert!(matches!(
            source_file.row(index),
            Err(TableError::RowNotInTable { .. })
        ));
        assert!(matches!(
            tables.table(&"Code".to_string()),
            Err(TableError::TableNotFound { .. })
        ));
        assert!(tables.find_table(&"Code".to_string()).is_none());
    }

    #[test]
    fn references_resolve_through_the_collection() {
        let mut tables = tables();
        let index = tables.add_row(row(&tables, "Signature", 9)).unwrap();

        let typed = Reference::new("Signature".to_string(), index);
        let untyped = Reference::<String>::untyped(index);
        let wrong = Reference::new("SourceFile".to_string(), index);

        assert_eq!(typed.resolve(&tables).unwrap().u16(0).unwrap(), 9);
        assert_eq!(tables.resolve(&untyped).unwrap().index(), index);
        assert!(wrong.resolve(&tables).is_err());
        let first = typed.resolve(&tables).unwrap();
        let second = typed.resolve(&tables).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rows_must_fill_every_column() {
        let mut tables: Tables<String> = Tables::new();
        let tag = "EnclosingMethod".to_string();
        let columns = describe(
            &tag,
            &[ColumnType::UInt16, ColumnType::UInt16],
            &["class_index", "method_index"],
        )
        .unwrap();
        let column = columns[0].clone();
        tables.add_table(Table::new(tag.clone(), columns).unwrap()).unwrap();
        let cell = Cell::new(column, 1, Value::UInt16(1), 2).unwrap();
        let row = Row::new(tag, 0, vec![cell]).unwrap();
        assert!(matches!(
            tables.add_row(row),
            Err(TableError::CellCountMismatch { cells: 1, columns: 2, .. })
        ));
    }
}
