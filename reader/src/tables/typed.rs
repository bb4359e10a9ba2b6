use std::marker::PhantomData;

use super::{error::TableError, reference::Reference, row::Row, table::Table, Tables, TableTag};

/// Strongly typed view over a generic [Row].
pub trait TypedRow<'a, T: TableTag + 'a>: Sized {
    fn wrap(row: &'a Row<T>) -> Self;

    /// The underlying generic row.
    fn row(&self) -> &'a Row<T>;

    /// Transparent index of the row.
    fn id(&self) -> u32 {
        self.row().index()
    }
}

/// Strongly typed view over a generic [Table].
#[derive(Debug)]
pub struct TypedTable<'a, R, T: TableTag> {
    table: &'a Table<T>,
    marker: PhantomData<fn() -> R>,
}

impl<'a, R, T: TableTag> Clone for TypedTable<'a, R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R, T: TableTag> Copy for TypedTable<'a, R, T> {}

impl<'a, R: TypedRow<'a, T> + 'a, T: TableTag> TypedTable<'a, R, T> {
    pub fn new(table: &'a Table<T>) -> Self {
        Self {
            table,
            marker: PhantomData,
        }
    }

    pub fn table(&self) -> &'a Table<T> {
        self.table
    }

    /// Row with the transparent index `index`, which must live in this table.
    pub fn get(&self, index: u32) -> Result<R, TableError> {
        self.table.row(index).map(R::wrap)
    }

    pub fn iter(&self) -> impl Iterator<Item = R> + 'a {
        self.table.rows().iter().map(R::wrap)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Resolve every reference of `references` into a typed row.
pub fn resolve_all<'a, R, T>(root: &'a Tables<T>, references: &[Reference<T>]) -> Result<Vec<R>, TableError>
where
    R: TypedRow<'a, T>,
    T: TableTag,
{
    references
        .iter()
        .map(|reference| reference.resolve(root).map(R::wrap))
        .collect()
}

/// Declare a strongly typed row view over a table of tag type `$tag`.
macro_rules! typed_row {
    ($(#[$meta:meta])* $name:ident, $tag:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            row: &'a $crate::tables::Row<$tag>,
        }

        impl<'a> $crate::tables::TypedRow<'a, $tag> for $name<'a> {
            fn wrap(row: &'a $crate::tables::Row<$tag>) -> Self {
                Self { row }
            }

            fn row(&self) -> &'a $crate::tables::Row<$tag> {
                self.row
            }
        }
    };
}

pub(crate) use typed_row;
