//! Generic metadata tables.
//!
//! Binary records of the class file are decoded into [Table]s of [Row]s, one
//! table per record shape. Every row receives a transparent index that is
//! unique across its owning [Tables] collection, so a [Reference] can point
//! into any table of that collection without knowing where the row lives.
//!
//! The constant pool ([crate::constant_pool]) and the attribute pool
//! ([crate::attribute]) are both specializations of this engine.

use std::{fmt::Debug, fmt::Display, hash::Hash};

pub mod cell;
pub mod collection;
pub mod column;
pub mod error;
pub mod reference;
pub mod row;
pub mod table;
pub mod typed;

pub use cell::{Cell, Value};
pub use collection::Tables;
pub use column::{Column, ColumnType};
pub use error::TableError;
pub use reference::Reference;
pub use row::Row;
pub use table::Table;
pub use typed::{resolve_all, TypedRow, TypedTable};
pub(crate) use typed::typed_row;

/// Discriminator of a table's record shape.
///
/// A closed enum for constant kinds, the attribute name for attributes.
pub trait TableTag: Clone + Eq + Hash + Debug + Display {}

impl<T> TableTag for T where T: Clone + Eq + Hash + Debug + Display {}
