use std::sync::Arc;

use snafu::ensure;

use super::{cell::Value, error::*, TableTag};

/// Declared type of a column.
///
/// The type fully determines the shape of the [Value] stored in every cell of
/// the column, and how many bytes the decoder consumes for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// A single unsigned byte.
    Byte,
    /// A big-endian `u2`.
    UInt16,
    /// A big-endian `u4`.
    UInt32,
    /// A `u4` length followed by that many bytes (e.g. bytecode).
    ByteArray,
    /// A `u2` count followed by that many `u2` elements.
    ShortArray,
    /// A `u2` length followed by a modified UTF-8 payload.
    Utf8String,
    /// Every remaining byte of the current attribute payload.
    Raw,
    /// A `u2` count followed by that many nested attributes.
    AttributeRef,
    /// Sub-records of the `Code` exception table.
    ExceptionTableRef,
    /// Sub-records of the `InnerClasses` attribute.
    InnerClassRef,
    /// Sub-records of the `LineNumberTable` attribute.
    LineNumberTableRef,
    /// Sub-records of the `LocalVariableTable` attribute.
    LocalVariableTableRef,
    /// Sub-records of the `LocalVariableTypeTable` attribute.
    LocalVariableTypeTableRef,
    /// Sub-records of the `BootstrapMethods` attribute.
    BootstrapMethodsRef,
    /// Sub-records of the `MethodParameters` attribute.
    MethodParametersRef,
}

impl ColumnType {
    /// Name of the sub-record table a `*Ref` column decodes its elements into.
    pub fn sub_table(&self) -> Option<&'static str> {
        match self {
            ColumnType::ExceptionTableRef => Some("ExceptionTableRef"),
            ColumnType::InnerClassRef => Some("InnerClassesRef"),
            ColumnType::LineNumberTableRef => Some("LineNumberTableRef"),
            ColumnType::LocalVariableTableRef => Some("LocalVariableTableRef"),
            ColumnType::LocalVariableTypeTableRef => Some("LocalVariableTypeTableRef"),
            ColumnType::BootstrapMethodsRef => Some("BootstrapMethodsRef"),
            ColumnType::MethodParametersRef => Some("MethodParametersRef"),
            _ => None,
        }
    }

    /// Size in bytes of the scalar types, `None` for variable-length ones.
    pub fn fixed_size(&self) -> Option<u32> {
        match self {
            ColumnType::Byte => Some(1),
            ColumnType::UInt16 => Some(2),
            ColumnType::UInt32 => Some(4),
            _ => None,
        }
    }

    /// Whether `value` has the shape this column type declares.
    pub fn accepts<T>(&self, value: &Value<T>) -> bool {
        match self {
            ColumnType::Byte => matches!(value, Value::Byte(_)),
            ColumnType::UInt16 => matches!(value, Value::UInt16(_)),
            ColumnType::UInt32 => matches!(value, Value::UInt32(_)),
            ColumnType::ByteArray | ColumnType::Raw => matches!(value, Value::Bytes(_)),
            ColumnType::ShortArray => matches!(value, Value::Shorts(_)),
            ColumnType::Utf8String => matches!(value, Value::Utf8(_)),
            _ => matches!(value, Value::References(_)),
        }
    }
}

/// One field of a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<T> {
    table: T,
    name: String,
    index: u16,
    column_type: ColumnType,
}

impl<T: TableTag> Column<T> {
    pub fn new(table: T, name: impl Into<String>, index: u16, column_type: ColumnType) -> Self {
        Self {
            table,
            name: name.into(),
            index,
            column_type,
        }
    }

    /// Tag of the table owning this column.
    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position of the column in its table.
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// Build the column set of a table from its parallel type and name lists.
///
/// Column indexes are assigned contiguously from zero.
pub fn describe<T: TableTag>(
    table: &T,
    types: &[ColumnType],
    names: &[&str],
) -> Result<Vec<Arc<Column<T>>>, TableError> {
    ensure!(
        types.len() == names.len(),
        ColumnShapeMismatchSnafu {
            table: table.to_string(),
            types: types.len(),
            names: names.len(),
        }
    );
    ensure!(
        !types.is_empty(),
        EmptyColumnSetSnafu {
            table: table.to_string(),
        }
    );
    Ok(types
        .iter()
        .zip(names)
        .enumerate()
        .map(|(index, (column_type, name))| {
            Arc::new(Column::new(table.clone(), *name, index as u16, *column_type))
        })
        .collect())
}
