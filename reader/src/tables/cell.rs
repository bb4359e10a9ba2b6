use std::{fmt, sync::Arc};

use snafu::ensure;

use super::{column::Column, error::*, reference::Reference, TableTag};

/// Decoded payload of a cell.
///
/// The variant is selected by the declared [super::ColumnType] of the cell's
/// column, see [super::ColumnType::accepts].
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Byte(u8),
    UInt16(u16),
    UInt32(u32),
    /// Bytecode, raw attribute payloads.
    Bytes(Vec<u8>),
    /// Index arrays (`Exceptions`, bootstrap arguments...).
    Shorts(Vec<u16>),
    Utf8(String),
    /// Sub-rows or nested attributes.
    References(Vec<Reference<T>>),
}

impl<T> Value<T> {
    /// Human readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Byte(_) => "byte",
            Value::UInt16(_) => "u2",
            Value::UInt32(_) => "u4",
            Value::Bytes(_) => "byte array",
            Value::Shorts(_) => "u2 array",
            Value::Utf8(_) => "string",
            Value::References(_) => "reference array",
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::UInt16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_shorts(&self) -> Option<&[u16]> {
        match self {
            Value::Shorts(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_references(&self) -> Option<&[Reference<T>]> {
        match self {
            Value::References(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "({} bytes)", v.len()),
            Value::Shorts(v) => write!(f, "{:?}", v),
            Value::Utf8(v) => write!(f, "{:?}", v),
            Value::References(refs) => {
                write!(f, "[")?;
                for (i, reference) in refs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", reference)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// One decoded value occupying a column of a row.
///
/// `raw_value` holds the scalar itself for integral columns, the element or
/// byte count for arrays and strings, and the reference count for `*Ref`
/// columns. `size` is the number of bytes the decoder consumed for the cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<T> {
    column: Arc<Column<T>>,
    raw_value: u32,
    value: Value<T>,
    size: u32,
}

impl<T: TableTag> Cell<T> {
    /// Create a cell, checking that `value` matches the column's declared type.
    pub fn new(
        column: Arc<Column<T>>,
        raw_value: u32,
        value: Value<T>,
        size: u32,
    ) -> Result<Self, TableError> {
        ensure!(
            column.column_type().accepts(&value),
            UnexpectedValueSnafu {
                column: column.name(),
                expected: format_type(&column),
                found: value.kind(),
            }
        );
        Ok(Self {
            column,
            raw_value,
            value,
            size,
        })
    }

    pub fn column(&self) -> &Column<T> {
        &self.column
    }

    pub fn raw_value(&self) -> u32 {
        self.raw_value
    }

    pub fn value(&self) -> &Value<T> {
        &self.value
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

fn format_type<T: TableTag>(column: &Column<T>) -> &'static str {
    use super::ColumnType::*;
    match column.column_type() {
        Byte => "byte",
        UInt16 => "u2",
        UInt32 => "u4",
        ByteArray | Raw => "byte array",
        ShortArray => "u2 array",
        Utf8String => "string",
        _ => "reference array",
    }
}
