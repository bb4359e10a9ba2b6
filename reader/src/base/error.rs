use std::path::PathBuf;

use snafu::prelude::*;

use crate::tables::TableError;

/// Error type for decoding errors.
///
/// This is used to report errors while decoding a class file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodingError {
    #[snafu(display("Unable to read class file {}: {}", path.display(), source))]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Read failed at offset {:#x}: {}", offset, source))]
    Read { offset: u32, source: binrw::Error },

    #[snafu(display("Read of {} bytes at offset {:#x} is out of bounds (size: {})", length, offset, size))]
    OutOfBounds { offset: u32, length: u32, size: usize },

    #[snafu(display("Unsupported constant tag {} at constant pool entry {}", tag, index))]
    UnsupportedConstantTag { tag: u8, index: u32 },

    #[snafu(display("Column {} has type {} which cannot be decoded here", column, column_type))]
    UnsupportedColumnType { column: String, column_type: String },

    #[snafu(display("Attributes nested more than {} levels deep at offset {:#x}", limit, offset))]
    NestingTooDeep { offset: u32, limit: usize },

    #[snafu(display("Invalid modified UTF-8 string at offset {:#x}", offset))]
    InvalidModifiedUtf8 { offset: u32 },

    #[snafu(display("Invalid this_class name, at entry {}: {}", index, message.as_deref().unwrap_or("<no context provided>")))]
    InvalidThisClass { index: usize, message: Option<String> },

    #[snafu(display("Invalid super_class name, at entry {}: {}", index, message.as_deref().unwrap_or("<no context provided>")))]
    InvalidSuperClass { index: usize, message: Option<String> },

    #[snafu(display("Invalid interface name, at entry {}: {}", index, message.as_deref().unwrap_or("<no context provided>")))]
    InvalidInterface { index: usize, message: Option<String> },

    #[snafu(context(false), display("Table error: {}", source))]
    Table { source: TableError },
}
