//! Attribute pool.
//!
//! Attributes are stored in tables keyed by their name. A table is created the
//! first time an attribute of that name is met, with the record shape known
//! for that name, or a single raw column for names without one.
//!
//! Ref: <https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7>

use std::sync::Arc;

use binrw::BinRead;
use snafu::{ensure, OptionExt};

use crate::base::{error::*, ByteSource, PayloadReader, U2, U4};
use crate::constant_pool::{ConstantTables, DisplayCells};
use crate::tables::{
    column::describe, Cell, Column, ColumnType, Reference, Row, Table, TableError, Tables,
    TypedRow, TypedTable, Value,
};

pub mod rows;

pub use rows::*;

/// Deepest level of attributes nested in other attributes.
pub const MAX_NESTING: usize = 16;

/// Reference to a row of the attribute pool.
pub type AttributeReference = Reference<String>;

/// Fixed header of every `attribute_info`.
#[derive(BinRead, Debug, Clone)]
#[br(big)]
pub struct AttributeHeader {
    /// Index of the attribute name in the constant pool.
    pub attribute_name_index: U2,
    /// Length of the payload following the header.
    pub attribute_length: U4,
}

impl AttributeHeader {
    pub const SIZE: U4 = 6;
}

/// Attribute names with a dedicated record shape.
///
/// The `*Ref` kinds are the element shapes of the attributes holding a table
/// of sub-records (e.g. the entries of a `LineNumberTable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    ConstantValue,
    Code,
    ExceptionTableRef,
    Exceptions,
    InnerClasses,
    InnerClassesRef,
    EnclosingMethod,
    Signature,
    SourceFile,
    SourceDebugExtension,
    LineNumberTable,
    LineNumberTableRef,
    LocalVariableTable,
    LocalVariableTableRef,
    LocalVariableTypeTable,
    LocalVariableTypeTableRef,
    BootstrapMethods,
    BootstrapMethodsRef,
    MethodParameters,
    MethodParametersRef,
    NestHost,
    NestMembers,
    PermittedSubclasses,
    Deprecated,
    Synthetic,
    // Known, kept as raw bytes.
    StackMapTable,
    RuntimeVisibleAnnotations,
    RuntimeInvisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
    RuntimeInvisibleParameterAnnotations,
    RuntimeVisibleTypeAnnotations,
    RuntimeInvisibleTypeAnnotations,
    AnnotationDefault,
}

/// Shape of the attributes stored as their raw payload.
pub const RAW_LAYOUT: (&[ColumnType], &[&str]) = (&[ColumnType::Raw], &["info"]);

impl AttributeKind {
    pub const ALL: [AttributeKind; 33] = [
        AttributeKind::ConstantValue,
        AttributeKind::Code,
        AttributeKind::ExceptionTableRef,
        AttributeKind::Exceptions,
        AttributeKind::InnerClasses,
        AttributeKind::InnerClassesRef,
        AttributeKind::EnclosingMethod,
        AttributeKind::Signature,
        AttributeKind::SourceFile,
        AttributeKind::SourceDebugExtension,
        AttributeKind::LineNumberTable,
        AttributeKind::LineNumberTableRef,
        AttributeKind::LocalVariableTable,
        AttributeKind::LocalVariableTableRef,
        AttributeKind::LocalVariableTypeTable,
        AttributeKind::LocalVariableTypeTableRef,
        AttributeKind::BootstrapMethods,
        AttributeKind::BootstrapMethodsRef,
        AttributeKind::MethodParameters,
        AttributeKind::MethodParametersRef,
        AttributeKind::NestHost,
        AttributeKind::NestMembers,
        AttributeKind::PermittedSubclasses,
        AttributeKind::Deprecated,
        AttributeKind::Synthetic,
        AttributeKind::StackMapTable,
        AttributeKind::RuntimeVisibleAnnotations,
        AttributeKind::RuntimeInvisibleAnnotations,
        AttributeKind::RuntimeVisibleParameterAnnotations,
        AttributeKind::RuntimeInvisibleParameterAnnotations,
        AttributeKind::RuntimeVisibleTypeAnnotations,
        AttributeKind::RuntimeInvisibleTypeAnnotations,
        AttributeKind::AnnotationDefault,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        AttributeKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Attribute name, as found in the constant pool.
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::ConstantValue => "ConstantValue",
            AttributeKind::Code => "Code",
            AttributeKind::ExceptionTableRef => "ExceptionTableRef",
            AttributeKind::Exceptions => "Exceptions",
            AttributeKind::InnerClasses => "InnerClasses",
            AttributeKind::InnerClassesRef => "InnerClassesRef",
            AttributeKind::EnclosingMethod => "EnclosingMethod",
            AttributeKind::Signature => "Signature",
            AttributeKind::SourceFile => "SourceFile",
            AttributeKind::SourceDebugExtension => "SourceDebugExtension",
            AttributeKind::LineNumberTable => "LineNumberTable",
            AttributeKind::LineNumberTableRef => "LineNumberTableRef",
            AttributeKind::LocalVariableTable => "LocalVariableTable",
            AttributeKind::LocalVariableTableRef => "LocalVariableTableRef",
            AttributeKind::LocalVariableTypeTable => "LocalVariableTypeTable",
            AttributeKind::LocalVariableTypeTableRef => "LocalVariableTypeTableRef",
            AttributeKind::BootstrapMethods => "BootstrapMethods",
            AttributeKind::BootstrapMethodsRef => "BootstrapMethodsRef",
            AttributeKind::MethodParameters => "MethodParameters",
            AttributeKind::MethodParametersRef => "MethodParametersRef",
            AttributeKind::NestHost => "NestHost",
            AttributeKind::NestMembers => "NestMembers",
            AttributeKind::PermittedSubclasses => "PermittedSubclasses",
            AttributeKind::Deprecated => "Deprecated",
            AttributeKind::Synthetic => "Synthetic",
            AttributeKind::StackMapTable => "StackMapTable",
            AttributeKind::RuntimeVisibleAnnotations => "RuntimeVisibleAnnotations",
            AttributeKind::RuntimeInvisibleAnnotations => "RuntimeInvisibleAnnotations",
            AttributeKind::RuntimeVisibleParameterAnnotations => {
                "RuntimeVisibleParameterAnnotations"
            }
            AttributeKind::RuntimeInvisibleParameterAnnotations => {
                "RuntimeInvisibleParameterAnnotations"
            }
            AttributeKind::RuntimeVisibleTypeAnnotations => "RuntimeVisibleTypeAnnotations",
            AttributeKind::RuntimeInvisibleTypeAnnotations => "RuntimeInvisibleTypeAnnotations",
            AttributeKind::AnnotationDefault => "AnnotationDefault",
        }
    }

    /// Column types and names of the attributes of this kind.
    pub fn layout(&self) -> (&'static [ColumnType], &'static [&'static str]) {
        use ColumnType::*;
        match self {
            AttributeKind::ConstantValue => (&[UInt16], &["constantvalue_index"]),
            AttributeKind::Code => (
                &[UInt16, UInt16, ByteArray, ExceptionTableRef, AttributeRef],
                &["max_stack", "max_locals", "code", "exception_table", "attributes"],
            ),
            AttributeKind::ExceptionTableRef => (
                &[UInt16, UInt16, UInt16, UInt16],
                &["start_pc", "end_pc", "handler_pc", "catch_type"],
            ),
            AttributeKind::Exceptions => (&[ShortArray], &["exception_index_table"]),
            AttributeKind::InnerClasses => (&[InnerClassRef], &["classes"]),
            AttributeKind::InnerClassesRef => (
                &[UInt16, UInt16, UInt16, UInt16],
                &[
                    "inner_class_info_index",
                    "outer_class_info_index",
                    "inner_name_index",
                    "inner_class_access_flags",
                ],
            ),
            AttributeKind::EnclosingMethod => {
                (&[UInt16, UInt16], &["class_index", "method_index"])
            }
            AttributeKind::Signature => (&[UInt16], &["signature_index"]),
            AttributeKind::SourceFile => (&[UInt16], &["sourcefile_index"]),
            AttributeKind::SourceDebugExtension => (&[Raw], &["debug_extension"]),
            AttributeKind::LineNumberTable => (&[LineNumberTableRef], &["line_number_table"]),
            AttributeKind::LineNumberTableRef => {
                (&[UInt16, UInt16], &["start_pc", "line_number"])
            }
            AttributeKind::LocalVariableTable => {
                (&[LocalVariableTableRef], &["local_variable_table"])
            }
            AttributeKind::LocalVariableTableRef => (
                &[UInt16, UInt16, UInt16, UInt16, UInt16],
                &["start_pc", "length", "name_index", "descriptor_index", "index"],
            ),
            AttributeKind::LocalVariableTypeTable => {
                (&[LocalVariableTypeTableRef], &["local_variable_type_table"])
            }
            AttributeKind::LocalVariableTypeTableRef => (
                &[UInt16, UInt16, UInt16, UInt16, UInt16],
                &["start_pc", "length", "name_index", "signature_index", "index"],
            ),
            AttributeKind::BootstrapMethods => (&[BootstrapMethodsRef], &["bootstrap_methods"]),
            AttributeKind::BootstrapMethodsRef => (
                &[UInt16, ShortArray],
                &["bootstrap_method_ref", "bootstrap_arguments"],
            ),
            AttributeKind::MethodParameters => (&[MethodParametersRef], &["parameters"]),
            AttributeKind::MethodParametersRef => {
                (&[UInt16, UInt16], &["name_index", "access_flags"])
            }
            AttributeKind::NestHost => (&[UInt16], &["host_class_index"]),
            AttributeKind::NestMembers | AttributeKind::PermittedSubclasses => {
                (&[ShortArray], &["classes"])
            }
            AttributeKind::Deprecated
            | AttributeKind::Synthetic
            | AttributeKind::StackMapTable
            | AttributeKind::RuntimeVisibleAnnotations
            | AttributeKind::RuntimeInvisibleAnnotations
            | AttributeKind::RuntimeVisibleParameterAnnotations
            | AttributeKind::RuntimeInvisibleParameterAnnotations
            | AttributeKind::RuntimeVisibleTypeAnnotations
            | AttributeKind::RuntimeInvisibleTypeAnnotations
            | AttributeKind::AnnotationDefault => RAW_LAYOUT,
        }
    }
}

/// The decoded attributes of a class file, for the class and all its members.
#[derive(Debug, Default)]
pub struct AttributeTables {
    tables: Tables<String>,
    depth: usize,
}

impl AttributeTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &Tables<String> {
        &self.tables
    }

    pub fn resolve(&self, reference: &AttributeReference) -> Result<&Row<String>, TableError> {
        reference.resolve(&self.tables)
    }

    /// Read `count` attributes laid out from the absolute `offset`.
    ///
    /// On success `offset` points right after the last attribute.
    pub fn read_attributes(
        &mut self,
        source: &ByteSource,
        constants: &ConstantTables,
        count: U2,
        offset: &mut U4,
    ) -> Result<Vec<AttributeReference>, DecodingError> {
        let mut references = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let header = source
                .reader(*offset, AttributeHeader::SIZE)?
                .with_cursor(|c| AttributeHeader::read(c))?;
            *offset = offset.saturating_add(AttributeHeader::SIZE);
            let mut payload = source.reader(*offset, header.attribute_length)?;
            *offset = offset.saturating_add(header.attribute_length);
            references.push(self.parse_attribute(constants, &header, &mut payload)?);
        }
        Ok(references)
    }

    /// Read `count` attributes nested in the payload `reader` is positioned in.
    ///
    /// Fails with [DecodingError::NestingTooDeep] past [MAX_NESTING] levels.
    pub fn read_sub_attributes(
        &mut self,
        constants: &ConstantTables,
        reader: &mut PayloadReader<'_>,
        count: U2,
    ) -> Result<Vec<AttributeReference>, DecodingError> {
        ensure!(
            self.depth < MAX_NESTING,
            NestingTooDeepSnafu {
                offset: reader.offset(),
                limit: MAX_NESTING,
            }
        );
        self.depth += 1;
        let references = self.read_nested(constants, reader, count);
        self.depth -= 1;
        references
    }

    fn read_nested(
        &mut self,
        constants: &ConstantTables,
        reader: &mut PayloadReader<'_>,
        count: U2,
    ) -> Result<Vec<AttributeReference>, DecodingError> {
        let mut references = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let header = reader.with_cursor(|c| AttributeHeader::read(c))?;
            let offset = reader.offset();
            let bytes = reader.read_slice(header.attribute_length)?;
            let mut payload = PayloadReader::new(bytes, offset);
            references.push(self.parse_attribute(constants, &header, &mut payload)?);
        }
        Ok(references)
    }

    /// Decode one row of the sub-record table `name` from `reader`.
    pub fn read_sub_data(
        &mut self,
        constants: &ConstantTables,
        name: &str,
        reader: &mut PayloadReader<'_>,
    ) -> Result<AttributeReference, DecodingError> {
        self.get_or_create_table(name)?;
        let index = self.read_row(constants, name, reader)?;
        Ok(Reference::new(name.to_string(), index))
    }

    /// Decode a whole attribute payload into a row of the table of its name.
    fn parse_attribute(
        &mut self,
        constants: &ConstantTables,
        header: &AttributeHeader,
        payload: &mut PayloadReader<'_>,
    ) -> Result<AttributeReference, DecodingError> {
        let name = constants.utf8(header.attribute_name_index)?;
        let reference = self.read_sub_data(constants, name, payload)?;
        if payload.remaining() > 0 {
            log::warn!(target: "reader::attribute",
                "Attribute {} at {:#x} left {} unread bytes", name, payload.offset(), payload.remaining());
        }
        Ok(reference)
    }

    fn get_or_create_table(&mut self, name: &str) -> Result<(), TableError> {
        let tag = name.to_string();
        if self.tables.contains_table(&tag) {
            return Ok(());
        }
        let (types, names) = match AttributeKind::from_name(name) {
            Some(kind) => kind.layout(),
            None => {
                log::warn!(target: "reader::attribute", "Unknown attribute {}, kept as raw bytes", name);
                RAW_LAYOUT
            }
        };
        let columns = describe(&tag, types, names)?;
        log::debug!(target: "reader::attribute", "Creating attribute table {} ({} columns)", name, columns.len());
        self.tables.add_table(Table::new(tag, columns)?)
    }

    fn read_row(
        &mut self,
        constants: &ConstantTables,
        name: &str,
        reader: &mut PayloadReader<'_>,
    ) -> Result<u32, DecodingError> {
        let tag = name.to_string();
        let columns = self.tables.table(&tag)?.columns().to_vec();
        let mut cells = Vec::with_capacity(columns.len());
        for column in columns {
            cells.push(self.read_cell(constants, column, reader)?);
        }
        let row = Row::new(tag, 0, cells)?;
        let index = self.tables.add_row(row)?;
        if let Ok(row) = self.tables.row_by_index(index) {
            log::trace!(target: "reader::attribute", "#{} = {} {}", index, name, DisplayCells(row));
        }
        Ok(index)
    }

    fn read_cell(
        &mut self,
        constants: &ConstantTables,
        column: Arc<Column<String>>,
        reader: &mut PayloadReader<'_>,
    ) -> Result<Cell<String>, DecodingError> {
        let start = reader.position();
        let (raw_value, value) = match column.column_type() {
            ColumnType::Byte => {
                let value = reader.read_u8()?;
                (value as U4, Value::Byte(value))
            }
            ColumnType::UInt16 => {
                let value = reader.read_u16()?;
                (value as U4, Value::UInt16(value))
            }
            ColumnType::UInt32 => {
                let value = reader.read_u32()?;
                (value, Value::UInt32(value))
            }
            ColumnType::ByteArray => {
                let length = reader.read_u32()?;
                (length, Value::Bytes(reader.read_bytes(length)?))
            }
            ColumnType::ShortArray => {
                let count = reader.read_u16()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(reader.read_u16()?);
                }
                (count as U4, Value::Shorts(values))
            }
            ColumnType::Raw => {
                let bytes = reader.read_to_end();
                (bytes.len() as U4, Value::Bytes(bytes))
            }
            ColumnType::AttributeRef => {
                let count = reader.read_u16()?;
                let references = self.read_sub_attributes(constants, reader, count)?;
                (count as U4, Value::References(references))
            }
            ColumnType::Utf8String => {
                return UnsupportedColumnTypeSnafu {
                    column: column.name(),
                    column_type: "Utf8String",
                }
                .fail()
            }
            sub_record => {
                let sub_table = sub_record.sub_table().context(UnsupportedColumnTypeSnafu {
                    column: column.name(),
                    column_type: format!("{:?}", sub_record),
                })?;
                // parameters_count is a u1
                let count = match sub_record {
                    ColumnType::MethodParametersRef => reader.read_u8()? as U2,
                    _ => reader.read_u16()?,
                };
                let mut references = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    references.push(self.read_sub_data(constants, sub_table, reader)?);
                }
                (count as U4, Value::References(references))
            }
        };
        let size = reader.position() - start;
        Ok(Cell::new(column, raw_value, value, size)?)
    }

    /// Typed view over the table `name`, `None` if no such attribute was read.
    pub fn typed<'a, R: TypedRow<'a, String> + 'a>(
        &'a self,
        name: &str,
    ) -> Option<TypedTable<'a, R, String>> {
        self.tables.find_table(&name.to_string()).map(TypedTable::new)
    }

    /// First attribute named `name` among `references`.
    pub fn find<'a, R: TypedRow<'a, String>>(
        &'a self,
        references: &[AttributeReference],
        name: &str,
    ) -> Result<Option<R>, TableError> {
        references
            .iter()
            .find(|reference| reference.table().map(String::as_str) == Some(name))
            .map(|reference| self.resolve(reference).map(R::wrap))
            .transpose()
    }

    /// Attributes stored as their raw payload under `name`.
    pub fn raw(&self, name: &str) -> Option<TypedTable<'_, RawRow<'_>, String>> {
        self.typed(name)
    }
}

macro_rules! typed_tables {
    ($($fn_name:ident => $kind:ident, $row:ident;)*) => {
        impl AttributeTables {
            $(
                pub fn $fn_name(&self) -> Option<TypedTable<'_, $row<'_>, String>> {
                    self.typed(AttributeKind::$kind.name())
                }
            )*
        }
    };
}

typed_tables! {
    constant_value => ConstantValue, ConstantValueRow;
    code => Code, CodeRow;
    exception_table => ExceptionTableRef, ExceptionTableRow;
    exceptions => Exceptions, ExceptionsRow;
    inner_classes => InnerClasses, InnerClassesRow;
    inner_class_entries => InnerClassesRef, InnerClassRow;
    enclosing_method => EnclosingMethod, EnclosingMethodRow;
    signature => Signature, SignatureRow;
    source_file => SourceFile, SourceFileRow;
    source_debug_extension => SourceDebugExtension, SourceDebugExtensionRow;
    line_number_table => LineNumberTable, LineNumberTableRow;
    line_numbers => LineNumberTableRef, LineNumberRow;
    local_variable_table => LocalVariableTable, LocalVariableTableRow;
    local_variables => LocalVariableTableRef, LocalVariableRow;
    local_variable_type_table => LocalVariableTypeTable, LocalVariableTypeTableRow;
    local_variable_types => LocalVariableTypeTableRef, LocalVariableTypeRow;
    bootstrap_methods => BootstrapMethods, BootstrapMethodsRow;
    bootstrap_method_entries => BootstrapMethodsRef, BootstrapMethodRow;
    method_parameters => MethodParameters, MethodParametersRow;
    method_parameter_entries => MethodParametersRef, MethodParameterRow;
    nest_host => NestHost, NestHostRow;
    nest_members => NestMembers, NestMembersRow;
    permitted_subclasses => PermittedSubclasses, PermittedSubclassesRow;
}
