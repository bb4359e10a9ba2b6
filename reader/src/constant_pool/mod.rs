//! Constant pool, decoded into one table per constant kind.
//!
//! Ref: <https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.4>

use std::{fmt, sync::Arc};

use cesu8::from_java_cesu8;
use snafu::OptionExt;

use crate::base::{error::*, ByteSource, U1, U2, U4};
use crate::tables::{
    column::describe, Cell, Column, ColumnType, Reference, Row, Table, TableError, Tables,
    TypedTable, Value,
};

pub mod rows;

pub use rows::*;

/// Reference to a constant pool entry.
///
/// Rows of the pool are registered under their constant pool index, so the
/// transparent index of a reference is the constant pool index itself.
pub type ConstantReference = Reference<ConstantTag>;

/// Tag of a constant pool entry, selecting its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

impl ConstantTag {
    pub const ALL: [ConstantTag; 17] = [
        ConstantTag::Utf8,
        ConstantTag::Integer,
        ConstantTag::Float,
        ConstantTag::Long,
        ConstantTag::Double,
        ConstantTag::Class,
        ConstantTag::String,
        ConstantTag::Fieldref,
        ConstantTag::Methodref,
        ConstantTag::InterfaceMethodref,
        ConstantTag::NameAndType,
        ConstantTag::MethodHandle,
        ConstantTag::MethodType,
        ConstantTag::Dynamic,
        ConstantTag::InvokeDynamic,
        ConstantTag::Module,
        ConstantTag::Package,
    ];

    /// Whether the constant takes two slots of the pool.
    ///
    /// The slot following a `Long` or a `Double` is unusable and has no row.
    pub fn is_wide(&self) -> bool {
        matches!(self, ConstantTag::Long | ConstantTag::Double)
    }

    /// Column types and names of the entries of this kind.
    pub fn layout(&self) -> (&'static [ColumnType], &'static [&'static str]) {
        use ColumnType::*;
        match self {
            ConstantTag::Utf8 => (&[Utf8String], &["bytes"]),
            ConstantTag::Integer | ConstantTag::Float => (&[UInt32], &["bytes"]),
            ConstantTag::Long | ConstantTag::Double => {
                (&[UInt32, UInt32], &["high_bytes", "low_bytes"])
            }
            ConstantTag::Class | ConstantTag::Module | ConstantTag::Package => {
                (&[UInt16], &["name_index"])
            }
            ConstantTag::String => (&[UInt16], &["string_index"]),
            ConstantTag::Fieldref | ConstantTag::Methodref | ConstantTag::InterfaceMethodref => {
                (&[UInt16, UInt16], &["class_index", "name_and_type_index"])
            }
            ConstantTag::NameAndType => (&[UInt16, UInt16], &["name_index", "descriptor_index"]),
            ConstantTag::MethodHandle => (&[Byte, UInt16], &["reference_kind", "reference_index"]),
            ConstantTag::MethodType => (&[UInt16], &["descriptor_index"]),
            ConstantTag::Dynamic | ConstantTag::InvokeDynamic => (
                &[UInt16, UInt16],
                &["bootstrap_method_attr_index", "name_and_type_index"],
            ),
        }
    }
}

impl TryFrom<U1> for ConstantTag {
    type Error = U1;

    fn try_from(tag: U1) -> Result<Self, Self::Error> {
        ConstantTag::ALL
            .into_iter()
            .find(|candidate| *candidate as U1 == tag)
            .ok_or(tag)
    }
}

impl fmt::Display for ConstantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The decoded constant pool of a class file.
#[derive(Debug)]
pub struct ConstantTables {
    tables: Tables<ConstantTag>,
    /// Offset of the first entry in the class file.
    offset: U4,
    /// Byte length of all the entries.
    data_length: U4,
    /// `constant_pool_count` as declared by the class file.
    count: U2,
}

impl ConstantTables {
    /// Read `count - 1` constant pool slots starting at `offset`.
    ///
    /// On success `offset` points right after the last entry.
    pub fn read(source: &ByteSource, count: U2, offset: &mut U4) -> Result<Self, DecodingError> {
        let start = *offset;
        let mut tables = Tables::new();
        for tag in ConstantTag::ALL {
            let (types, names) = tag.layout();
            let columns = describe(&tag, types, names)?;
            tables.add_table(Table::new(tag, columns)?)?;
        }
        log::debug!(target: "reader::constant_pool",
            "Reading constant pool at {:#x}, {} slots", start, count.saturating_sub(1));

        let mut index = 1u32;
        while index < count as u32 {
            let tag = source.read_u8(*offset)?;
            let tag = ConstantTag::try_from(tag)
                .ok()
                .context(UnsupportedConstantTagSnafu { tag, index })?;
            *offset = offset.saturating_add(1);

            let columns = tables.table(&tag)?.columns().to_vec();
            let mut cells = Vec::with_capacity(columns.len());
            for column in columns {
                cells.push(read_cell(source, column, offset)?);
            }
            let row = Row::new(tag, index, cells)?;
            log::trace!(target: "reader::constant_pool", "#{} = {} {}", index, tag, DisplayCells(&row));
            tables.add_row_at(index, row)?;

            index += if tag.is_wide() { 2 } else { 1 };
        }

        Ok(Self {
            tables,
            offset: start,
            data_length: *offset - start,
            count,
        })
    }

    pub fn tables(&self) -> &Tables<ConstantTag> {
        &self.tables
    }

    /// `constant_pool_count` as declared by the class file.
    pub fn count(&self) -> U2 {
        self.count
    }

    pub fn offset(&self) -> U4 {
        self.offset
    }

    pub fn data_length(&self) -> U4 {
        self.data_length
    }

    /// Raw bytes of the whole pool.
    pub fn data<'a>(&self, source: &'a ByteSource) -> Result<&'a [U1], DecodingError> {
        source.read_bytes(self.offset, self.data_length)
    }

    /// Entry at the constant pool index `index`, whatever its kind.
    pub fn get(&self, index: U2) -> Result<&Row<ConstantTag>, TableError> {
        self.tables.row_by_index(index as u32)
    }

    /// Entry of kind `tag` at the constant pool index `index`.
    pub fn entry(&self, tag: ConstantTag, index: U2) -> Result<&Row<ConstantTag>, TableError> {
        self.tables.table(&tag)?.row(index as u32)
    }

    pub fn resolve(&self, reference: &ConstantReference) -> Result<&Row<ConstantTag>, TableError> {
        reference.resolve(&self.tables)
    }

    /// String of the `Utf8` entry at `index`.
    pub fn utf8(&self, index: U2) -> Result<&str, TableError> {
        self.entry(ConstantTag::Utf8, index)?.str(0)
    }

    /// Binary name of the `Class` entry at `index`.
    pub fn class_name(&self, index: U2) -> Result<&str, TableError> {
        let name_index = self.entry(ConstantTag::Class, index)?.u16(0)?;
        self.utf8(name_index)
    }
}

macro_rules! typed_tables {
    ($($(#[$meta:meta])* $fn_name:ident => $tag:ident, $row:ident;)*) => {
        impl ConstantTables {
            $(
                $(#[$meta])*
                pub fn $fn_name(&self) -> Result<TypedTable<'_, $row<'_>, ConstantTag>, TableError> {
                    self.tables.table(&ConstantTag::$tag).map(TypedTable::new)
                }
            )*
        }
    };
}

typed_tables! {
    utf8_table => Utf8, Utf8Row;
    integer_table => Integer, IntegerRow;
    float_table => Float, FloatRow;
    long_table => Long, LongRow;
    double_table => Double, DoubleRow;
    class_table => Class, ClassRow;
    string_table => String, StringRow;
    fieldref_table => Fieldref, FieldrefRow;
    methodref_table => Methodref, MethodrefRow;
    interface_methodref_table => InterfaceMethodref, InterfaceMethodrefRow;
    name_and_type_table => NameAndType, NameAndTypeRow;
    method_handle_table => MethodHandle, MethodHandleRow;
    method_type_table => MethodType, MethodTypeRow;
    dynamic_table => Dynamic, DynamicRow;
    invoke_dynamic_table => InvokeDynamic, InvokeDynamicRow;
    module_table => Module, ModuleRow;
    package_table => Package, PackageRow;
}

/// Decode one cell of a constant pool entry at `offset`, advancing it.
fn read_cell(
    source: &ByteSource,
    column: Arc<Column<ConstantTag>>,
    offset: &mut U4,
) -> Result<Cell<ConstantTag>, DecodingError> {
    let (raw_value, value, size) = match column.column_type() {
        ColumnType::Byte => {
            let value = source.read_u8(*offset)?;
            (value as U4, Value::Byte(value), 1)
        }
        ColumnType::UInt16 => {
            let value = source.read_u16(*offset)?;
            (value as U4, Value::UInt16(value), 2)
        }
        ColumnType::UInt32 => {
            let value = source.read_u32(*offset)?;
            (value, Value::UInt32(value), 4)
        }
        ColumnType::Utf8String => {
            let length = source.read_u16(*offset)? as U4;
            let bytes_offset = offset.saturating_add(2);
            let bytes = source.read_bytes(bytes_offset, length)?;
            let string = from_java_cesu8(bytes)
                .ok()
                .context(InvalidModifiedUtf8Snafu {
                    offset: bytes_offset,
                })?;
            (length, Value::Utf8(string.into_owned()), 2 + length)
        }
        other => {
            return UnsupportedColumnTypeSnafu {
                column: column.name(),
                column_type: format!("{:?}", other),
            }
            .fail()
        }
    };
    *offset = offset.saturating_add(size);
    Ok(Cell::new(column, raw_value, value, size)?)
}

/// Cells of a row as `name=value` pairs.
pub(crate) struct DisplayCells<'a, T>(pub &'a Row<T>);

impl<'a, T: crate::tables::TableTag> fmt::Display for DisplayCells<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.0.cells().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", cell.column().name(), cell.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::testing::PoolBuilder;
    use crate::tables::TypedRow;

    fn read(pool: &PoolBuilder) -> ConstantTables {
        let source = ByteSource::new(pool.bytes());
        let mut offset = 0;
        let constants = ConstantTables::read(&source, pool.count(), &mut offset).unwrap();
        assert_eq!(offset as usize, pool.bytes().len());
        constants
    }

    #[test]
    fn read_class_and_utf8_entries() {
        let mut pool = PoolBuilder::new();
        let code = pool.utf8("Code");
        let object = pool.utf8("java/lang/Object");
        let class = pool.class(object);
        let constants = read(&pool);

        let utf8 = constants.utf8_table().unwrap();
        assert_eq!(utf8.len(), 2);
        let values: Vec<&str> = utf8.iter().map(|row| row.value().unwrap()).collect();
        assert_eq!(values, vec!["Code", "java/lang/Object"]);
        assert_eq!(utf8.get(code as u32).unwrap().value().unwrap(), "Code");

        let classes = constants.class_table().unwrap();
        assert_eq!(classes.len(), 1);
        let row = classes.get(class as u32).unwrap();
        let name = constants.resolve(&row.name_index().unwrap()).unwrap();
        assert_eq!(name.index(), object as u32);
        assert_eq!(name.str(0).unwrap(), "java/lang/Object");
        assert_eq!(row.name(&constants).unwrap(), "java/lang/Object");
        assert_eq!(constants.class_name(class).unwrap(), "java/lang/Object");
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut pool = PoolBuilder::new();
        let long = pool.long(-2);
        let next = pool.utf8("next");
        assert_eq!(next, long + 2);
        let constants = read(&pool);

        let longs = constants.long_table().unwrap();
        assert_eq!(longs.get(long as u32).unwrap().value().unwrap(), -2);
        assert!(longs.get(long as u32 + 1).is_err());
        assert!(matches!(
            constants.get(long + 1),
            Err(TableError::RowNotFound { .. })
        ));
        assert_eq!(constants.get(long + 2).unwrap().str(0).unwrap(), "next");
    }

    #[test]
    fn row_count_matches_pool_count() {
        let mut pool = PoolBuilder::new();
        let name = pool.utf8("value");
        let descriptor = pool.utf8("D");
        pool.double(1.5);
        pool.integer(-7);
        pool.float(0.25);
        pool.long(1 << 40);
        let class = pool.class(name);
        let name_and_type = pool.name_and_type(name, descriptor);
        pool.fieldref(class, name_and_type);
        let constants = read(&pool);

        let rows: usize = constants.tables().iter().map(Table::len).sum();
        let wide = constants.double_table().unwrap().len() + constants.long_table().unwrap().len();
        assert_eq!(rows, constants.tables().row_count());
        assert_eq!(rows + wide + 1, constants.count() as usize);
    }

    #[test]
    fn numeric_values_are_interpreted() {
        let mut pool = PoolBuilder::new();
        let integer = pool.integer(-7);
        let float = pool.float(0.25);
        let long = pool.long(1 << 40);
        let double = pool.double(-1.5);
        let constants = read(&pool);

        let integer = constants.integer_table().unwrap().get(integer as u32).unwrap();
        assert_eq!(integer.value().unwrap(), -7);
        assert_eq!(integer.bytes().unwrap(), (-7i32) as u32);
        let float = constants.float_table().unwrap().get(float as u32).unwrap();
        assert_eq!(float.value().unwrap(), 0.25);
        let long = constants.long_table().unwrap().get(long as u32).unwrap();
        assert_eq!(long.high_bytes().unwrap(), 1 << 8);
        assert_eq!(long.value().unwrap(), 1 << 40);
        let double = constants.double_table().unwrap().get(double as u32).unwrap();
        assert_eq!(double.value().unwrap(), -1.5);
    }

    #[test]
    fn modified_utf8_round_trip() {
        let samples = ["nul\0inside", "clef \u{1D11E}", "", "plain"];
        let mut pool = PoolBuilder::new();
        let indexes: Vec<U2> = samples.iter().map(|s| pool.utf8(s)).collect();
        let constants = read(&pool);

        for (sample, index) in samples.iter().zip(indexes) {
            assert_eq!(constants.utf8(index).unwrap(), *sample);
        }
        let nul = constants.get(1).unwrap().cell(0).unwrap();
        // NUL is encoded on two bytes
        assert_eq!(nul.raw_value(), samples[0].len() as u32 + 1);
        assert_eq!(nul.size(), 2 + nul.raw_value());
        // supplementary characters use a surrogate pair, 6 bytes instead of 4
        let clef = constants.get(2).unwrap().cell(0).unwrap();
        assert_eq!(clef.raw_value(), 5 + 6);
    }

    #[test]
    fn invalid_modified_utf8_fails() {
        let mut pool = PoolBuilder::new();
        pool.raw(ConstantTag::Utf8 as u8, &[0x00, 0x02, 0xC0, 0x41]);
        let source = ByteSource::new(pool.bytes());
        let err = ConstantTables::read(&source, pool.count(), &mut 0).unwrap_err();
        assert!(matches!(err, DecodingError::InvalidModifiedUtf8 { offset: 3 }));
    }

    #[test]
    fn unsupported_tag_fails() {
        let mut pool = PoolBuilder::new();
        pool.utf8("ok");
        pool.raw(2, &[0x00, 0x00]);
        let source = ByteSource::new(pool.bytes());
        let err = ConstantTables::read(&source, pool.count(), &mut 0).unwrap_err();
        assert!(matches!(
            err,
            DecodingError::UnsupportedConstantTag { tag: 2, index: 2 }
        ));
    }

    #[test]
    fn truncated_pool_fails() {
        let mut pool = PoolBuilder::new();
        pool.utf8("java/lang/Object");
        let bytes = pool.bytes();
        let source = ByteSource::new(&bytes[..bytes.len() - 3]);
        let err = ConstantTables::read(&source, pool.count(), &mut 0).unwrap_err();
        assert!(matches!(err, DecodingError::OutOfBounds { .. }));
    }

    #[test]
    fn member_references_resolve() {
        let mut pool = PoolBuilder::new();
        let owner = pool.utf8("java/lang/System");
        let name = pool.utf8("out");
        let descriptor = pool.utf8("Ljava/io/PrintStream;");
        let class = pool.class(owner);
        let name_and_type = pool.name_and_type(name, descriptor);
        let field = pool.fieldref(class, name_and_type);
        let handle = pool.method_handle(2, field);
        let constants = read(&pool);

        let field = constants.fieldref_table().unwrap().get(field as u32).unwrap();
        let class_ref = field.class_index().unwrap();
        assert_eq!(class_ref.table(), Some(&ConstantTag::Class));
        let class_row = ClassRow::wrap(constants.resolve(&class_ref).unwrap());
        assert_eq!(class_row.name(&constants).unwrap(), "java/lang/System");
        let name_and_type = NameAndTypeRow::wrap(
            constants.resolve(&field.name_and_type_index().unwrap()).unwrap(),
        );
        assert_eq!(name_and_type.name(&constants).unwrap(), "out");
        assert_eq!(name_and_type.descriptor(&constants).unwrap(), "Ljava/io/PrintStream;");

        let handle = constants.method_handle_table().unwrap().get(handle as u32).unwrap();
        assert_eq!(handle.reference_kind().unwrap(), ReferenceKind::GetStatic);
        let target = constants.resolve(&handle.reference_index().unwrap()).unwrap();
        assert_eq!(target.index(), field.id());
    }

    #[test]
    fn data_spans_the_whole_pool() {
        let mut pool = PoolBuilder::new();
        pool.utf8("a");
        pool.integer(1);
        let mut bytes = vec![0xCA, 0xFE];
        bytes.extend_from_slice(pool.bytes());
        let source = ByteSource::new(bytes);
        let mut offset = 2;
        let constants = ConstantTables::read(&source, pool.count(), &mut offset).unwrap();
        assert_eq!(constants.offset(), 2);
        assert_eq!(constants.data_length() as usize, pool.bytes().len());
        assert_eq!(constants.data(&source).unwrap(), pool.bytes());
    }
}
