use std::path::Path;

use binrw::{binread, BinRead};
use flagset::{flags, FlagSet};
use snafu::ResultExt;

use super::{error::*, ByteSource, U1, U2, U4};
use crate::attribute::{AttributeReference, AttributeTables, CodeRow, ConstantValueRow};
use crate::constant_pool::ConstantTables;
use crate::tables::TableError;

/// Fixed header of a class file, up to the constant pool.
#[derive(BinRead, Debug, Clone)]
#[br(big, magic = 0xCAFEBABEu32)]
struct ClassHeader {
    /// Minor version of the class file format
    /// Should be 0 for Java 5 and above.
    minor_version: U2,
    /// Major version of the class file format
    /// Should be 1-incremented per major release of Java
    /// starting at Major 49 for Java 5.
    major_version: U2,
    // The number of entries in the constant pool table plus one.
    constant_pool_count: U2,
}

/// Fixed part of a class file following the constant pool.
#[binread]
#[derive(Debug, Clone)]
#[br(big)]
struct ClassInfoHeader {
    #[br(map = |x: U2| FlagSet::<ClassAccessFlags>::new_truncated(x))]
    access_flags: FlagSet<ClassAccessFlags>,
    this_class: U2,
    super_class: U2,
    #[br(temp)]
    interfaces_count: U2,
    #[br(count = interfaces_count)]
    interfaces: Vec<U2>,
}

/// Fixed part of a `field_info` or `method_info`.
#[derive(BinRead, Debug, Clone)]
#[br(big)]
struct MemberHeader {
    access_flags: U2,
    name_index: U2,
    descriptor_index: U2,
    attributes_count: U2,
}

/// Model of a Class File
///
/// The classfile structure represents the entire class file read.
/// Note: One class or module is always represented by one class file.
///
/// The constant pool is decoded first, then the members and the attributes,
/// which are all gathered in a single attribute pool.
#[derive(Debug)]
pub struct ClassFile {
    source: ByteSource,
    minor_version: U2,
    major_version: U2,
    constant_pool: ConstantTables,
    /// Flags indicating access permissions to and properties of this class,
    /// interface or module.
    access_flags: FlagSet<ClassAccessFlags>,
    /// Pointer to the `Class` entry of the current class/interface.
    this_class: U2,
    /// Pointer to the `Class` entry of the super class, 0 for [java.lang.Object].
    super_class: U2,
    /// The direct super interfaces, in declaration order.
    interfaces: Vec<U2>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    attribute_pool: AttributeTables,
    attributes: Vec<AttributeReference>,
}

impl ClassFile {
    /// Read a class file from its bytes.
    pub fn from_bytes(bytes: impl Into<Vec<U1>>) -> Result<Self, DecodingError> {
        let source = ByteSource::new(bytes);

        let mut reader = source.reader_at(0)?;
        let header = reader.with_cursor(|c| ClassHeader::read(c))?;
        let mut offset = reader.position();
        log::debug!(target: "reader::classfile",
            "Reading class file version {}.{}", header.major_version, header.minor_version);

        let constant_pool =
            ConstantTables::read(&source, header.constant_pool_count, &mut offset)?;

        let mut reader = source.reader_at(offset)?;
        let info = reader.with_cursor(|c| ClassInfoHeader::read(c))?;
        offset += reader.position();

        let mut attribute_pool = AttributeTables::new();
        let fields_count = source.read_u16(offset)?;
        offset += 2;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            let member = Member::read(&source, &constant_pool, &mut attribute_pool, &mut offset)?;
            fields.push(FieldInfo {
                access_flags: FlagSet::new_truncated(member.header.access_flags),
                name_index: member.header.name_index,
                descriptor_index: member.header.descriptor_index,
                attributes: member.attributes,
                offset: member.offset,
                data_length: member.data_length,
            });
        }

        let methods_count = source.read_u16(offset)?;
        offset += 2;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            let member = Member::read(&source, &constant_pool, &mut attribute_pool, &mut offset)?;
            methods.push(MethodInfo {
                access_flags: FlagSet::new_truncated(member.header.access_flags),
                name_index: member.header.name_index,
                descriptor_index: member.header.descriptor_index,
                attributes: member.attributes,
                offset: member.offset,
                data_length: member.data_length,
            });
        }

        let attributes_count = source.read_u16(offset)?;
        offset += 2;
        let attributes =
            attribute_pool.read_attributes(&source, &constant_pool, attributes_count, &mut offset)?;

        if (offset as usize) < source.len() {
            log::warn!(target: "reader::classfile",
                "{} trailing bytes after the class file", source.len() - offset as usize);
        }
        log::debug!(target: "reader::classfile",
            "Read {} fields, {} methods, {} attributes ({} attribute rows)",
            fields.len(), methods.len(), attributes.len(), attribute_pool.tables().row_count());

        Ok(Self {
            source,
            minor_version: header.minor_version,
            major_version: header.major_version,
            constant_pool,
            access_flags: info.access_flags,
            this_class: info.this_class,
            super_class: info.super_class,
            interfaces: info.interfaces,
            fields,
            methods,
            attribute_pool,
            attributes,
        })
    }

    /// Read a class file from the filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodingError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).context(OpenSnafu { path })?;
        Self::from_bytes(bytes)
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    pub fn minor_version(&self) -> U2 {
        self.minor_version
    }

    pub fn major_version(&self) -> U2 {
        self.major_version
    }

    /// Get a reference to the constant pool of this class file.
    pub fn constant_pool(&self) -> &ConstantTables {
        &self.constant_pool
    }

    /// Every attribute of the class, its fields, its methods and their code.
    pub fn attribute_pool(&self) -> &AttributeTables {
        &self.attribute_pool
    }

    /// Get the access flags of this class.
    pub fn access_flags(&self) -> FlagSet<ClassAccessFlags> {
        self.access_flags
    }

    pub fn this_class(&self) -> U2 {
        self.this_class
    }

    pub fn super_class(&self) -> U2 {
        self.super_class
    }

    pub fn interfaces(&self) -> &[U2] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Attributes of the class itself.
    pub fn attributes(&self) -> &[AttributeReference] {
        &self.attributes
    }

    /// Get the name of the current class.
    pub fn class_name(&self) -> Result<&str, DecodingError> {
        self.constant_pool
            .class_name(self.this_class)
            .map_err(|e| DecodingError::InvalidThisClass {
                index: self.this_class as usize,
                message: Some(e.to_string()),
            })
    }

    /// Get the name of the super class.
    ///
    /// Returns `Ok(None)` if the class has no super class, which is only the
    /// case of [java.lang.Object].
    pub fn super_class_name(&self) -> Result<Option<&str>, DecodingError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool
            .class_name(self.super_class)
            .map(Some)
            .map_err(|e| DecodingError::InvalidSuperClass {
                index: self.super_class as usize,
                message: Some(e.to_string()),
            })
    }

    /// Get the name of the super interfaces.
    pub fn interfaces_names(&self) -> Result<Vec<&str>, DecodingError> {
        self.interfaces
            .iter()
            .map(|interface| {
                self.constant_pool
                    .class_name(*interface)
                    .map_err(|e| DecodingError::InvalidInterface {
                        index: *interface as usize,
                        message: Some(e.to_string()),
                    })
            })
            .collect()
    }
}

/// A field or method record, as read before being projected.
struct Member {
    header: MemberHeader,
    attributes: Vec<AttributeReference>,
    offset: U4,
    data_length: U4,
}

impl Member {
    fn read(
        source: &ByteSource,
        constants: &ConstantTables,
        attribute_pool: &mut AttributeTables,
        offset: &mut U4,
    ) -> Result<Self, DecodingError> {
        let start = *offset;
        let mut reader = source.reader_at(start)?;
        let header = reader.with_cursor(|c| MemberHeader::read(c))?;
        *offset += reader.position();
        let attributes =
            attribute_pool.read_attributes(source, constants, header.attributes_count, offset)?;
        Ok(Self {
            header,
            attributes,
            offset: start,
            data_length: *offset - start,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Access flags denoting the permissions and properties of this field.
    pub access_flags: FlagSet<FieldAccessFlags>,
    /// Index of the `Utf8` entry holding the unqualified name of the field.
    pub name_index: U2,
    /// Index of the `Utf8` entry holding the field descriptor.
    pub descriptor_index: U2,
    /// Attribute table of the field
    pub attributes: Vec<AttributeReference>,
    offset: U4,
    data_length: U4,
}

impl FieldInfo {
    pub fn name<'a>(&self, constants: &'a ConstantTables) -> Result<&'a str, TableError> {
        constants.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, constants: &'a ConstantTables) -> Result<&'a str, TableError> {
        constants.utf8(self.descriptor_index)
    }

    /// Raw bytes of the `field_info` record, attributes included.
    pub fn data<'a>(&self, class: &'a ClassFile) -> Result<&'a [U1], DecodingError> {
        class.source().read_bytes(self.offset, self.data_length)
    }

    /// The `ConstantValue` attribute of a constant field.
    pub fn constant_value<'a>(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Option<ConstantValueRow<'a>>, TableError> {
        pool.find(&self.attributes, "ConstantValue")
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Access flags denoting the permissions and properties of this method.
    pub access_flags: FlagSet<MethodAccessFlags>,
    /// Index of the `Utf8` entry holding the unqualified name of the method.
    pub name_index: U2,
    /// Index of the `Utf8` entry holding the method descriptor.
    pub descriptor_index: U2,
    /// Attribute table of the method
    pub attributes: Vec<AttributeReference>,
    offset: U4,
    data_length: U4,
}

impl MethodInfo {
    pub fn name<'a>(&self, constants: &'a ConstantTables) -> Result<&'a str, TableError> {
        constants.utf8(self.name_index)
    }

    pub fn descriptor<'a>(&self, constants: &'a ConstantTables) -> Result<&'a str, TableError> {
        constants.utf8(self.descriptor_index)
    }

    /// Raw bytes of the `method_info` record, attributes included.
    pub fn data<'a>(&self, class: &'a ClassFile) -> Result<&'a [U1], DecodingError> {
        class.source().read_bytes(self.offset, self.data_length)
    }

    /// The `Code` attribute, `None` for abstract and native methods.
    pub fn code<'a>(&self, pool: &'a AttributeTables) -> Result<Option<CodeRow<'a>>, TableError> {
        pool.find(&self.attributes, "Code")
    }
}

flags! {
    /// Access flags for classes, interfaces and modules.
    /// See [JVMS 4.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.1).
    pub enum ClassAccessFlags: U2 {
        /// Declared public; may be accessed from outside its package.
        Public = 0x0001,
        /// Declared final; no subclasses allowed.
        Final = 0x0010,
        /// Treat superclass methods specially when invoked by the invokespecial
        /// instruction.
        Super = 0x0020,
        /// Is an interface, not a class.
        Interface = 0x0200,
        /// Declared abstract; must not be instantiated.
        Abstract = 0x0400,
        /// Declared synthetic; not present in the source code.
        Synthetic = 0x1000,
        /// Declared as an annotation interface.
        Annotation = 0x2000,
        /// Declared as an enum class.
        Enum = 0x4000,
        /// Module, not a class or interface.
        Module = 0x8000,
    }

    /// Access flags for fields.
    /// See [JVMS 4.5](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.5).
    pub enum FieldAccessFlags: U2 {
        Public = 0x0001,
        Private = 0x0002,
        Protected = 0x0004,
        Static = 0x0008,
        /// Declared final; never directly assigned to after object construction.
        Final = 0x0010,
        /// Declared volatile; cannot be cached.
        Volatile = 0x0040,
        /// Declared transient; not written or read by a persistent object manager.
        Transient = 0x0080,
        Synthetic = 0x1000,
        /// Declared as an element of an enum.
        Enum = 0x4000,
    }

    /// Access flags for methods.
    /// See [JVMS 4.6](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.6).
    pub enum MethodAccessFlags: U2 {
        Public = 0x0001,
        Private = 0x0002,
        Protected = 0x0004,
        Static = 0x0008,
        /// Declared final; must not be overridden.
        Final = 0x0010,
        /// Declared synchronized; invocation is wrapped by a monitor use.
        Synchronized = 0x0020,
        /// A bridge method, generated by the compiler.
        Bridge = 0x0040,
        /// Declared with variable number of arguments.
        Varargs = 0x0080,
        /// Declared native; implemented in a language other than Java.
        Native = 0x0100,
        /// Declared abstract; no implementation is provided.
        Abstract = 0x0400,
        /// Declared strictfp; floating-point mode is FP-strict.
        /// Deprecated, since Java SE 17.
        Strict = 0x0800,
        Synthetic = 0x1000,
    }

    /// Access flags of an `InnerClasses` entry.
    /// See [JVMS 4.7.6](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.6).
    pub enum InnerClassAccessFlags: U2 {
        Public = 0x0001,
        Private = 0x0002,
        Protected = 0x0004,
        Static = 0x0008,
        Final = 0x0010,
        Interface = 0x0200,
        Abstract = 0x0400,
        Synthetic = 0x1000,
        Annotation = 0x2000,
        Enum = 0x4000,
    }

    /// Access flags of a `MethodParameters` entry.
    /// See [JVMS 4.7.24](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.24).
    pub enum ParameterAccessFlags: U2 {
        Final = 0x0010,
        Synthetic = 0x1000,
        /// Implicitly declared, as mandated by the language.
        Mandated = 0x8000,
    }
}
