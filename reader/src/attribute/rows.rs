//! Typed views over the rows of the known attribute tables.
//!
//! Indexes into the constant pool are exposed as [ConstantReference]s, to be
//! resolved with [crate::constant_pool::ConstantTables::resolve]. Optional
//! indexes, where zero means "absent", are returned as `None`.

use flagset::FlagSet;

use crate::base::{InnerClassAccessFlags, ParameterAccessFlags};
use crate::constant_pool::{ConstantReference, ConstantTag};
use crate::tables::{resolve_all, typed_row, Reference, Row, TableError, TypedRow};

use super::{AttributeReference, AttributeTables};

fn constant(tag: ConstantTag, index: u16) -> ConstantReference {
    Reference::new(tag, index.into())
}

fn optional_constant(tag: ConstantTag, index: u16) -> Option<ConstantReference> {
    (index != 0).then(|| constant(tag, index))
}

/// Resolve the sub-records referenced by the first column of `row`.
fn entries<'a, R: TypedRow<'a, String>>(
    row: &'a Row<String>,
    pool: &'a AttributeTables,
) -> Result<Vec<R>, TableError> {
    resolve_all(pool.tables(), row.references(0)?)
}

typed_row!(
    /// `ConstantValue` attribute of a field.
    ConstantValueRow,
    String
);

impl<'a> ConstantValueRow<'a> {
    /// The constant value, an `Integer`, `Float`, `Long`, `Double` or
    /// `String` entry depending on the field type.
    pub fn constantvalue_index(&self) -> Result<ConstantReference, TableError> {
        Ok(Reference::untyped(self.row().u16(0)?.into()))
    }
}

typed_row!(
    /// `Code` attribute, the body of a method.
    CodeRow,
    String
);

impl<'a> CodeRow<'a> {
    pub fn max_stack(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    pub fn max_locals(&self) -> Result<u16, TableError> {
        self.row().u16(1)
    }

    /// The bytecode.
    pub fn code(&self) -> Result<&'a [u8], TableError> {
        self.row().bytes(2)
    }

    pub fn exception_table(&self) -> Result<&'a [AttributeReference], TableError> {
        self.row().references(3)
    }

    pub fn exception_handlers(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<ExceptionTableRow<'a>>, TableError> {
        resolve_all(pool.tables(), self.exception_table()?)
    }

    /// Attributes of the code itself (`LineNumberTable`, `StackMapTable`...).
    pub fn attributes(&self) -> Result<&'a [AttributeReference], TableError> {
        self.row().references(4)
    }
}

typed_row!(
    /// Entry of the exception table of a `Code` attribute.
    ExceptionTableRow,
    String
);

impl<'a> ExceptionTableRow<'a> {
    pub fn start_pc(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    pub fn end_pc(&self) -> Result<u16, TableError> {
        self.row().u16(1)
    }

    pub fn handler_pc(&self) -> Result<u16, TableError> {
        self.row().u16(2)
    }

    /// Class of the handled exceptions, `None` for a handler catching all.
    pub fn catch_type(&self) -> Result<Option<ConstantReference>, TableError> {
        Ok(optional_constant(ConstantTag::Class, self.row().u16(3)?))
    }
}

typed_row!(
    /// `Exceptions` attribute, the checked exceptions a method may throw.
    ExceptionsRow,
    String
);

impl<'a> ExceptionsRow<'a> {
    pub fn exception_index_table(&self) -> Result<Vec<ConstantReference>, TableError> {
        let indexes = self.row().shorts(0)?;
        Ok(indexes.iter().map(|index| constant(ConstantTag::Class, *index)).collect())
    }
}

typed_row!(
    /// `InnerClasses` attribute.
    InnerClassesRow,
    String
);

impl<'a> InnerClassesRow<'a> {
    pub fn classes(&self, pool: &'a AttributeTables) -> Result<Vec<InnerClassRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(
    /// Entry of an `InnerClasses` attribute.
    InnerClassRow,
    String
);

impl<'a> InnerClassRow<'a> {
    pub fn inner_class_info_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Class, self.row().u16(0)?))
    }

    /// `None` for top-level, local and anonymous classes.
    pub fn outer_class_info_index(&self) -> Result<Option<ConstantReference>, TableError> {
        Ok(optional_constant(ConstantTag::Class, self.row().u16(1)?))
    }

    /// `None` for anonymous classes.
    pub fn inner_name_index(&self) -> Result<Option<ConstantReference>, TableError> {
        Ok(optional_constant(ConstantTag::Utf8, self.row().u16(2)?))
    }

    pub fn inner_class_access_flags(&self) -> Result<FlagSet<InnerClassAccessFlags>, TableError> {
        Ok(FlagSet::new_truncated(self.row().u16(3)?))
    }
}

typed_row!(
    /// `EnclosingMethod` attribute of local and anonymous classes.
    EnclosingMethodRow,
    String
);

impl<'a> EnclosingMethodRow<'a> {
    pub fn class_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Class, self.row().u16(0)?))
    }

    /// `None` when the class is not enclosed by a method.
    pub fn method_index(&self) -> Result<Option<ConstantReference>, TableError> {
        Ok(optional_constant(ConstantTag::NameAndType, self.row().u16(1)?))
    }
}

typed_row!(SignatureRow, String);

impl<'a> SignatureRow<'a> {
    pub fn signature_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(0)?))
    }
}

typed_row!(SourceFileRow, String);

impl<'a> SourceFileRow<'a> {
    pub fn sourcefile_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(0)?))
    }
}

typed_row!(SourceDebugExtensionRow, String);

impl<'a> SourceDebugExtensionRow<'a> {
    pub fn debug_extension(&self) -> Result<&'a [u8], TableError> {
        self.row().bytes(0)
    }
}

typed_row!(
    /// `LineNumberTable` attribute of a `Code` attribute.
    LineNumberTableRow,
    String
);

impl<'a> LineNumberTableRow<'a> {
    pub fn line_number_table(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<LineNumberRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(LineNumberRow, String);

impl<'a> LineNumberRow<'a> {
    pub fn start_pc(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    pub fn line_number(&self) -> Result<u16, TableError> {
        self.row().u16(1)
    }
}

typed_row!(
    /// `LocalVariableTable` attribute of a `Code` attribute.
    LocalVariableTableRow,
    String
);

impl<'a> LocalVariableTableRow<'a> {
    pub fn local_variable_table(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<LocalVariableRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(LocalVariableRow, String);

impl<'a> LocalVariableRow<'a> {
    pub fn start_pc(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    pub fn length(&self) -> Result<u16, TableError> {
        self.row().u16(1)
    }

    pub fn name_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(2)?))
    }

    pub fn descriptor_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(3)?))
    }

    /// Slot of the variable in the local variable array.
    pub fn index(&self) -> Result<u16, TableError> {
        self.row().u16(4)
    }
}

typed_row!(
    /// `LocalVariableTypeTable` attribute of a `Code` attribute.
    LocalVariableTypeTableRow,
    String
);

impl<'a> LocalVariableTypeTableRow<'a> {
    pub fn local_variable_type_table(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<LocalVariableTypeRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(LocalVariableTypeRow, String);

impl<'a> LocalVariableTypeRow<'a> {
    pub fn start_pc(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    pub fn length(&self) -> Result<u16, TableError> {
        self.row().u16(1)
    }

    pub fn name_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(2)?))
    }

    pub fn signature_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Utf8, self.row().u16(3)?))
    }

    pub fn index(&self) -> Result<u16, TableError> {
        self.row().u16(4)
    }
}

typed_row!(
    /// `BootstrapMethods` attribute, referenced by `invokedynamic` and
    /// dynamically-computed constants.
    BootstrapMethodsRow,
    String
);

impl<'a> BootstrapMethodsRow<'a> {
    pub fn bootstrap_methods(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<BootstrapMethodRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(BootstrapMethodRow, String);

impl<'a> BootstrapMethodRow<'a> {
    pub fn bootstrap_method_ref(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::MethodHandle, self.row().u16(0)?))
    }

    /// Static arguments, loadable constants of any kind.
    pub fn bootstrap_arguments(&self) -> Result<Vec<ConstantReference>, TableError> {
        let indexes = self.row().shorts(1)?;
        Ok(indexes
            .iter()
            .map(|index| Reference::untyped((*index).into()))
            .collect())
    }
}

typed_row!(
    /// `MethodParameters` attribute.
    MethodParametersRow,
    String
);

impl<'a> MethodParametersRow<'a> {
    pub fn parameters(
        &self,
        pool: &'a AttributeTables,
    ) -> Result<Vec<MethodParameterRow<'a>>, TableError> {
        entries(self.row(), pool)
    }
}

typed_row!(MethodParameterRow, String);

impl<'a> MethodParameterRow<'a> {
    /// `None` for a formal parameter with no name.
    pub fn name_index(&self) -> Result<Option<ConstantReference>, TableError> {
        Ok(optional_constant(ConstantTag::Utf8, self.row().u16(0)?))
    }

    pub fn access_flags(&self) -> Result<FlagSet<ParameterAccessFlags>, TableError> {
        Ok(FlagSet::new_truncated(self.row().u16(1)?))
    }
}

typed_row!(NestHostRow, String);

impl<'a> NestHostRow<'a> {
    pub fn host_class_index(&self) -> Result<ConstantReference, TableError> {
        Ok(constant(ConstantTag::Class, self.row().u16(0)?))
    }
}

typed_row!(NestMembersRow, String);

impl<'a> NestMembersRow<'a> {
    pub fn classes(&self) -> Result<Vec<ConstantReference>, TableError> {
        let indexes = self.row().shorts(0)?;
        Ok(indexes.iter().map(|index| constant(ConstantTag::Class, *index)).collect())
    }
}

typed_row!(PermittedSubclassesRow, String);

impl<'a> PermittedSubclassesRow<'a> {
    pub fn classes(&self) -> Result<Vec<ConstantReference>, TableError> {
        let indexes = self.row().shorts(0)?;
        Ok(indexes.iter().map(|index| constant(ConstantTag::Class, *index)).collect())
    }
}

typed_row!(
    /// Attribute kept as its raw payload.
    RawRow,
    String
);

impl<'a> RawRow<'a> {
    pub fn info(&self) -> Result<&'a [u8], TableError> {
        self.row().bytes(0)
    }
}
