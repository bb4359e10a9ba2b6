//! Typed views over the rows of each constant pool table.

use crate::tables::{error::InvalidReferenceKindSnafu, typed_row, Reference, TableError, TypedRow};

use super::{ConstantReference, ConstantTables, ConstantTag};

macro_rules! index_getter {
    ($(#[$meta:meta])* $name:ident, $column:expr, $target:ident) => {
        $(#[$meta])*
        pub fn $name(&self) -> Result<ConstantReference, TableError> {
            Ok(Reference::new(ConstantTag::$target, self.row().u16($column)?.into()))
        }
    };
}

typed_row!(
    /// `CONSTANT_Utf8_info`
    Utf8Row,
    ConstantTag
);

impl<'a> Utf8Row<'a> {
    pub fn value(&self) -> Result<&'a str, TableError> {
        self.row().str(0)
    }
}

typed_row!(
    /// `CONSTANT_Integer_info`
    IntegerRow,
    ConstantTag
);

impl<'a> IntegerRow<'a> {
    pub fn bytes(&self) -> Result<u32, TableError> {
        self.row().u32(0)
    }

    pub fn value(&self) -> Result<i32, TableError> {
        Ok(self.bytes()? as i32)
    }
}

typed_row!(
    /// `CONSTANT_Float_info`
    FloatRow,
    ConstantTag
);

impl<'a> FloatRow<'a> {
    pub fn bytes(&self) -> Result<u32, TableError> {
        self.row().u32(0)
    }

    pub fn value(&self) -> Result<f32, TableError> {
        Ok(f32::from_bits(self.bytes()?))
    }
}

typed_row!(
    /// `CONSTANT_Long_info`, occupies two slots.
    LongRow,
    ConstantTag
);

impl<'a> LongRow<'a> {
    pub fn high_bytes(&self) -> Result<u32, TableError> {
        self.row().u32(0)
    }

    pub fn low_bytes(&self) -> Result<u32, TableError> {
        self.row().u32(1)
    }

    pub fn value(&self) -> Result<i64, TableError> {
        Ok(join(self.high_bytes()?, self.low_bytes()?) as i64)
    }
}

typed_row!(
    /// `CONSTANT_Double_info`, occupies two slots.
    DoubleRow,
    ConstantTag
);

impl<'a> DoubleRow<'a> {
    pub fn high_bytes(&self) -> Result<u32, TableError> {
        self.row().u32(0)
    }

    pub fn low_bytes(&self) -> Result<u32, TableError> {
        self.row().u32(1)
    }

    pub fn value(&self) -> Result<f64, TableError> {
        Ok(f64::from_bits(join(self.high_bytes()?, self.low_bytes()?)))
    }
}

fn join(high: u32, low: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

typed_row!(
    /// `CONSTANT_Class_info`
    ClassRow,
    ConstantTag
);

impl<'a> ClassRow<'a> {
    index_getter!(
        /// Binary name of the class or interface.
        name_index, 0, Utf8
    );

    pub fn name(&self, pool: &'a ConstantTables) -> Result<&'a str, TableError> {
        pool.utf8(self.row().u16(0)?)
    }
}

typed_row!(
    /// `CONSTANT_String_info`
    StringRow,
    ConstantTag
);

impl<'a> StringRow<'a> {
    index_getter!(string_index, 0, Utf8);

    pub fn value(&self, pool: &'a ConstantTables) -> Result<&'a str, TableError> {
        pool.utf8(self.row().u16(0)?)
    }
}

typed_row!(
    /// `CONSTANT_Fieldref_info`
    FieldrefRow,
    ConstantTag
);

impl<'a> FieldrefRow<'a> {
    index_getter!(class_index, 0, Class);
    index_getter!(name_and_type_index, 1, NameAndType);
}

typed_row!(
    /// `CONSTANT_Methodref_info`
    MethodrefRow,
    ConstantTag
);

impl<'a> MethodrefRow<'a> {
    index_getter!(class_index, 0, Class);
    index_getter!(name_and_type_index, 1, NameAndType);
}

typed_row!(
    /// `CONSTANT_InterfaceMethodref_info`
    InterfaceMethodrefRow,
    ConstantTag
);

impl<'a> InterfaceMethodrefRow<'a> {
    index_getter!(class_index, 0, Class);
    index_getter!(name_and_type_index, 1, NameAndType);
}

typed_row!(
    /// `CONSTANT_NameAndType_info`
    NameAndTypeRow,
    ConstantTag
);

impl<'a> NameAndTypeRow<'a> {
    index_getter!(name_index, 0, Utf8);
    index_getter!(descriptor_index, 1, Utf8);

    pub fn name(&self, pool: &'a ConstantTables) -> Result<&'a str, TableError> {
        pool.utf8(self.row().u16(0)?)
    }

    pub fn descriptor(&self, pool: &'a ConstantTables) -> Result<&'a str, TableError> {
        pool.utf8(self.row().u16(1)?)
    }
}

/// Kind of a method handle, see
/// [JVMS 5.4.3.5](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-5.html#jvms-5.4.3.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReferenceKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

impl ReferenceKind {
    /// Table the handle's `reference_index` must point into.
    ///
    /// `None` when both `Methodref` and `InterfaceMethodref` are allowed.
    pub fn target(&self) -> Option<ConstantTag> {
        match self {
            ReferenceKind::GetField
            | ReferenceKind::GetStatic
            | ReferenceKind::PutField
            | ReferenceKind::PutStatic => Some(ConstantTag::Fieldref),
            ReferenceKind::InvokeVirtual | ReferenceKind::NewInvokeSpecial => {
                Some(ConstantTag::Methodref)
            }
            ReferenceKind::InvokeStatic | ReferenceKind::InvokeSpecial => None,
            ReferenceKind::InvokeInterface => Some(ConstantTag::InterfaceMethodref),
        }
    }
}

impl TryFrom<u8> for ReferenceKind {
    type Error = TableError;

    fn try_from(kind: u8) -> Result<Self, Self::Error> {
        Ok(match kind {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            kind => return InvalidReferenceKindSnafu { kind }.fail(),
        })
    }
}

typed_row!(
    /// `CONSTANT_MethodHandle_info`
    MethodHandleRow,
    ConstantTag
);

impl<'a> MethodHandleRow<'a> {
    pub fn reference_kind(&self) -> Result<ReferenceKind, TableError> {
        ReferenceKind::try_from(self.row().u8(0)?)
    }

    /// Field or method the handle points to, in the table its kind requires.
    pub fn reference_index(&self) -> Result<ConstantReference, TableError> {
        let index = self.row().u16(1)?.into();
        Ok(match self.reference_kind()?.target() {
            Some(tag) => Reference::new(tag, index),
            None => Reference::untyped(index),
        })
    }
}

typed_row!(
    /// `CONSTANT_MethodType_info`
    MethodTypeRow,
    ConstantTag
);

impl<'a> MethodTypeRow<'a> {
    index_getter!(descriptor_index, 0, Utf8);
}

typed_row!(
    /// `CONSTANT_Dynamic_info`
    DynamicRow,
    ConstantTag
);

impl<'a> DynamicRow<'a> {
    /// Index into the `bootstrap_methods` array of the `BootstrapMethods`
    /// attribute, not into the constant pool.
    pub fn bootstrap_method_attr_index(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    index_getter!(name_and_type_index, 1, NameAndType);
}

typed_row!(
    /// `CONSTANT_InvokeDynamic_info`
    InvokeDynamicRow,
    ConstantTag
);

impl<'a> InvokeDynamicRow<'a> {
    /// Index into the `bootstrap_methods` array of the `BootstrapMethods`
    /// attribute, not into the constant pool.
    pub fn bootstrap_method_attr_index(&self) -> Result<u16, TableError> {
        self.row().u16(0)
    }

    index_getter!(name_and_type_index, 1, NameAndType);
}

typed_row!(
    /// `CONSTANT_Module_info`
    ModuleRow,
    ConstantTag
);

impl<'a> ModuleRow<'a> {
    index_getter!(name_index, 0, Utf8);
}

typed_row!(
    /// `CONSTANT_Package_info`
    PackageRow,
    ConstantTag
);

impl<'a> PackageRow<'a> {
    index_getter!(name_index, 0, Utf8);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reference_kind_targets() {
        assert_eq!(ReferenceKind::try_from(1).unwrap().target(), Some(ConstantTag::Fieldref));
        assert_eq!(ReferenceKind::try_from(5).unwrap().target(), Some(ConstantTag::Methodref));
        assert_eq!(ReferenceKind::try_from(7).unwrap().target(), None);
        assert_eq!(
            ReferenceKind::try_from(9).unwrap().target(),
            Some(ConstantTag::InterfaceMethodref)
        );
        assert!(matches!(
            ReferenceKind::try_from(0),
            Err(TableError::InvalidReferenceKind { kind: 0 })
        ));
        assert!(ReferenceKind::try_from(10).is_err());
    }

    #[test]
    fn wide_values_join_halves() {
        assert_eq!(join(1, 2), (1 << 32) | 2);
        assert_eq!(join(u32::MAX, u32::MAX) as i64, -1);
    }
}
