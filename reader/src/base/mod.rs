pub mod classfile;
pub mod error;
pub mod source;
#[cfg(test)]
pub(crate) mod testing;

pub use classfile::{
    ClassAccessFlags, ClassFile, FieldAccessFlags, FieldInfo, InnerClassAccessFlags,
    MethodAccessFlags, MethodInfo, ParameterAccessFlags,
};
pub use error::DecodingError;
pub use source::{ByteSource, PayloadReader};

pub type U1 = u8;
pub type U2 = u16;
pub type U4 = u32;
