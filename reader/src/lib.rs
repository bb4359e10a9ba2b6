//! Structural reader for Java class files.
//!
//! A class file is decoded into a constant pool ([constant_pool::ConstantTables])
//! and an attribute pool ([attribute::AttributeTables]), both built on the
//! generic [tables] engine, and wrapped by [base::ClassFile].

pub mod attribute;
pub mod base;
pub mod constant_pool;
pub mod tables;

pub use attribute::{AttributeReference, AttributeTables};
pub use base::{ClassFile, DecodingError};
pub use constant_pool::{ConstantReference, ConstantTables, ConstantTag};
