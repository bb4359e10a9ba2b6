//! Assembly of class files for the tests.

use cesu8::to_java_cesu8;

use crate::constant_pool::ConstantTag;

use super::{U1, U2};

/// Constant pool under construction.
///
/// Every method appends an entry and returns its constant pool index.
pub(crate) struct PoolBuilder {
    bytes: Vec<U1>,
    count: U2,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            count: 1,
        }
    }

    /// `constant_pool_count` of the pool built so far.
    pub fn count(&self) -> U2 {
        self.count
    }

    pub fn bytes(&self) -> &[U1] {
        &self.bytes
    }

    /// Append an entry from its tag and raw payload.
    pub fn raw(&mut self, tag: U1, payload: &[U1]) -> U2 {
        let index = self.count;
        self.bytes.push(tag);
        self.bytes.extend_from_slice(payload);
        self.count += if matches!(ConstantTag::try_from(tag), Ok(tag) if tag.is_wide()) {
            2
        } else {
            1
        };
        index
    }

    fn push(&mut self, tag: ConstantTag, values: &[U2]) -> U2 {
        let payload: Vec<U1> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(tag as U1, &payload)
    }

    pub fn utf8(&mut self, value: &str) -> U2 {
        let encoded = to_java_cesu8(value);
        let mut payload = (encoded.len() as U2).to_be_bytes().to_vec();
        payload.extend_from_slice(&encoded);
        self.raw(ConstantTag::Utf8 as U1, &payload)
    }

    pub fn integer(&mut self, value: i32) -> U2 {
        self.raw(ConstantTag::Integer as U1, &value.to_be_bytes())
    }

    pub fn float(&mut self, value: f32) -> U2 {
        self.raw(ConstantTag::Float as U1, &value.to_bits().to_be_bytes())
    }

    pub fn long(&mut self, value: i64) -> U2 {
        self.raw(ConstantTag::Long as U1, &value.to_be_bytes())
    }

    pub fn double(&mut self, value: f64) -> U2 {
        self.raw(ConstantTag::Double as U1, &value.to_bits().to_be_bytes())
    }

    pub fn class(&mut self, name_index: U2) -> U2 {
        self.push(ConstantTag::Class, &[name_index])
    }

    pub fn string(&mut self, string_index: U2) -> U2 {
        self.push(ConstantTag::String, &[string_index])
    }

    pub fn name_and_type(&mut self, name_index: U2, descriptor_index: U2) -> U2 {
        self.push(ConstantTag::NameAndType, &[name_index, descriptor_index])
    }

    pub fn fieldref(&mut self, class_index: U2, name_and_type_index: U2) -> U2 {
        self.push(ConstantTag::Fieldref, &[class_index, name_and_type_index])
    }

    pub fn methodref(&mut self, class_index: U2, name_and_type_index: U2) -> U2 {
        self.push(ConstantTag::Methodref, &[class_index, name_and_type_index])
    }

    pub fn method_handle(&mut self, reference_kind: U1, reference_index: U2) -> U2 {
        let mut payload = vec![reference_kind];
        payload.extend_from_slice(&reference_index.to_be_bytes());
        self.raw(ConstantTag::MethodHandle as U1, &payload)
    }
}

/// A complete `attribute_info`.
pub(crate) fn attribute(name_index: U2, payload: &[U1]) -> Vec<U1> {
    let mut bytes = name_index.to_be_bytes().to_vec();
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Payload of a `Code` attribute.
///
/// Exception table entries are `[start_pc, end_pc, handler_pc, catch_type]`.
pub(crate) fn code_payload(
    max_stack: U2,
    max_locals: U2,
    code: &[U1],
    exception_table: &[[U2; 4]],
    attributes: &[Vec<U1>],
) -> Vec<U1> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&max_stack.to_be_bytes());
    bytes.extend_from_slice(&max_locals.to_be_bytes());
    bytes.extend_from_slice(&(code.len() as u32).to_be_bytes());
    bytes.extend_from_slice(code);
    bytes.extend_from_slice(&(exception_table.len() as U2).to_be_bytes());
    for entry in exception_table {
        for value in entry {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
    }
    bytes.extend_from_slice(&(attributes.len() as U2).to_be_bytes());
    for attribute in attributes {
        bytes.extend_from_slice(attribute);
    }
    bytes
}

/// A class file under construction, version 65.0.
pub(crate) struct ClassBuilder {
    pub pool: PoolBuilder,
    pub access_flags: U2,
    pub this_class: U2,
    pub super_class: U2,
    pub interfaces: Vec<U2>,
    fields: Vec<Vec<U1>>,
    methods: Vec<Vec<U1>>,
    attributes: Vec<Vec<U1>>,
}

impl ClassBuilder {
    pub fn new(name: &str, super_class: Option<&str>) -> Self {
        let mut pool = PoolBuilder::new();
        let name = pool.utf8(name);
        let this_class = pool.class(name);
        let super_class = match super_class {
            Some(super_class) => {
                let name = pool.utf8(super_class);
                pool.class(name)
            }
            None => 0,
        };
        Self {
            pool,
            access_flags: 0x0021,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    fn member(&mut self, access_flags: U2, name: &str, descriptor: &str, attributes: Vec<Vec<U1>>) -> Vec<U1> {
        let name = self.pool.utf8(name);
        let descriptor = self.pool.utf8(descriptor);
        let mut bytes = Vec::new();
        for value in [access_flags, name, descriptor, attributes.len() as U2] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.extend(attributes.into_iter().flatten());
        bytes
    }

    pub fn field(&mut self, access_flags: U2, name: &str, descriptor: &str, attributes: Vec<Vec<U1>>) {
        let field = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(field);
    }

    pub fn method(&mut self, access_flags: U2, name: &str, descriptor: &str, attributes: Vec<Vec<U1>>) {
        let method = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(method);
    }

    pub fn attribute(&mut self, attribute: Vec<U1>) {
        self.attributes.push(attribute);
    }

    pub fn build(&self) -> Vec<U1> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 65];
        bytes.extend_from_slice(&self.pool.count().to_be_bytes());
        bytes.extend_from_slice(self.pool.bytes());
        for value in [self.access_flags, self.this_class, self.super_class] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.extend_from_slice(&(self.interfaces.len() as U2).to_be_bytes());
        for interface in &self.interfaces {
            bytes.extend_from_slice(&interface.to_be_bytes());
        }
        for members in [&self.fields, &self.methods, &self.attributes] {
            bytes.extend_from_slice(&(members.len() as U2).to_be_bytes());
            for member in members {
                bytes.extend_from_slice(member);
            }
        }
        bytes
    }
}
