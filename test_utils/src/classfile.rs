//! Minimal class-file writer.
//!
//! Produces version 52 class files with a constant pool, header, fields and
//! methods. Members carry no attributes (no code, no signatures), which is
//! all an index reader looks at.

use std::collections::HashMap;

/// JVM access flags
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
}

use access::*;

const MAGIC: u32 = 0xCAFE_BABE;
const MAJOR_VERSION: u16 = 52;

#[derive(Debug, Clone)]
struct Member {
    access_flags: u16,
    name: String,
    descriptor: String,
}

/// Builder for one class file
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    internal_name: String,
    access_flags: u16,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    long_constants: Vec<i64>,
}

impl ClassFileBuilder {
    /// A public class extending `java/lang/Object` (or nothing, for Object itself)
    pub fn new(internal_name: &str) -> Self {
        let super_class = (internal_name != "java/lang/Object").then(|| "java/lang/Object".to_string());
        Self {
            internal_name: internal_name.to_string(),
            access_flags: ACC_PUBLIC,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            long_constants: Vec::new(),
        }
    }

    /// A public interface
    pub fn interface(internal_name: &str) -> Self {
        Self::new(internal_name).access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn access(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.super_class = Some(super_class.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        });
        self
    }

    pub fn method(mut self, access_flags: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(Member {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        });
        self
    }

    /// Public constructor with the given parameter descriptors, e.g. `"I"`
    pub fn constructor(self, parameters: &str) -> Self {
        self.method(ACC_PUBLIC, "<init>", &format!("({parameters})V"))
    }

    /// Add a `long` constant; it takes two constant-pool slots
    pub fn long_constant(mut self, value: i64) -> Self {
        self.long_constants.push(value);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = ConstantPool::default();
        for value in &self.long_constants {
            pool.long(*value);
        }
        let this_index = pool.class(&self.internal_name);
        let super_index = self.super_class.as_deref().map_or(0, |s| pool.class(s));
        let interface_indices: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();
        let field_indices: Vec<(u16, u16, u16)> = self
            .fields
            .iter()
            .map(|m| (m.access_flags, pool.utf8(&m.name), pool.utf8(&m.descriptor)))
            .collect();
        let method_indices: Vec<(u16, u16, u16)> = self
            .methods
            .iter()
            .map(|m| (m.access_flags, pool.utf8(&m.name), pool.utf8(&m.descriptor)))
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&MAJOR_VERSION.to_be_bytes());
        out.extend_from_slice(&pool.next_index.to_be_bytes());
        out.extend_from_slice(&pool.bytes);

        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&this_index.to_be_bytes());
        out.extend_from_slice(&super_index.to_be_bytes());
        out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
        for index in interface_indices {
            out.extend_from_slice(&index.to_be_bytes());
        }

        for members in [field_indices, method_indices] {
            out.extend_from_slice(&(members.len() as u16).to_be_bytes());
            for (flags, name, descriptor) in members {
                out.extend_from_slice(&flags.to_be_bytes());
                out.extend_from_slice(&name.to_be_bytes());
                out.extend_from_slice(&descriptor.to_be_bytes());
                out.extend_from_slice(&0u16.to_be_bytes()); // attributes
            }
        }

        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }
}

/// Constant pool with deduplicated Utf8 and Class entries
struct ConstantPool {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
        }
    }
}

impl ConstantPool {
    fn utf8(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.utf8.get(text) {
            return index;
        }
        let index = self.next_index;
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(text.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(text.as_bytes());
        self.next_index += 1;
        self.utf8.insert(text.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&index) = self.classes.get(internal_name) {
            return index;
        }
        let name_index = self.utf8(internal_name);
        let index = self.next_index;
        self.bytes.push(7);
        self.bytes.extend_from_slice(&name_index.to_be_bytes());
        self.next_index += 1;
        self.classes.insert(internal_name.to_string(), index);
        index
    }

    fn long(&mut self, value: i64) -> u16 {
        let index = self.next_index;
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.next_index += 2;
        index
    }
}
