//! Public-API descriptions of compiled classes
//!
//! A [`ClassSummary`] is the cheap header kept for every indexed class. A
//! [`ClassDescriptor`] is the fully materialized view (constructors, fields,
//! methods) produced on demand by the class index and shared behind an `Arc`.
//! Descriptors are assembled through [`ClassDescriptorBuilder`] and never
//! mutated afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use super::type_name::TypeName;

/// JVM access flags (JVMS §4.1, §4.5, §4.6)
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_BRIDGE: u16 = 0x0040;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
}

use access::*;

/// Header of an indexed class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    /// Source-form fully-qualified name (`java.util.Map.Entry`)
    pub fqcn: String,
    /// JVM internal name (`java/util/Map$Entry`)
    pub internal_name: String,
    pub simple_name: String,
    /// Empty for the default package
    pub package: String,
    /// Superclass FQN, empty for `java.lang.Object` and interfaces without one
    pub superclass: String,
    pub interfaces: Vec<String>,
    pub access_flags: u16,
    /// Archive the class was read from
    pub origin: PathBuf,
}

impl ClassSummary {
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn kind_label(&self) -> &'static str {
        if self.access_flags & ACC_ANNOTATION != 0 {
            "@interface"
        } else if self.is_interface() {
            "interface"
        } else if self.access_flags & ACC_ENUM != 0 {
            "enum"
        } else {
            "class"
        }
    }
}

/// Common view over constructors, fields and methods
pub trait MemberDescriptor {
    fn name(&self) -> &str;
    fn declaring_class(&self) -> &str;
    fn access_flags(&self) -> u16;

    /// Declared type for fields, return type for methods, `None` for constructors
    fn member_type(&self) -> Option<&TypeName>;

    fn is_public(&self) -> bool {
        self.access_flags() & ACC_PUBLIC != 0
    }

    fn is_static(&self) -> bool {
        self.access_flags() & ACC_STATIC != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDescriptor {
    /// Simple name of the constructed class
    pub name: String,
    pub declaring_class: String,
    pub parameters: Vec<TypeName>,
    pub access_flags: u16,
}

impl ConstructorDescriptor {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, render_parameters(&self.parameters))
    }
}

impl MemberDescriptor for ConstructorDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    fn access_flags(&self) -> u16 {
        self.access_flags
    }

    fn member_type(&self) -> Option<&TypeName> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declaring_class: String,
    pub field_type: TypeName,
    pub access_flags: u16,
}

impl FieldDescriptor {
    pub fn signature(&self) -> String {
        format!("{}: {}", self.name, self.field_type.simple_name())
    }
}

impl MemberDescriptor for FieldDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    fn access_flags(&self) -> u16 {
        self.access_flags
    }

    fn member_type(&self) -> Option<&TypeName> {
        Some(&self.field_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub declaring_class: String,
    pub parameters: Vec<TypeName>,
    pub return_type: TypeName,
    pub access_flags: u16,
}

impl MethodDescriptor {
    /// `substring(int, int): String`
    pub fn signature(&self) -> String {
        format!(
            "{}({}): {}",
            self.name,
            render_parameters(&self.parameters),
            self.return_type.simple_name()
        )
    }

    /// Name plus erased parameter list; overriding methods share a key
    fn override_key(&self) -> (String, Vec<TypeName>) {
        (self.name.clone(), self.parameters.clone())
    }
}

impl MemberDescriptor for MethodDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    fn access_flags(&self) -> u16 {
        self.access_flags
    }

    fn member_type(&self) -> Option<&TypeName> {
        Some(&self.return_type)
    }
}

fn render_parameters(parameters: &[TypeName]) -> String {
    parameters
        .iter()
        .map(TypeName::simple_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fully materialized public API of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    summary: Arc<ClassSummary>,
    constructors: Vec<ConstructorDescriptor>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    pub fn summary(&self) -> &Arc<ClassSummary> {
        &self.summary
    }

    pub fn fqcn(&self) -> &str {
        &self.summary.fqcn
    }

    pub fn simple_name(&self) -> &str {
        &self.summary.simple_name
    }

    pub fn superclass(&self) -> &str {
        &self.summary.superclass
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields.iter().filter(move |f| f.name.starts_with(prefix))
    }

    pub fn methods_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods.iter().filter(move |m| m.name.starts_with(prefix))
    }
}

/// Append-only builder; `build()` freezes the descriptor
#[derive(Debug)]
pub struct ClassDescriptorBuilder {
    descriptor: ClassDescriptor,
}

impl ClassDescriptorBuilder {
    pub fn new(summary: Arc<ClassSummary>) -> Self {
        Self {
            descriptor: ClassDescriptor {
                summary,
                constructors: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// Non-public members are dropped here so they can never reach a suggestion
    pub fn add_constructor(&mut self, constructor: ConstructorDescriptor) {
        if constructor.is_public() {
            self.descriptor.constructors.push(constructor);
        }
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        if field.is_public() {
            self.descriptor.fields.push(field);
        }
    }

    pub fn add_method(&mut self, method: MethodDescriptor) {
        if method.is_public() {
            self.descriptor.methods.push(method);
        }
    }

    /// Append the public fields and methods of a supertype that are not
    /// already declared (or overridden) here. Constructors are never inherited.
    pub fn inherit_from(&mut self, parent: &ClassDescriptor) {
        for field in &parent.fields {
            if self.descriptor.field(&field.name).is_none() {
                self.descriptor.fields.push(field.clone());
            }
        }
        for method in &parent.methods {
            let key = method.override_key();
            let overridden = self
                .descriptor
                .methods
                .iter()
                .any(|existing| existing.override_key() == key);
            if !overridden {
                self.descriptor.methods.push(method.clone());
            }
        }
    }

    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}
