//! Description model for indexed classes and their public members

pub mod descriptor;
pub mod imports;
pub mod type_name;

pub use descriptor::{
    access, ClassDescriptor, ClassDescriptorBuilder, ClassSummary, ConstructorDescriptor,
    FieldDescriptor, MemberDescriptor, MethodDescriptor,
};
pub use imports::Imports;
pub use type_name::{Primitive, TypeName};
