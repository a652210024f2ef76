//! Test support for java-completion
//!
//! Tests never need a JDK: [`classfile::ClassFileBuilder`] synthesizes class
//! files, [`jar::JarBuilder`] packs them into archives, and
//! [`fixtures::write_jdk_fixture`] writes a small stand-in for the runtime
//! library with the classes the tests complete against.

pub mod classfile;
pub mod fixtures;
pub mod generator;
pub mod jar;

pub use classfile::{access, ClassFileBuilder};
pub use fixtures::write_jdk_fixture;
pub use jar::{write_class_dir, write_jar, JarBuilder};
