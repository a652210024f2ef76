//! Source-form type names decoded from JVM field descriptors
//!
//! Descriptors such as `Ljava/util/Map$Entry;` or `[[I` are rendered the way a
//! Java programmer would write them (`java.util.Map.Entry`, `int[][]`), since
//! every consumer of these names works on source text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Java type as it appears in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    /// `boolean`, `byte`, `char`, `short`, `int`, `long`, `float`, `double`
    Primitive(Primitive),
    /// Only valid as a method return type
    Void,
    /// Fully-qualified class name in source form (`java.lang.String`)
    Reference(String),
    /// Array of an element type
    Array {
        element: Box<TypeName>,
        dimensions: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn from_descriptor_tag(tag: u8) -> Option<Self> {
        match tag {
            b'Z' => Some(Primitive::Boolean),
            b'B' => Some(Primitive::Byte),
            b'C' => Some(Primitive::Char),
            b'S' => Some(Primitive::Short),
            b'I' => Some(Primitive::Int),
            b'J' => Some(Primitive::Long),
            b'F' => Some(Primitive::Float),
            b'D' => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Primitive::Boolean),
            "byte" => Some(Primitive::Byte),
            "char" => Some(Primitive::Char),
            "short" => Some(Primitive::Short),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

impl TypeName {
    /// Build a reference type from a JVM internal name (`java/util/Map$Entry`)
    pub fn from_internal_name(internal: &str) -> Self {
        TypeName::Reference(source_name(internal))
    }

    /// Parse a source-level spelling such as `int`, `String[]` or `java.util.List`
    pub fn from_source(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let mut base = text;
        let mut dimensions = 0u8;
        while let Some(stripped) = base.strip_suffix("[]") {
            base = stripped.trim_end();
            dimensions = dimensions.saturating_add(1);
        }
        let element = if base == "void" {
            TypeName::Void
        } else if let Some(primitive) = Primitive::from_keyword(base) {
            TypeName::Primitive(primitive)
        } else {
            TypeName::Reference(base.to_string())
        };
        if dimensions == 0 {
            Some(element)
        } else {
            Some(TypeName::Array {
                element: Box::new(element),
                dimensions,
            })
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeName::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeName::Array { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeName::Void)
    }

    /// Fully-qualified class name when this is a plain reference type
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            TypeName::Reference(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Short display form: `String`, `int`, `Entry[]`
    pub fn simple_name(&self) -> String {
        match self {
            TypeName::Primitive(p) => p.keyword().to_string(),
            TypeName::Void => "void".to_string(),
            TypeName::Reference(name) => name
                .rsplit('.')
                .next()
                .unwrap_or(name.as_str())
                .to_string(),
            TypeName::Array {
                element,
                dimensions,
            } => {
                let mut out = element.simple_name();
                for _ in 0..*dimensions {
                    out.push_str("[]");
                }
                out
            }
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Primitive(p) => f.write_str(p.keyword()),
            TypeName::Void => f.write_str("void"),
            TypeName::Reference(name) => f.write_str(name),
            TypeName::Array {
                element,
                dimensions,
            } => {
                write!(f, "{}", element)?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

/// `java/util/Map$Entry` -> `java.util.Map.Entry`
pub fn source_name(internal: &str) -> String {
    internal.replace(['/', '$'], ".")
}

/// Simple name of a JVM internal name; nested classes drop their outer prefix
pub fn simple_name_of_internal(internal: &str) -> &str {
    let tail = internal.rsplit('/').next().unwrap_or(internal);
    tail.rsplit('$').next().unwrap_or(tail)
}

/// Package of a JVM internal name in source form; empty for the default package
pub fn package_of_internal(internal: &str) -> String {
    internal
        .rsplit_once('/')
        .map(|(pkg, _)| pkg.replace('/', "."))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_names_render_in_source_form() {
        assert_eq!(source_name("java/util/Map$Entry"), "java.util.Map.Entry");
        assert_eq!(simple_name_of_internal("java/util/Map$Entry"), "Entry");
        assert_eq!(simple_name_of_internal("Toplevel"), "Toplevel");
        assert_eq!(package_of_internal("java/util/Map$Entry"), "java.util");
        assert_eq!(package_of_internal("Toplevel"), "");
    }

    #[test]
    fn test_display_and_simple_name() {
        let array = TypeName::Array {
            element: Box::new(TypeName::Reference("java.lang.String".into())),
            dimensions: 2,
        };
        assert_eq!(array.to_string(), "java.lang.String[][]");
        assert_eq!(array.simple_name(), "String[][]");
        assert_eq!(TypeName::Primitive(Primitive::Int).to_string(), "int");
    }

    #[test]
    fn test_from_source() {
        assert_eq!(
            TypeName::from_source("int"),
            Some(TypeName::Primitive(Primitive::Int))
        );
        assert_eq!(
            TypeName::from_source("String []"),
            Some(TypeName::Array {
                element: Box::new(TypeName::Reference("String".into())),
                dimensions: 1,
            })
        );
        assert_eq!(TypeName::from_source("  "), None);
    }
}
