//! Minimal class-file reader
//!
//! Reads just enough of the JVM class-file format (JVMS §4) to index a class
//! and list its members: the class header, the constant pool entries naming
//! classes and UTF-8 strings, and the name/descriptor/flags of every field
//! and method. Attributes (code, signatures, annotations) are skipped.

use thiserror::Error;

use crate::model::{Primitive, TypeName};

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("bad magic number {found:#010x}")]
    BadMagic { found: u32 },

    #[error("unknown constant pool tag {tag} at slot {slot}")]
    UnknownConstantTag { tag: u8, slot: usize },

    #[error("constant pool slot {index} is missing or has the wrong kind")]
    BadConstantIndex { index: u16 },

    #[error("malformed descriptor `{0}`")]
    BadDescriptor(String),
}

/// Class header: identity, supertypes and class-level flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub access_flags: u16,
    /// Internal name (`java/util/ArrayList`)
    pub this_class: String,
    /// `None` only for `java/lang/Object` and `module-info`
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
}

/// Field or method as stored in the class file, descriptor unparsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    pub header: ClassHeader,
    pub fields: Vec<RawMember>,
    pub methods: Vec<RawMember>,
}

/// Parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub parameters: Vec<TypeName>,
    pub return_type: TypeName,
}

/// Read only the header; used for every class entry during the bulk load
pub fn read_class_header(bytes: &[u8]) -> Result<ClassHeader, ClassParseError> {
    let mut reader = ByteReader::new(bytes);
    let pool = read_preamble(&mut reader)?;
    read_header(&mut reader, &pool)
}

/// Read the header and every field and method
pub fn read_class(bytes: &[u8]) -> Result<ParsedClass, ClassParseError> {
    let mut reader = ByteReader::new(bytes);
    let pool = read_preamble(&mut reader)?;
    let header = read_header(&mut reader, &pool)?;
    let fields = read_members(&mut reader, &pool)?;
    let methods = read_members(&mut reader, &pool)?;
    Ok(ParsedClass {
        header,
        fields,
        methods,
    })
}

fn read_preamble(reader: &mut ByteReader<'_>) -> Result<ConstantPool, ClassParseError> {
    let magic = reader.u4()?;
    if magic != MAGIC {
        return Err(ClassParseError::BadMagic { found: magic });
    }
    reader.skip(4)?; // minor_version, major_version
    ConstantPool::read(reader)
}

fn read_header(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<ClassHeader, ClassParseError> {
    let access_flags = reader.u2()?;
    let this_class = pool.class_name(reader.u2()?)?.to_string();
    let super_index = reader.u2()?;
    let super_class = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?.to_string())
    };
    let interface_count = reader.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(reader.u2()?)?.to_string());
    }
    Ok(ClassHeader {
        access_flags,
        this_class,
        super_class,
        interfaces,
    })
}

fn read_members(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<RawMember>, ClassParseError> {
    let count = reader.u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = reader.u2()?;
        let name = pool.utf8(reader.u2()?)?.to_string();
        let descriptor = pool.utf8(reader.u2()?)?.to_string();
        let attribute_count = reader.u2()?;
        for _ in 0..attribute_count {
            reader.skip(2)?; // attribute_name_index
            let length = reader.u4()? as usize;
            reader.skip(length)?;
        }
        members.push(RawMember {
            access_flags,
            name,
            descriptor,
        });
    }
    Ok(members)
}

enum Constant {
    Empty,
    Utf8(String),
    Class(u16),
    Other,
}

struct ConstantPool {
    slots: Vec<Constant>,
}

impl ConstantPool {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.u2()? as usize;
        let mut slots = Vec::with_capacity(count);
        slots.push(Constant::Empty);

        while slots.len() < count {
            let slot = slots.len();
            let tag = reader.u1()?;
            let (constant, width) = match tag {
                1 => {
                    let length = reader.u2()? as usize;
                    // Modified UTF-8; only NUL and supplementary characters
                    // differ and neither occurs in identifiers we care about.
                    let text = String::from_utf8_lossy(reader.bytes(length)?).into_owned();
                    (Constant::Utf8(text), 1)
                }
                7 => (Constant::Class(reader.u2()?), 1),
                // Long and Double take two slots
                5 | 6 => {
                    reader.skip(8)?;
                    (Constant::Other, 2)
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    (Constant::Other, 1)
                }
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    (Constant::Other, 1)
                }
                15 => {
                    reader.skip(3)?;
                    (Constant::Other, 1)
                }
                tag => return Err(ClassParseError::UnknownConstantTag { tag, slot }),
            };
            slots.push(constant);
            if width == 2 {
                slots.push(Constant::Empty);
            }
        }

        Ok(Self { slots })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.slots.get(index as usize) {
            Some(Constant::Utf8(text)) => Ok(text),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.slots.get(index as usize) {
            Some(Constant::Class(name_index)) => self.utf8(*name_index),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ClassParseError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u1(&mut self) -> Result<u8, ClassParseError> {
        Ok(self.array::<1>()?[0])
    }

    fn u2(&mut self) -> Result<u16, ClassParseError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u4(&mut self) -> Result<u32, ClassParseError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.bytes(len).map(|_| ())
    }
}

/// `Ljava/lang/String;` -> `java.lang.String`
pub fn parse_field_descriptor(descriptor: &str) -> Result<TypeName, ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    let ty = parser.field_type()?;
    parser.finish()?;
    Ok(ty)
}

/// `(II)Ljava/lang/String;` -> `(int, int) -> java.lang.String`
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodSignature, ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(b')') {
        parameters.push(parser.field_type()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.peek() == Some(b'V') {
        parser.pos += 1;
        TypeName::Void
    } else {
        parser.field_type()?
    };
    parser.finish()?;
    Ok(MethodSignature {
        parameters,
        return_type,
    })
}

struct DescriptorParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self) -> ClassParseError {
        ClassParseError::BadDescriptor(self.text.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), ClassParseError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<(), ClassParseError> {
        if self.pos == self.text.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn field_type(&mut self) -> Result<TypeName, ClassParseError> {
        let mut dimensions = 0u8;
        while self.peek() == Some(b'[') {
            self.pos += 1;
            dimensions = dimensions.checked_add(1).ok_or_else(|| self.error())?;
        }
        let tag = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        let element = if let Some(primitive) = Primitive::from_descriptor_tag(tag) {
            TypeName::Primitive(primitive)
        } else if tag == b'L' {
            let rest = &self.text[self.pos..];
            let end = rest.find(';').ok_or_else(|| self.error())?;
            let internal = &rest[..end];
            self.pos += end + 1;
            TypeName::from_internal_name(internal)
        } else {
            return Err(self.error());
        };
        Ok(if dimensions == 0 {
            element
        } else {
            TypeName::Array {
                element: Box::new(element),
                dimensions,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_descriptors() {
        assert_eq!(
            parse_field_descriptor("I").unwrap(),
            TypeName::Primitive(Primitive::Int)
        );
        assert_eq!(
            parse_field_descriptor("Ljava/util/Map$Entry;").unwrap(),
            TypeName::Reference("java.util.Map.Entry".into())
        );
        assert_eq!(
            parse_field_descriptor("[[J").unwrap(),
            TypeName::Array {
                element: Box::new(TypeName::Primitive(Primitive::Long)),
                dimensions: 2,
            }
        );
        assert!(parse_field_descriptor("Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("II").is_err());
        assert!(parse_field_descriptor("").is_err());
    }

    #[test]
    fn test_method_descriptors() {
        let sig = parse_method_descriptor("(I[Ljava/lang/Object;)Ljava/lang/String;").unwrap();
        assert_eq!(sig.parameters.len(), 2);
        assert_eq!(sig.parameters[0], TypeName::Primitive(Primitive::Int));
        assert_eq!(sig.parameters[1].to_string(), "java.lang.Object[]");
        assert_eq!(sig.return_type.to_string(), "java.lang.String");

        let sig = parse_method_descriptor("()V").unwrap();
        assert!(sig.parameters.is_empty());
        assert!(sig.return_type.is_void());

        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("()VV").is_err());
    }

    #[test]
    fn test_reads_synthesized_class() {
        use test_utils::access::{ACC_PUBLIC, ACC_STATIC};
        use test_utils::ClassFileBuilder;

        let bytes = ClassFileBuilder::new("java/util/Map$Entry")
            .long_constant(7)
            .implements("java/lang/Comparable")
            .field(ACC_PUBLIC | ACC_STATIC, "EMPTY", "Ljava/util/Map$Entry;")
            .method(ACC_PUBLIC, "getKey", "()Ljava/lang/Object;")
            .build();

        let header = read_class_header(&bytes).unwrap();
        assert_eq!(header.this_class, "java/util/Map$Entry");
        assert_eq!(header.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(header.interfaces, vec!["java/lang/Comparable"]);

        let parsed = read_class(&bytes).unwrap();
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields[0].name, "EMPTY");
        assert_eq!(parsed.methods[0].descriptor, "()Ljava/lang/Object;");
        assert!(read_class(&bytes[..bytes.len() - 6]).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            read_class_header(b"not a class"),
            Err(ClassParseError::BadMagic { .. })
        ));
        assert!(matches!(
            read_class_header(&[0xCA, 0xFE]),
            Err(ClassParseError::UnexpectedEof { .. })
        ));
    }
}
