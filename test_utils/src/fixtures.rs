//! A tiny runtime library to complete against

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::classfile::{access::*, ClassFileBuilder};
use crate::jar::JarBuilder;

const OBJECT: &str = "Ljava/lang/Object;";
const STRING: &str = "Ljava/lang/String;";

/// The fixture classes, in the order they are written
pub fn jdk_classes() -> Vec<ClassFileBuilder> {
    vec![
        ClassFileBuilder::new("java/lang/Object")
            .constructor("")
            .method(ACC_PUBLIC, "toString", &format!("(){STRING}"))
            .method(ACC_PUBLIC, "hashCode", "()I")
            .method(ACC_PUBLIC, "equals", &format!("({OBJECT})Z"))
            .method(ACC_PROTECTED, "clone", &format!("(){OBJECT}")),
        ClassFileBuilder::new("java/lang/String")
            .access(ACC_PUBLIC | ACC_FINAL)
            .long_constant(-6_849_794_470_754_667_710)
            .field(ACC_PRIVATE | ACC_FINAL, "value", "[B")
            .constructor("")
            .constructor(STRING)
            .method(ACC_PUBLIC, "length", "()I")
            .method(ACC_PUBLIC, "charAt", "(I)C")
            .method(ACC_PUBLIC, "substring", &format!("(I){STRING}"))
            .method(ACC_PUBLIC, "substring", &format!("(II){STRING}"))
            .method(ACC_PUBLIC | ACC_STATIC, "valueOf", &format!("(I){STRING}")),
        ClassFileBuilder::new("java/lang/StringBuilder")
            .access(ACC_PUBLIC | ACC_FINAL)
            .constructor("")
            .method(
                ACC_PUBLIC,
                "append",
                &format!("({STRING})Ljava/lang/StringBuilder;"),
            )
            .method(ACC_PUBLIC, "toString", &format!("(){STRING}")),
        ClassFileBuilder::new("java/lang/System")
            .access(ACC_PUBLIC | ACC_FINAL)
            .field(ACC_PUBLIC | ACC_STATIC | ACC_FINAL, "out", "Ljava/io/PrintStream;")
            .method(ACC_PRIVATE, "<init>", "()V")
            .method(ACC_PUBLIC | ACC_STATIC, "currentTimeMillis", "()J"),
        ClassFileBuilder::new("java/lang/Math")
            .access(ACC_PUBLIC | ACC_FINAL)
            .field(ACC_PUBLIC | ACC_STATIC | ACC_FINAL, "PI", "D")
            .method(ACC_PUBLIC | ACC_STATIC, "abs", "(I)I")
            .method(ACC_PUBLIC | ACC_STATIC, "max", "(II)I"),
        ClassFileBuilder::new("java/io/PrintStream")
            .constructor("Ljava/io/OutputStream;")
            .method(ACC_PUBLIC, "println", "()V")
            .method(ACC_PUBLIC, "println", &format!("({STRING})V")),
        ClassFileBuilder::interface("java/util/List")
            .method(ACC_PUBLIC | ACC_ABSTRACT, "size", "()I")
            .method(ACC_PUBLIC | ACC_ABSTRACT, "add", &format!("({OBJECT})Z"))
            .method(ACC_PUBLIC | ACC_ABSTRACT, "get", &format!("(I){OBJECT}"))
            .method(ACC_PUBLIC | ACC_ABSTRACT, "isEmpty", "()Z"),
        ClassFileBuilder::interface("java/util/Map")
            .method(ACC_PUBLIC | ACC_ABSTRACT, "get", &format!("({OBJECT}){OBJECT}"))
            .method(ACC_PUBLIC | ACC_ABSTRACT, "put", &format!("({OBJECT}{OBJECT}){OBJECT}"))
            .method(ACC_PUBLIC | ACC_ABSTRACT, "size", "()I"),
        ClassFileBuilder::interface("java/util/Map$Entry")
            .method(ACC_PUBLIC | ACC_ABSTRACT, "getKey", &format!("(){OBJECT}"))
            .method(ACC_PUBLIC | ACC_ABSTRACT, "getValue", &format!("(){OBJECT}")),
        ClassFileBuilder::new("java/util/ArrayList")
            .implements("java/util/List")
            .constructor("")
            .constructor("I")
            .method(ACC_PUBLIC, "add", &format!("({OBJECT})Z"))
            .method(ACC_PUBLIC, "size", "()I")
            .method(ACC_PUBLIC, "get", &format!("(I){OBJECT}"))
            .method(ACC_PRIVATE, "grow", "(I)V")
            .method(ACC_STATIC | ACC_SYNTHETIC, "access$000", "(Ljava/util/ArrayList;)I")
            .method(
                ACC_PUBLIC | ACC_BRIDGE | ACC_SYNTHETIC,
                "get",
                &format!("(I){OBJECT}"),
            ),
        ClassFileBuilder::new("java/util/ArrayList$1")
            .access(0)
            .method(0, "<init>", "()V"),
        ClassFileBuilder::new("java/util/HashMap")
            .implements("java/util/Map")
            .constructor("")
            .method(ACC_PUBLIC, "put", &format!("({OBJECT}{OBJECT}){OBJECT}"))
            .method(ACC_PUBLIC, "get", &format!("({OBJECT}){OBJECT}")),
        ClassFileBuilder::new("android/app/Activity")
            .constructor("")
            .method(ACC_PUBLIC, "onCreate", "(Landroid/os/Bundle;)V"),
    ]
}

/// Write `rt.jar` with [`jdk_classes`] plus a manifest into `dir`
pub fn write_jdk_fixture(dir: &Path) -> Result<PathBuf> {
    JarBuilder::new()
        .entry("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")
        .classes(&jdk_classes())
        .write(&dir.join("rt.jar"))
}
