//! Random class sets for property-based tests.
//!
//! [`ClassSet`] generates a handful of distinct internal class names spread
//! over a few packages, plus a name prefix to query with. Names avoid `$` so
//! that every generated class is a top-level class with an obvious simple
//! name.

use std::collections::BTreeSet;

use quickcheck::{Arbitrary, Gen};

use crate::classfile::ClassFileBuilder;

const PACKAGES: &[&str] = &["com/acme", "com/acme/util", "org/sample", "net/demo/io"];
const MAX_CLASSES: usize = 24;

/// Distinct internal names and a query prefix
#[derive(Clone, Debug)]
pub struct ClassSet {
    pub internal_names: Vec<String>,
    pub prefix: String,
}

impl ClassSet {
    pub fn builders(&self) -> Vec<ClassFileBuilder> {
        self.internal_names
            .iter()
            .map(|name| ClassFileBuilder::new(name).constructor(""))
            .collect()
    }

    /// `com/acme/Widget` -> `Widget`
    pub fn simple_names(&self) -> Vec<&str> {
        self.internal_names
            .iter()
            .map(|name| name.rsplit('/').next().unwrap_or(name))
            .collect()
    }
}

/// Generates an integer in `[min, max)`.
fn gen_range(g: &mut Gen, min: usize, max: usize) -> usize {
    min + usize::arbitrary(g) % (max - min)
}

/// Upper-case start, then a short run of letters and digits
fn gen_simple_name(g: &mut Gen) -> String {
    let starters: Vec<char> = "ABCDEFGHIJKLMNOPQRSTUVWXYZ".chars().collect();
    let continuers: Vec<char> = "abcdefghijklmnopqrstuvwxyzABC0123456789_".chars().collect();
    let len = gen_range(g, 1, 8);
    let mut name = String::new();
    name.push(*g.choose(&starters).unwrap());
    for _ in 1..len {
        name.push(*g.choose(&continuers).unwrap());
    }
    name
}

impl Arbitrary for ClassSet {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = gen_range(g, 1, MAX_CLASSES);
        let mut names = BTreeSet::new();
        for _ in 0..count {
            let package = g.choose(PACKAGES).unwrap();
            names.insert(format!("{}/{}", package, gen_simple_name(g)));
        }
        let internal_names: Vec<String> = names.into_iter().collect();

        // Usually a prefix of an existing name, sometimes arbitrary
        let prefix = if bool::arbitrary(g) {
            let simple = g
                .choose(&internal_names)
                .and_then(|name| name.rsplit('/').next())
                .unwrap_or("")
                .to_string();
            let cut = gen_range(g, 0, simple.len() + 1);
            simple[..cut].to_string()
        } else {
            gen_simple_name(g)
        };

        ClassSet {
            internal_names,
            prefix,
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let prefix = self.prefix.clone();
        let names = self.internal_names.clone();
        let len = names.len();
        Box::new((0..len).filter(move |_| len > 1).map(move |skip| {
            let mut internal_names = names.clone();
            internal_names.remove(skip);
            ClassSet {
                internal_names,
                prefix: prefix.clone(),
            }
        }))
    }
}
