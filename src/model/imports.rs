//! Import declarations recovered from source text

use crate::completion::patterns::{IMPORT, PACKAGE};

/// Imports and package declaration of one compilation unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports {
    /// `import java.util.List;` -> `java.util.List`
    pub single_type: Vec<String>,
    /// `import java.util.*;` -> `java.util`
    pub on_demand: Vec<String>,
    /// Own package, empty for the default package
    pub package: String,
}

impl Imports {
    /// Collect non-static imports and the package declaration from `text`
    pub fn scan(text: &str) -> Self {
        let mut imports = Imports::default();
        if let Some(caps) = PACKAGE.captures(text) {
            imports.package = caps[1].to_string();
        }
        for caps in IMPORT.captures_iter(text) {
            if caps.get(1).is_some() {
                // static imports name members, not types
                continue;
            }
            let name = &caps[2];
            match name.strip_suffix(".*") {
                Some(package) => push_unique(&mut imports.on_demand, package),
                None => push_unique(&mut imports.single_type, name),
            }
        }
        imports
    }

    /// True if `fqcn` is visible without a new import
    pub fn covers(&self, fqcn: &str) -> bool {
        let parent = fqcn.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
        parent.is_empty()
            || parent == "java.lang"
            || parent == self.package
            || self.single_type.iter().any(|s| s == fqcn)
            || self.on_demand.iter().any(|p| p == parent)
    }

    /// Single-type import whose simple name is `simple`
    pub fn single_type_for(&self, simple: &str) -> Option<&str> {
        self.single_type
            .iter()
            .find(|fqcn| fqcn.rsplit('.').next() == Some(simple))
            .map(String::as_str)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
