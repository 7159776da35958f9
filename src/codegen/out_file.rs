// Generated output file
//
// Accumulates the declarations generators append for one input file, plus the
// type imports they need, and assembles the final text.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use prost_reflect::FileDescriptor;

use super::comments::extract_comments;
use super::names;
use crate::registry::DescriptorRegistry;

#[derive(Debug, Clone)]
pub struct OutFile {
    name: String,
    source: FileDescriptor,
    registry: Arc<DescriptorRegistry>,
    credit: String,
    comments: HashMap<String, String>,
    /// Names declared by this file; imports must not shadow them.
    local_names: HashSet<String>,
    /// module -> imported name -> local alias
    imports: BTreeMap<String, BTreeMap<String, String>>,
    body: String,
}

impl OutFile {
    pub fn new(
        name: impl Into<String>,
        source: FileDescriptor,
        registry: Arc<DescriptorRegistry>,
        credit: impl Into<String>,
    ) -> Self {
        let local_names = registry
            .visit_types(&source)
            .map(|node| names::type_name(node.full_name(), node.package_name()))
            .collect();
        let comments = extract_comments(source.file_descriptor_proto());
        OutFile {
            name: name.into(),
            source,
            registry,
            credit: credit.into(),
            comments,
            local_names,
            imports: BTreeMap::new(),
            body: String::new(),
        }
    }

    /// Output path relative to the output root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input file this output was generated from.
    pub fn source(&self) -> &FileDescriptor {
        &self.source
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Source comment for a declaration, keyed by its full name.
    pub fn comment_for(&self, full_name: &str) -> Option<&str> {
        let package = self.source.package_name();
        let relative = if package.is_empty() {
            full_name
        } else {
            full_name
                .strip_prefix(package)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(full_name)
        };
        self.comments.get(relative).map(String::as_str)
    }

    pub fn push_str(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// Import `name` from the output at `module_path` and return the
    /// identifier to use for it in this file.
    pub fn import_type(&mut self, name: &str, module_path: &str) -> String {
        let module = names::relative_module(&self.name, module_path);
        if let Some(alias) = self.imports.get(&module).and_then(|names| names.get(name)) {
            return alias.clone();
        }

        let mut alias = name.to_string();
        while self.local_names.contains(&alias) || self.is_imported_alias(&alias) {
            alias.push('$');
        }
        self.imports
            .entry(module)
            .or_default()
            .insert(name.to_string(), alias.clone());
        alias
    }

    fn is_imported_alias(&self, alias: &str) -> bool {
        self.imports
            .values()
            .any(|names| names.values().any(|a| a == alias))
    }

    /// Final file text: header, imports, declarations.
    pub fn content(&self) -> String {
        let proto = self.source.file_descriptor_proto();
        let syntax = match proto.syntax() {
            "" => "proto2",
            other => other,
        };

        let mut out = format!("// @generated {}\n", self.credit);
        let package = self.source.package_name();
        if package.is_empty() {
            out.push_str(&format!(
                "// @generated from protobuf file \"{}\" (syntax {syntax})\n",
                self.source.name()
            ));
        } else {
            out.push_str(&format!(
                "// @generated from protobuf file \"{}\" (package \"{package}\", syntax {syntax})\n",
                self.source.name()
            ));
        }
        out.push_str("// tslint:disable\n");
        if proto.options.as_ref().is_some_and(|o| o.deprecated()) {
            out.push_str("// @deprecated\n");
        }

        for (module, names) in &self.imports {
            let specifiers: Vec<String> = names
                .iter()
                .map(|(name, alias)| {
                    if name == alias {
                        name.clone()
                    } else {
                        format!("{name} as {alias}")
                    }
                })
                .collect();
            out.push_str(&format!(
                "import type {{ {} }} from \"{module}\";\n",
                specifiers.join(", ")
            ));
        }

        if !self.body.is_empty() {
            out.push('\n');
            out.push_str(&self.body);
        }
        out
    }
}
