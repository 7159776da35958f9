// Per-run symbol table
//
// Generators bind every declaration they render to its TypeScript name, and
// resolve references to other declarations through the table. A fresh table
// is created for every generation run.

use std::collections::{HashMap, HashSet};

use prost_reflect::FileDescriptor;

use super::file_table::{FileTable, OutputKind};
use super::names;
use super::out_file::OutFile;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Input file declaring the type.
    pub file: String,
    /// TypeScript name inside that file's main output.
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    taken: HashMap<String, HashSet<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `full_name` to `name` in `file`.
    pub fn register(&mut self, full_name: &str, file: &str, name: &str) -> Result<()> {
        let clash = |reason: String| Error::Generator {
            file: file.to_string(),
            type_name: full_name.to_string(),
            reason,
        };

        if let Some(existing) = self.symbols.get(full_name) {
            return Err(clash(format!(
                "already bound to \"{}\" in {}",
                existing.name, existing.file
            )));
        }
        let taken = self.taken.entry(file.to_string()).or_default();
        if !taken.insert(name.to_string()) {
            return Err(clash(format!(
                "TypeScript name \"{name}\" is already used by another declaration of the same file"
            )));
        }

        self.symbols.insert(
            full_name.to_string(),
            Symbol {
                file: file.to_string(),
                name: name.to_string(),
            },
        );
        Ok(())
    }

    pub fn find(&self, full_name: &str) -> Option<&Symbol> {
        self.symbols.get(full_name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Name to write in `out` for the declaration `full_name` of `declared_in`.
    ///
    /// Declarations not rendered yet (later in the same file, or in a file
    /// generated later) resolve to the name their generator will bind. Foreign
    /// declarations are imported from the main output of their file.
    pub fn reference(
        &self,
        out: &mut OutFile,
        file_table: &FileTable,
        full_name: &str,
        declared_in: &FileDescriptor,
    ) -> Result<String> {
        let name = match self.find(full_name) {
            Some(symbol) => symbol.name.clone(),
            None => names::type_name(full_name, declared_in.package_name()),
        };
        if declared_in.name() == out.source().name() {
            return Ok(name);
        }
        let module = file_table.get(declared_in.name(), OutputKind::Main)?;
        Ok(out.import_type(&name, module))
    }
}
