// protoc-gen-jsontypes codegen module

use std::sync::Arc;

use crate::error::Result;
use crate::options::PluginOptions;
use crate::registry::{DescriptorRegistry, TypeNode};
use crate::request::CodeGeneratorRequest;

pub mod comments;
pub mod enums;
pub mod file_table;
pub mod filter;
pub mod message_interface;
pub mod names;
pub mod out_file;
pub mod symbols;

use enums::EnumGenerator;
use file_table::{FileTable, OutputKind};
use message_interface::MessageInterfaceGenerator;
use out_file::OutFile;
use symbols::SymbolTable;

/// Run one generation: name every output, render every known file, then
/// filter down to the files the caller asked for.
///
/// All state (naming table, symbol table, output files) is created here and
/// dropped or handed back at the end, so runs never observe each other.
pub fn generate(request: &CodeGeneratorRequest) -> Result<Vec<OutFile>> {
    let options = PluginOptions::parse(request.parameter.as_deref())?;
    let registry = Arc::new(DescriptorRegistry::from_request(request)?);
    let credit = plugin_credit(request.parameter.as_deref());

    let _span = tracing::info_span!(
        "generate",
        files = registry.all_files().len(),
        requested = request.file_to_generate.len()
    )
    .entered();

    // ensure unique file names
    let mut file_table = FileTable::new();
    file_table.register_all_kinds(registry.all_files().iter().map(|f| f.name()))?;

    let mut out_files = Vec::with_capacity(registry.all_files().len());
    for file in registry.all_files() {
        let name = file_table.get(file.name(), OutputKind::Main)?;
        out_files.push(OutFile::new(name, file.clone(), registry.clone(), credit.as_str()));
    }

    let mut symbols = SymbolTable::new();
    let gen_message_interface = MessageInterfaceGenerator::new(&options, &file_table);
    let gen_enum = EnumGenerator::new(&options);
    for out in &mut out_files {
        let walk = out.registry().visit_types(out.source());
        for node in walk {
            tracing::trace!(declaration = node.full_name(), "dispatching");
            match node {
                TypeNode::Message(message) => {
                    gen_message_interface.generate_message_interface(&mut symbols, out, &message)?
                }
                TypeNode::Enum(enumeration) => gen_enum.generate_enum(&mut symbols, out, &enumeration)?,
            }
        }
    }

    let out_files = filter::filter_out_files(out_files, &request.file_to_generate, &options, &registry);
    tracing::debug!(emitted = out_files.len(), "generation finished");
    Ok(out_files)
}

fn plugin_credit(parameter: Option<&str>) -> String {
    let mut credit = format!("by protoc-gen-jsontypes {}", env!("CARGO_PKG_VERSION"));
    if let Some(parameter) = parameter.filter(|p| !p.is_empty()) {
        credit.push_str(&format!(" with parameter {parameter}"));
    }
    credit
}
