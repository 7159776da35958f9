// Enum generator
//
// Renders an enum as a union of the values its JSON representation may take:
// the value names, or the numbers with `enum_as_integer`.

use prost_reflect::EnumDescriptor;

use super::comments::doc_block;
use super::names;
use super::out_file::OutFile;
use super::symbols::SymbolTable;
use crate::error::Result;
use crate::options::PluginOptions;

pub struct EnumGenerator<'a> {
    options: &'a PluginOptions,
}

impl<'a> EnumGenerator<'a> {
    pub fn new(options: &'a PluginOptions) -> Self {
        EnumGenerator { options }
    }

    /// Append `export type <Name> = ...;` for `enumeration` to `out`.
    pub fn generate_enum(&self, symbols: &mut SymbolTable, out: &mut OutFile, enumeration: &EnumDescriptor) -> Result<()> {
        let name = names::type_name(enumeration.full_name(), enumeration.package_name());
        symbols.register(enumeration.full_name(), enumeration.parent_file().name(), &name)?;

        let mut members = Vec::new();
        let mut seen_numbers = Vec::new();
        for value in enumeration.values() {
            let literal = if self.options.enum_as_integer {
                // aliases share a number
                if seen_numbers.contains(&value.number()) {
                    continue;
                }
                seen_numbers.push(value.number());
                value.number().to_string()
            } else {
                format!("\"{}\"", value.name())
            };

            let mut tags = Vec::new();
            if value
                .enum_value_descriptor_proto()
                .options
                .as_ref()
                .is_some_and(|o| o.deprecated())
            {
                tags.push("@deprecated".to_string());
            }
            tags.push(format!(
                "@generated from protobuf enum value: {} = {};",
                value.name(),
                value.number()
            ));
            // enum values are scoped to the enum's parent, comments to the enum
            let comment_key = format!("{}.{}", enumeration.full_name(), value.name());
            let mut member = doc_block("    ", out.comment_for(&comment_key), &tags);
            member.push_str(&format!("    | {literal}"));
            members.push(member);
        }

        let mut tags = Vec::new();
        if enumeration
            .enum_descriptor_proto()
            .options
            .as_ref()
            .is_some_and(|o| o.deprecated())
        {
            tags.push("@deprecated".to_string());
        }
        tags.push(format!("@generated from protobuf enum {}", enumeration.full_name()));

        let doc = doc_block("", out.comment_for(enumeration.full_name()), &tags);
        out.push_str(&doc);
        if members.is_empty() {
            out.push_str(&format!("export type {name} = never;\n"));
        } else {
            out.push_str(&format!("export type {name} =\n{};\n", members.join("\n")));
        }
        tracing::trace!(enumeration = enumeration.full_name(), file = out.name(), "generated enum");
        Ok(())
    }
}
