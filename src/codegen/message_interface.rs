// Message interface generator
//
// Renders a message as a TypeScript interface describing its canonical proto3
// JSON representation.

use prost_reflect::{Cardinality, FieldDescriptor, Kind, MessageDescriptor};

use super::comments::doc_block;
use super::file_table::FileTable;
use super::names;
use super::out_file::OutFile;
use super::symbols::SymbolTable;
use crate::error::Result;
use crate::options::PluginOptions;

/// Well-known types with a dedicated JSON representation.
fn well_known_json_type(full_name: &str) -> Option<&'static str> {
    Some(match full_name {
        "google.protobuf.Timestamp" | "google.protobuf.Duration" | "google.protobuf.FieldMask" => {
            "string"
        }
        "google.protobuf.Struct" => "{ [key: string]: unknown }",
        "google.protobuf.Value" => "unknown",
        "google.protobuf.ListValue" => "unknown[]",
        "google.protobuf.Any" => "{ \"@type\": string; [key: string]: unknown }",
        "google.protobuf.DoubleValue"
        | "google.protobuf.FloatValue"
        | "google.protobuf.Int32Value"
        | "google.protobuf.UInt32Value" => "number",
        "google.protobuf.Int64Value"
        | "google.protobuf.UInt64Value"
        | "google.protobuf.StringValue"
        | "google.protobuf.BytesValue" => "string",
        "google.protobuf.BoolValue" => "boolean",
        _ => return None,
    })
}

pub struct MessageInterfaceGenerator<'a> {
    options: &'a PluginOptions,
    file_table: &'a FileTable,
}

impl<'a> MessageInterfaceGenerator<'a> {
    pub fn new(options: &'a PluginOptions, file_table: &'a FileTable) -> Self {
        MessageInterfaceGenerator {
            options,
            file_table,
        }
    }

    /// Append `export interface <Name> { ... }` for `message` to `out`.
    pub fn generate_message_interface(
        &self,
        symbols: &mut SymbolTable,
        out: &mut OutFile,
        message: &MessageDescriptor,
    ) -> Result<()> {
        let name = names::type_name(message.full_name(), message.package_name());
        symbols.register(message.full_name(), message.parent_file().name(), &name)?;

        let mut members = String::new();
        for field in message.fields() {
            members.push_str(&self.member(symbols, out, &field)?);
        }

        let mut tags = Vec::new();
        if message
            .descriptor_proto()
            .options
            .as_ref()
            .is_some_and(|o| o.deprecated())
        {
            tags.push("@deprecated".to_string());
        }
        tags.push(format!("@generated from protobuf message {}", message.full_name()));

        let doc = doc_block("", out.comment_for(message.full_name()), &tags);
        out.push_str(&doc);
        out.push_str(&format!("export interface {name} {{\n{members}}}\n"));
        tracing::trace!(message = message.full_name(), file = out.name(), "generated message interface");
        Ok(())
    }

    fn member(&self, symbols: &SymbolTable, out: &mut OutFile, field: &FieldDescriptor) -> Result<String> {
        let key = if self.options.use_proto_field_name {
            field.name().to_string()
        } else {
            field.json_name().to_string()
        };
        let optional = !self.options.emit_default_values || field.supports_presence();
        let ty = self.field_type(symbols, out, field)?;

        let mut tags = Vec::new();
        if field
            .field_descriptor_proto()
            .options
            .as_ref()
            .is_some_and(|o| o.deprecated())
        {
            tags.push("@deprecated".to_string());
        }
        tags.push(format!("@generated from protobuf field: {}", field_declaration(field)));

        let mut text = doc_block("    ", out.comment_for(field.full_name()), &tags);
        text.push_str(&format!(
            "    {}{}: {ty};\n",
            names::property_key(&key),
            if optional { "?" } else { "" }
        ));
        Ok(text)
    }

    fn field_type(&self, symbols: &SymbolTable, out: &mut OutFile, field: &FieldDescriptor) -> Result<String> {
        if field.is_map() {
            if let Kind::Message(entry) = field.kind() {
                let value = self.value_type(symbols, out, &entry.map_entry_value_field())?;
                return Ok(format!("{{ [key: string]: {value} }}"));
            }
        }
        let value = self.value_type(symbols, out, field)?;
        if field.is_list() {
            if value.contains(' ') {
                Ok(format!("({value})[]"))
            } else {
                Ok(format!("{value}[]"))
            }
        } else {
            Ok(value)
        }
    }

    /// JSON type of a single value of `field`.
    fn value_type(&self, symbols: &SymbolTable, out: &mut OutFile, field: &FieldDescriptor) -> Result<String> {
        let ty = match field.kind() {
            Kind::Double
            | Kind::Float
            | Kind::Int32
            | Kind::Uint32
            | Kind::Sint32
            | Kind::Fixed32
            | Kind::Sfixed32 => "number".to_string(),
            Kind::Int64 | Kind::Uint64 | Kind::Sint64 | Kind::Fixed64 | Kind::Sfixed64 => {
                "string".to_string()
            }
            Kind::Bool => "boolean".to_string(),
            Kind::String | Kind::Bytes => "string".to_string(),
            Kind::Enum(enumeration) => {
                if enumeration.full_name() == "google.protobuf.NullValue" {
                    "null".to_string()
                } else {
                    symbols.reference(
                        out,
                        self.file_table,
                        enumeration.full_name(),
                        &enumeration.parent_file(),
                    )?
                }
            }
            Kind::Message(message) => match well_known_json_type(message.full_name()) {
                Some(json) => json.to_string(),
                None => symbols.reference(out, self.file_table, message.full_name(), &message.parent_file())?,
            },
        };
        Ok(ty)
    }
}

/// The field as declared in the .proto file, e.g. `repeated string tags = 3;`.
fn field_declaration(field: &FieldDescriptor) -> String {
    let ty = if field.is_map() {
        match field.kind() {
            Kind::Message(entry) => format!(
                "map<{}, {}>",
                proto_type_name(&entry.map_entry_key_field()),
                proto_type_name(&entry.map_entry_value_field())
            ),
            _ => proto_type_name(field),
        }
    } else {
        proto_type_name(field)
    };

    let label = if field.is_map() {
        ""
    } else if field.is_list() {
        "repeated "
    } else if field.field_descriptor_proto().proto3_optional() {
        "optional "
    } else if field.cardinality() == Cardinality::Required {
        "required "
    } else {
        ""
    };

    format!("{label}{ty} {} = {};", field.name(), field.number())
}

fn proto_type_name(field: &FieldDescriptor) -> String {
    match field.kind() {
        Kind::Double => "double".into(),
        Kind::Float => "float".into(),
        Kind::Int32 => "int32".into(),
        Kind::Int64 => "int64".into(),
        Kind::Uint32 => "uint32".into(),
        Kind::Uint64 => "uint64".into(),
        Kind::Sint32 => "sint32".into(),
        Kind::Sint64 => "sint64".into(),
        Kind::Fixed32 => "fixed32".into(),
        Kind::Fixed64 => "fixed64".into(),
        Kind::Sfixed32 => "sfixed32".into(),
        Kind::Sfixed64 => "sfixed64".into(),
        Kind::Bool => "bool".into(),
        Kind::String => "string".into(),
        Kind::Bytes => "bytes".into(),
        Kind::Message(message) => message.full_name().into(),
        Kind::Enum(enumeration) => enumeration.full_name().into(),
    }
}
