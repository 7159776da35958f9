//! Test utilities - descriptor and request builders for unit and integration tests.
//!
//! protoc always hands plugins fully qualified type names and filled-in JSON
//! names; the builders do the same so fixtures look like real requests.

use prost::Message;
use prost::encoding::{WireType, encode_key, encode_varint};
use prost_types::descriptor_proto::ExtensionRange;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumOptions, EnumValueDescriptorProto, EnumValueOptions,
    FieldDescriptorProto, FieldOptions, FileDescriptorProto, FileOptions, MessageOptions,
    MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto, SourceCodeInfo,
};

use crate::codegen::names::{to_lower_camel_case, to_pascal_case};
use crate::request::CodeGeneratorRequest;

/// Build a request the way protoc would send it.
pub fn request(
    to_generate: &[&str],
    parameter: Option<&str>,
    files: Vec<FileDescriptorProto>,
) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: to_generate.iter().map(|f| f.to_string()).collect(),
        parameter: parameter.map(str::to_string),
        proto_file: files.iter().map(|f| f.encode_to_vec()).collect(),
    }
}

// field numbers in descriptor.proto
const FILE_MESSAGE_TYPE: u32 = 4;
const FILE_OPTIONS: u32 = 8;
const MESSAGE_FIELD: u32 = 2;
const MESSAGE_OPTIONS: u32 = 7;
const MESSAGE_ONEOF_DECL: u32 = 8;
const FIELD_OPTIONS: u32 = 8;
const ONEOF_OPTIONS: u32 = 2;

/// Declaration of a file that receives the custom option written by
/// [`encode_with_option`]. Indices count top-level messages and, inside one,
/// fields or oneofs in declaration order.
#[derive(Debug, Clone, Copy)]
pub enum OptionTarget {
    File,
    Message(usize),
    Field { message: usize, field: usize },
    Oneof { message: usize, oneof: usize },
}

/// Encode `file` with a custom option set on `target`: extension `number`
/// holding the varint `value`. `prost_types` has no room for extension
/// values, so the option is appended to the encoded options message as an
/// extra occurrence, which decoders merge.
pub fn encode_with_option(file: &FileDescriptorProto, target: OptionTarget, number: u32, value: u64) -> Vec<u8> {
    let mut option = Vec::new();
    encode_key(number, WireType::Varint, &mut option);
    encode_varint(value, &mut option);

    match target {
        OptionTarget::File => with_option(file, FILE_OPTIONS, &option),
        OptionTarget::Message(index) => encode_file(file, index, |m| with_option(m, MESSAGE_OPTIONS, &option)),
        OptionTarget::Field { message, field } => encode_file(file, message, |m| {
            let mut rest = m.clone();
            let fields = std::mem::take(&mut rest.field);
            let mut bytes = rest.encode_to_vec();
            encode_repeated(MESSAGE_FIELD, &fields, field, |f| with_option(f, FIELD_OPTIONS, &option), &mut bytes);
            bytes
        }),
        OptionTarget::Oneof { message, oneof } => encode_file(file, message, |m| {
            let mut rest = m.clone();
            let oneofs = std::mem::take(&mut rest.oneof_decl);
            let mut bytes = rest.encode_to_vec();
            encode_repeated(MESSAGE_ONEOF_DECL, &oneofs, oneof, |o| with_option(o, ONEOF_OPTIONS, &option), &mut bytes);
            bytes
        }),
    }
}

/// Encode `file`, writing its top-level message at `index` with `encode_message`.
fn encode_file(file: &FileDescriptorProto, index: usize, encode_message: impl Fn(&DescriptorProto) -> Vec<u8>) -> Vec<u8> {
    let mut rest = file.clone();
    let messages = std::mem::take(&mut rest.message_type);
    let mut bytes = rest.encode_to_vec();
    encode_repeated(FILE_MESSAGE_TYPE, &messages, index, encode_message, &mut bytes);
    bytes
}

fn append_length_delimited(tag: u32, payload: &[u8], buf: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(payload.len() as u64, buf);
    buf.extend_from_slice(payload);
}

fn with_option<T: Message>(item: &T, options_tag: u32, option: &[u8]) -> Vec<u8> {
    let mut bytes = item.encode_to_vec();
    append_length_delimited(options_tag, option, &mut bytes);
    bytes
}

/// Append `items` as repeated field `tag`, encoding the one at `index` with
/// `encode_target`. Order is preserved so descriptor indices stay valid.
fn encode_repeated<T: Message>(
    tag: u32,
    items: &[T],
    index: usize,
    encode_target: impl Fn(&T) -> Vec<u8>,
    buf: &mut Vec<u8>,
) {
    for (i, item) in items.iter().enumerate() {
        let payload = if i == index {
            encode_target(item)
        } else {
            item.encode_to_vec()
        };
        append_length_delimited(tag, &payload, buf);
    }
}

/// A stand-in for google/protobuf/descriptor.proto declaring only the option
/// messages, so custom options can be declared against them.
pub fn descriptor_proto() -> FileDescriptorProto {
    let options = |name: &str| DescriptorProto {
        name: Some(name.to_string()),
        extension_range: vec![ExtensionRange {
            start: Some(1000),
            end: Some(536_870_912),
            options: None,
        }],
        ..Default::default()
    };
    FileDescriptorProto {
        name: Some("google/protobuf/descriptor.proto".into()),
        package: Some("google.protobuf".into()),
        message_type: [
            "FileOptions",
            "MessageOptions",
            "FieldOptions",
            "OneofOptions",
            "EnumOptions",
            "EnumValueOptions",
            "ServiceOptions",
            "MethodOptions",
        ]
        .into_iter()
        .map(options)
        .collect(),
        ..Default::default()
    }
}

fn field(name: &str, number: i32, label: Label, ty: Type, type_name: Option<&str>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_string),
        json_name: Some(to_lower_camel_case(name)),
        ..Default::default()
    }
}

pub struct FileBuilder {
    proto: FileDescriptorProto,
    messages: Vec<MessageBuilder>,
}

impl FileBuilder {
    /// A proto3 file.
    pub fn new(name: &str, package: &str) -> Self {
        FileBuilder {
            proto: FileDescriptorProto {
                name: Some(name.to_string()),
                package: (!package.is_empty()).then(|| package.to_string()),
                syntax: Some("proto3".into()),
                ..Default::default()
            },
            messages: Vec::new(),
        }
    }

    pub fn syntax(mut self, syntax: &str) -> Self {
        self.proto.syntax = Some(syntax.to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.proto.options = Some(FileOptions {
            deprecated: Some(true),
            ..Default::default()
        });
        self
    }

    pub fn import(mut self, dependency: &str) -> Self {
        self.proto.dependency.push(dependency.to_string());
        self
    }

    pub fn message(mut self, message: MessageBuilder) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumBuilder) -> Self {
        self.proto.enum_type.push(enumeration.build());
        self
    }

    /// Declare a custom option: `extend <extendee> { <ty> <name> = <number>; }`.
    pub fn extension(mut self, extendee: &str, name: &str, number: i32, ty: Type) -> Self {
        let mut ext = field(name, number, Label::Optional, ty, None);
        ext.extendee = Some(extendee.to_string());
        self.proto.extension.push(ext);
        self
    }

    /// A service whose methods are `(name, input type, output type)`.
    pub fn service(mut self, name: &str, methods: &[(&str, &str, &str)]) -> Self {
        self.proto.service.push(ServiceDescriptorProto {
            name: Some(name.to_string()),
            method: methods
                .iter()
                .map(|(name, input, output)| MethodDescriptorProto {
                    name: Some(name.to_string()),
                    input_type: Some(input.to_string()),
                    output_type: Some(output.to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        });
        self
    }

    /// Attach a leading comment to the element at `path`.
    pub fn comment(mut self, path: &[i32], text: &str) -> Self {
        self.location(path).leading_comments = Some(text.to_string());
        self
    }

    pub fn trailing_comment(mut self, path: &[i32], text: &str) -> Self {
        self.location(path).trailing_comments = Some(text.to_string());
        self
    }

    fn location(&mut self, path: &[i32]) -> &mut Location {
        let info = self.proto.source_code_info.get_or_insert_with(SourceCodeInfo::default);
        info.location.push(Location {
            path: path.to_vec(),
            span: vec![0, 0, 0],
            ..Default::default()
        });
        let last = info.location.len() - 1;
        &mut info.location[last]
    }

    pub fn build(mut self) -> FileDescriptorProto {
        let scope = match self.proto.package() {
            "" => String::new(),
            package => format!(".{package}"),
        };
        let messages = std::mem::take(&mut self.messages);
        self.proto.message_type = messages.into_iter().map(|m| m.build(&scope)).collect();
        self.proto
    }
}

enum PendingField {
    Plain(FieldDescriptorProto),
    Map {
        name: String,
        number: i32,
        key: Type,
        value: Type,
        value_type_name: Option<String>,
    },
}

pub struct MessageBuilder {
    name: String,
    fields: Vec<PendingField>,
    nested: Vec<MessageBuilder>,
    enums: Vec<EnumDescriptorProto>,
    oneofs: Vec<OneofDescriptorProto>,
    deprecated: bool,
}

impl MessageBuilder {
    pub fn new(name: &str) -> Self {
        MessageBuilder {
            name: name.to_string(),
            fields: Vec::new(),
            nested: Vec::new(),
            enums: Vec::new(),
            oneofs: Vec::new(),
            deprecated: false,
        }
    }

    pub fn scalar(mut self, name: &str, number: i32, ty: Type) -> Self {
        self.fields
            .push(PendingField::Plain(field(name, number, Label::Optional, ty, None)));
        self
    }

    pub fn repeated_scalar(mut self, name: &str, number: i32, ty: Type) -> Self {
        self.fields
            .push(PendingField::Plain(field(name, number, Label::Repeated, ty, None)));
        self
    }

    /// A proto3 `optional` scalar, with its synthetic oneof.
    pub fn optional_scalar(mut self, name: &str, number: i32, ty: Type) -> Self {
        let mut f = field(name, number, Label::Optional, ty, None);
        f.proto3_optional = Some(true);
        f.oneof_index = Some(self.oneofs.len() as i32);
        self.oneofs.push(OneofDescriptorProto {
            name: Some(format!("_{name}")),
            options: None,
        });
        self.fields.push(PendingField::Plain(f));
        self
    }

    pub fn message_field(mut self, name: &str, number: i32, type_name: &str) -> Self {
        self.fields.push(PendingField::Plain(field(
            name,
            number,
            Label::Optional,
            Type::Message,
            Some(type_name),
        )));
        self
    }

    pub fn repeated_message_field(mut self, name: &str, number: i32, type_name: &str) -> Self {
        self.fields.push(PendingField::Plain(field(
            name,
            number,
            Label::Repeated,
            Type::Message,
            Some(type_name),
        )));
        self
    }

    pub fn enum_field(mut self, name: &str, number: i32, type_name: &str) -> Self {
        self.fields.push(PendingField::Plain(field(
            name,
            number,
            Label::Optional,
            Type::Enum,
            Some(type_name),
        )));
        self
    }

    /// `map<key, value> name = number;` plus its synthetic entry message.
    /// `value_type_name` is required for message and enum values.
    pub fn map_field(mut self, name: &str, number: i32, key: Type, value: Type, value_type_name: Option<&str>) -> Self {
        self.fields.push(PendingField::Map {
            name: name.to_string(),
            number,
            key,
            value,
            value_type_name: value_type_name.map(str::to_string),
        });
        self
    }

    pub fn nested(mut self, message: MessageBuilder) -> Self {
        self.nested.push(message);
        self
    }

    pub fn nested_enum(mut self, enumeration: EnumBuilder) -> Self {
        self.enums.push(enumeration.build());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Mark the already added field `name` as deprecated.
    pub fn deprecated_field(mut self, name: &str) -> Self {
        for pending in &mut self.fields {
            if let PendingField::Plain(f) = pending {
                if f.name() == name {
                    f.options = Some(FieldOptions {
                        deprecated: Some(true),
                        ..Default::default()
                    });
                }
            }
        }
        self
    }

    /// `scope` is the fully qualified name of the enclosing package or
    /// message, with a leading dot.
    fn build(self, scope: &str) -> DescriptorProto {
        let full_name = format!("{scope}.{}", self.name);
        let mut fields = Vec::new();
        let mut nested_type: Vec<DescriptorProto> = Vec::new();

        for pending in self.fields {
            match pending {
                PendingField::Plain(f) => fields.push(f),
                PendingField::Map {
                    name,
                    number,
                    key,
                    value,
                    value_type_name,
                } => {
                    let entry_name = format!("{}Entry", to_pascal_case(&name));
                    nested_type.push(DescriptorProto {
                        name: Some(entry_name.clone()),
                        field: vec![
                            field("key", 1, Label::Optional, key, None),
                            field("value", 2, Label::Optional, value, value_type_name.as_deref()),
                        ],
                        options: Some(MessageOptions {
                            map_entry: Some(true),
                            ..Default::default()
                        }),
                        ..Default::default()
                    });
                    fields.push(field(
                        &name,
                        number,
                        Label::Repeated,
                        Type::Message,
                        Some(&format!("{full_name}.{entry_name}")),
                    ));
                }
            }
        }
        nested_type.extend(self.nested.into_iter().map(|m| m.build(&full_name)));

        DescriptorProto {
            name: Some(self.name),
            field: fields,
            nested_type,
            enum_type: self.enums,
            oneof_decl: self.oneofs,
            options: self.deprecated.then(|| MessageOptions {
                deprecated: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

pub struct EnumBuilder {
    proto: EnumDescriptorProto,
}

impl EnumBuilder {
    /// Values numbered 0, 1, 2, ...
    pub fn new(name: &str, values: &[&str]) -> Self {
        let numbered: Vec<(&str, i32)> = values.iter().enumerate().map(|(i, v)| (*v, i as i32)).collect();
        Self::with_values(name, &numbered)
    }

    pub fn with_values(name: &str, values: &[(&str, i32)]) -> Self {
        EnumBuilder {
            proto: EnumDescriptorProto {
                name: Some(name.to_string()),
                value: values
                    .iter()
                    .map(|(name, number)| EnumValueDescriptorProto {
                        name: Some(name.to_string()),
                        number: Some(*number),
                        options: None,
                    })
                    .collect(),
                ..Default::default()
            },
        }
    }

    pub fn allow_alias(mut self) -> Self {
        self.proto.options.get_or_insert_with(EnumOptions::default).allow_alias = Some(true);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.proto.options.get_or_insert_with(EnumOptions::default).deprecated = Some(true);
        self
    }

    /// Mark the value `name` as deprecated.
    pub fn deprecated_value(mut self, name: &str) -> Self {
        for value in self.proto.value.iter_mut().filter(|v| v.name() == name) {
            value.options = Some(EnumValueOptions {
                deprecated: Some(true),
                ..Default::default()
            });
        }
        self
    }

    fn build(self) -> EnumDescriptorProto {
        self.proto
    }
}
