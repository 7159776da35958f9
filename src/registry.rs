//! Descriptor registry over a `prost_reflect::DescriptorPool`.
//!
//! Resolves every file of the request, including files only reached through
//! imports, and answers the structural questions the orchestrator and the
//! output filter ask: enumeration order, type traversal, synthetic types and
//! whether a file is used by other files.

use prost::Message;
use prost_reflect::{
    DescriptorPool, DynamicMessage, EnumDescriptor, FileDescriptor, Kind, MessageDescriptor,
};

use crate::error::{Error, Result};
use crate::request::{CodeGeneratorRequest, RawFileDescriptorSet};

#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    files: Vec<FileDescriptor>,
}

/// A type declaration reached by [`DescriptorRegistry::visit_types`].
#[derive(Debug, Clone)]
pub enum TypeNode {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl TypeNode {
    pub fn full_name(&self) -> &str {
        match self {
            TypeNode::Message(m) => m.full_name(),
            TypeNode::Enum(e) => e.full_name(),
        }
    }

    pub fn package_name(&self) -> &str {
        match self {
            TypeNode::Message(m) => m.package_name(),
            TypeNode::Enum(e) => e.package_name(),
        }
    }

    /// Map entry messages only exist to model `map<K, V>` fields.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, TypeNode::Message(m) if m.is_map_entry())
    }
}

/// Pre-order walk over the declarations of one file: each message, then its
/// nested messages, then its nested enums; top-level enums come last.
#[derive(Debug, Clone)]
pub struct TypeWalk {
    stack: Vec<TypeNode>,
    include_synthetic: bool,
}

impl TypeWalk {
    fn new(file: &FileDescriptor, include_synthetic: bool) -> Self {
        let mut roots: Vec<TypeNode> = file
            .messages()
            .map(TypeNode::Message)
            .chain(file.enums().map(TypeNode::Enum))
            .collect();
        roots.reverse();
        TypeWalk {
            stack: roots,
            include_synthetic,
        }
    }
}

impl Iterator for TypeWalk {
    type Item = TypeNode;

    fn next(&mut self) -> Option<TypeNode> {
        loop {
            let node = self.stack.pop()?;
            if let TypeNode::Message(message) = &node {
                let children: Vec<TypeNode> = message
                    .child_messages()
                    .map(TypeNode::Message)
                    .chain(message.child_enums().map(TypeNode::Enum))
                    .collect();
                self.stack.extend(children.into_iter().rev());
            }
            if self.include_synthetic || !node.is_synthetic() {
                return Some(node);
            }
        }
    }
}

impl DescriptorRegistry {
    /// Resolve all file descriptors carried by `request`.
    pub fn from_request(request: &CodeGeneratorRequest) -> Result<Self> {
        let set = RawFileDescriptorSet {
            file: request.proto_file.clone(),
        };
        let pool = DescriptorPool::decode(set.encode_to_vec().as_slice())
            .map_err(|e| Error::RequestParse(e.to_string()))?;

        let mut files = Vec::with_capacity(request.proto_file.len());
        for bytes in &request.proto_file {
            let proto = prost_types::FileDescriptorProto::decode(bytes.as_slice())
                .map_err(|e| Error::RequestParse(format!("invalid file descriptor: {e}")))?;
            let name = proto.name();
            let file = pool.get_file_by_name(name).ok_or_else(|| {
                Error::RequestParse(format!("file \"{name}\" is missing from the descriptor pool"))
            })?;
            if !files.iter().any(|f: &FileDescriptor| f.name() == name) {
                files.push(file);
            }
        }

        for name in &request.file_to_generate {
            if !files.iter().any(|f| f.name() == name) {
                return Err(Error::RequestParse(format!(
                    "file to generate \"{name}\" has no descriptor in the request"
                )));
            }
        }

        tracing::debug!(files = files.len(), "descriptor registry built");
        Ok(DescriptorRegistry { files })
    }

    /// Every known file, in request order.
    pub fn all_files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn file_by_name(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name() == name)
    }

    /// Declarations of `file` to render, synthetic ones filtered out.
    pub fn visit_types(&self, file: &FileDescriptor) -> TypeWalk {
        TypeWalk::new(file, false)
    }

    /// Every declaration of `file`, synthetic ones included.
    pub fn all_types(&self, file: &FileDescriptor) -> TypeWalk {
        TypeWalk::new(file, true)
    }

    pub fn is_synthetic(&self, node: &TypeNode) -> bool {
        node.is_synthetic()
    }

    /// Whether any file in `in_files` other than `file` itself references a
    /// type declared in `file`, or sets a custom option declared in `file`.
    pub fn is_file_used(&self, file: &FileDescriptor, in_files: &[FileDescriptor]) -> bool {
        let target = file.name();
        in_files
            .iter()
            .filter(|user| user.name() != target)
            .any(|user| self.file_uses(user, target))
    }

    fn file_uses(&self, user: &FileDescriptor, target: &str) -> bool {
        if options_use_file(&user.options(), target) {
            return true;
        }

        for node in self.all_types(user) {
            let used = match &node {
                TypeNode::Message(message) => {
                    options_use_file(&message.options(), target)
                        || message.fields().any(|field| {
                            kind_declared_in(&field.kind(), target)
                                || options_use_file(&field.options(), target)
                        })
                        || message
                            .oneofs()
                            .any(|oneof| options_use_file(&oneof.options(), target))
                        || message
                            .child_extensions()
                            .any(|ext| kind_declared_in(&ext.kind(), target))
                }
                TypeNode::Enum(enumeration) => {
                    options_use_file(&enumeration.options(), target)
                        || enumeration
                            .values()
                            .any(|value| options_use_file(&value.options(), target))
                }
            };
            if used {
                return true;
            }
        }

        if user.extensions().any(|ext| kind_declared_in(&ext.kind(), target)) {
            return true;
        }

        user.services().any(|service| {
            options_use_file(&service.options(), target)
                || service.methods().any(|method| {
                    method.input().parent_file().name() == target
                        || method.output().parent_file().name() == target
                        || options_use_file(&method.options(), target)
                })
        })
    }
}

fn kind_declared_in(kind: &Kind, file_name: &str) -> bool {
    match kind {
        Kind::Message(message) => message.parent_file().name() == file_name,
        Kind::Enum(enumeration) => enumeration.parent_file().name() == file_name,
        _ => false,
    }
}

fn options_use_file(options: &DynamicMessage, file_name: &str) -> bool {
    options
        .extensions()
        .any(|(extension, _)| extension.parent_file().name() == file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        EnumBuilder, FileBuilder, MessageBuilder, OptionTarget, descriptor_proto, encode_with_option, request,
    };
    use prost_types::field_descriptor_proto::Type;

    fn registry(to_generate: &[&str], files: Vec<prost_types::FileDescriptorProto>) -> DescriptorRegistry {
        DescriptorRegistry::from_request(&request(to_generate, None, files)).unwrap()
    }

    #[test]
    fn files_keep_request_order() {
        let b = FileBuilder::new("b.proto", "pkg").build();
        let a = FileBuilder::new("a.proto", "pkg").import("b.proto").build();
        let registry = registry(&["a.proto"], vec![b, a]);
        let names: Vec<_> = registry.all_files().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["b.proto", "a.proto"]);
    }

    #[test]
    fn dangling_import_fails() {
        let a = FileBuilder::new("a.proto", "pkg").import("missing.proto").build();
        let err = DescriptorRegistry::from_request(&request(&["a.proto"], None, vec![a])).unwrap_err();
        assert!(matches!(err, Error::RequestParse(_)));
    }

    #[test]
    fn requested_file_without_descriptor_fails() {
        let a = FileBuilder::new("a.proto", "pkg").build();
        let err =
            DescriptorRegistry::from_request(&request(&["a.proto", "b.proto"], None, vec![a])).unwrap_err();
        match err {
            Error::RequestParse(reason) => assert!(reason.contains("b.proto")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn walk_is_pre_order_and_skips_map_entries() {
        let a = FileBuilder::new("a.proto", "pkg")
            .message(
                MessageBuilder::new("Outer")
                    .map_field("labels", 1, Type::String, Type::String, None)
                    .nested(MessageBuilder::new("Inner").nested_enum(EnumBuilder::new("Deep", &["DEEP_UNSPECIFIED"])))
                    .nested_enum(EnumBuilder::new("Kind", &["KIND_UNSPECIFIED"])),
            )
            .message(MessageBuilder::new("Second"))
            .enumeration(EnumBuilder::new("Top", &["TOP_UNSPECIFIED"]))
            .build();
        let registry = registry(&["a.proto"], vec![a]);
        let file = &registry.all_files()[0];

        let visited: Vec<_> = registry.visit_types(file).map(|n| n.full_name().to_string()).collect();
        assert_eq!(
            visited,
            [
                "pkg.Outer",
                "pkg.Outer.Inner",
                "pkg.Outer.Inner.Deep",
                "pkg.Outer.Kind",
                "pkg.Second",
                "pkg.Top"
            ]
        );

        let all: Vec<_> = registry.all_types(file).collect();
        assert_eq!(all.len(), visited.len() + 1);
        assert!(all.iter().any(|n| registry.is_synthetic(n) && n.full_name() == "pkg.Outer.LabelsEntry"));

        // restartable
        assert_eq!(registry.visit_types(file).count(), visited.len());
    }

    #[test]
    fn file_used_through_field_and_map_value() {
        let b = FileBuilder::new("b.proto", "dep")
            .message(MessageBuilder::new("B"))
            .build();
        let a = FileBuilder::new("a.proto", "pkg")
            .import("b.proto")
            .message(MessageBuilder::new("A").map_field("bs", 1, Type::String, Type::Message, Some(".dep.B")))
            .build();
        let registry = registry(&["a.proto"], vec![b, a]);
        let b = registry.file_by_name("b.proto").unwrap();
        let a = registry.file_by_name("a.proto").unwrap();

        assert!(registry.is_file_used(b, registry.all_files()));
        assert!(!registry.is_file_used(a, registry.all_files()));
        assert!(!registry.is_file_used(b, std::slice::from_ref(b)));
    }

    #[test]
    fn self_reference_does_not_count() {
        let a = FileBuilder::new("a.proto", "pkg")
            .message(MessageBuilder::new("Node").message_field("child", 1, ".pkg.Node"))
            .build();
        let registry = registry(&["a.proto"], vec![a]);
        let a = &registry.all_files()[0];
        assert!(!registry.is_file_used(a, registry.all_files()));
    }

    #[test]
    fn file_used_through_service_method() {
        let b = FileBuilder::new("b.proto", "dep")
            .message(MessageBuilder::new("Req"))
            .build();
        let a = FileBuilder::new("a.proto", "pkg")
            .import("b.proto")
            .service("Api", &[("Call", ".dep.Req", ".dep.Req")])
            .build();
        let registry = registry(&["a.proto"], vec![b, a]);
        let b = registry.file_by_name("b.proto").unwrap();
        assert!(registry.is_file_used(b, registry.all_files()));
    }

    const TABLE: u32 = 50001;
    const COLUMN: u32 = 50002;
    const EXCLUSIVE: u32 = 50003;

    /// `opts.proto` declares custom options; `a.proto` imports it and sets
    /// extension `number` on `target`, if given.
    fn option_user(option: Option<(OptionTarget, u32)>) -> DescriptorRegistry {
        let opts = FileBuilder::new("opts.proto", "opts")
            .import("google/protobuf/descriptor.proto")
            .extension(".google.protobuf.MessageOptions", "table", TABLE as i32, Type::Bool)
            .extension(".google.protobuf.FieldOptions", "column", COLUMN as i32, Type::Bool)
            .extension(".google.protobuf.OneofOptions", "exclusive", EXCLUSIVE as i32, Type::Bool)
            .build();
        let a = FileBuilder::new("a.proto", "pkg")
            .import("opts.proto")
            .message(MessageBuilder::new("Plain"))
            .message(
                MessageBuilder::new("Row")
                    .scalar("id", 1, Type::Int32)
                    .optional_scalar("note", 2, Type::String),
            )
            .build();

        let mut req = request(&["a.proto"], None, vec![descriptor_proto(), opts]);
        req.proto_file.push(match option {
            Some((target, number)) => encode_with_option(&a, target, number, 1),
            None => a.encode_to_vec(),
        });
        DescriptorRegistry::from_request(&req).unwrap()
    }

    fn opts_used(registry: &DescriptorRegistry) -> bool {
        let opts = registry.file_by_name("opts.proto").unwrap();
        registry.is_file_used(opts, registry.all_files())
    }

    #[test]
    fn importing_an_option_file_alone_is_not_use() {
        let registry = option_user(None);
        assert!(!opts_used(&registry));
        // extending an options message does not use descriptor.proto
        let descriptor = registry.file_by_name("google/protobuf/descriptor.proto").unwrap();
        assert!(!registry.is_file_used(descriptor, registry.all_files()));
    }

    #[test]
    fn file_used_through_message_option() {
        assert!(opts_used(&option_user(Some((OptionTarget::Message(1), TABLE)))));
    }

    #[test]
    fn file_used_through_field_option() {
        let registry = option_user(Some((OptionTarget::Field { message: 1, field: 1 }, COLUMN)));
        assert!(opts_used(&registry));

        // the re-encoded descriptor keeps declaration order
        let a = registry.file_by_name("a.proto").unwrap();
        let row = registry.visit_types(a).nth(1).unwrap();
        match row {
            TypeNode::Message(row) => {
                let fields: Vec<_> = row.fields().map(|f| f.name().to_string()).collect();
                assert_eq!(fields, ["id", "note"]);
            }
            TypeNode::Enum(e) => panic!("unexpected enum {}", e.full_name()),
        }
    }

    #[test]
    fn file_used_through_oneof_option() {
        assert!(opts_used(&option_user(Some((OptionTarget::Oneof { message: 1, oneof: 0 }, EXCLUSIVE)))));
    }
}
