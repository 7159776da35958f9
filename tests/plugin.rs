use prost::Message;
use prost_types::FileDescriptorProto;
use prost_types::field_descriptor_proto::Type;

use protoc_gen_jsontypes::test_utils::{
    EnumBuilder, FileBuilder, MessageBuilder, OptionTarget, descriptor_proto, encode_with_option, request,
};
use protoc_gen_jsontypes::{CodeGeneratorRequest, Error, OutFile, SUPPORTED_FEATURES, generate, respond};

fn names(files: &[OutFile]) -> Vec<&str> {
    files.iter().map(|f| f.name()).collect()
}

/// `a.proto` uses `B` from `b.proto`.
fn a_imports_b() -> Vec<FileDescriptorProto> {
    let b = FileBuilder::new("b.proto", "dep")
        .message(MessageBuilder::new("B").scalar("id", 1, Type::Int64))
        .build();
    let a = FileBuilder::new("a.proto", "app")
        .import("b.proto")
        .message(MessageBuilder::new("A").message_field("b", 1, ".dep.B"))
        .build();
    vec![b, a]
}

/// `c.proto` declares a custom file option; `a.proto` imports it.
/// With `use_option`, `a.proto` sets the option.
fn a_imports_option_file(use_option: bool) -> CodeGeneratorRequest {
    let c = FileBuilder::new("c.proto", "opts")
        .import("google/protobuf/descriptor.proto")
        .extension(".google.protobuf.FileOptions", "generated_by", 50000, Type::Bool)
        .build();
    let a = FileBuilder::new("a.proto", "app")
        .import("c.proto")
        .message(MessageBuilder::new("A").scalar("id", 1, Type::Int32))
        .build();

    let mut req = request(&["a.proto"], Some("generate_dependencies"), vec![descriptor_proto(), c]);
    if use_option {
        req.proto_file.push(encode_with_option(&a, OptionTarget::File, 50000, 1));
    } else {
        req.proto_file.push(a.encode_to_vec());
    }
    req
}

#[test]
fn only_requested_files_by_default() {
    let out = generate(&request(&["a.proto"], None, a_imports_b())).unwrap();
    assert_eq!(names(&out), ["a.ts"]);

    let content = out[0].content();
    assert!(content.contains("import type { B } from \"./b\";\n"));
    assert!(content.contains("    b?: B;\n"));
}

#[test]
fn generate_dependencies_keeps_used_imports() {
    let out = generate(&request(&["a.proto"], Some("generate_dependencies"), a_imports_b())).unwrap();
    assert_eq!(names(&out), ["b.ts", "a.ts"]);
    assert!(out[0].content().contains("export interface B {\n"));
    assert!(out[0].content().contains("    id?: string;\n"));
}

#[test]
fn option_only_imports_are_dropped() {
    let out = generate(&a_imports_option_file(false)).unwrap();
    assert_eq!(names(&out), ["a.ts"]);
}

#[test]
fn explicitly_requested_option_file_is_kept() {
    let mut req = a_imports_option_file(false);
    req.file_to_generate.push("c.proto".into());
    let out = generate(&req).unwrap();
    assert_eq!(names(&out), ["c.ts", "a.ts"]);
}

#[test]
fn option_file_whose_option_is_set_counts_as_used() {
    let out = generate(&a_imports_option_file(true)).unwrap();
    assert_eq!(names(&out), ["c.ts", "a.ts"]);
}

#[test]
fn option_set_on_a_message_counts_as_used() {
    let c = FileBuilder::new("c.proto", "opts")
        .import("google/protobuf/descriptor.proto")
        .extension(".google.protobuf.MessageOptions", "table", 50001, Type::Bool)
        .build();
    let a = FileBuilder::new("a.proto", "app")
        .import("c.proto")
        .message(MessageBuilder::new("A").scalar("id", 1, Type::Int32))
        .build();
    let mut req = request(&["a.proto"], Some("generate_dependencies"), vec![descriptor_proto(), c]);
    req.proto_file.push(encode_with_option(&a, OptionTarget::Message(0), 50001, 1));

    let out = generate(&req).unwrap();
    assert_eq!(names(&out), ["c.ts", "a.ts"]);
}

#[test]
fn option_file_is_gated_by_the_request_list_first() {
    let mut req = a_imports_option_file(true);
    req.parameter = None;
    let out = generate(&req).unwrap();
    assert_eq!(names(&out), ["a.ts"]);
}

#[test]
fn name_collision_fails_before_generation() {
    // "a.proto" reserves "a.server.ts", the main output of "a.server.proto"
    let a = FileBuilder::new("a.proto", "pkg")
        .message(MessageBuilder::new("A"))
        .build();
    let server = FileBuilder::new("a.server.proto", "pkg")
        .message(MessageBuilder::new("S"))
        .build();
    let err = generate(&request(&["a.proto", "a.server.proto"], None, vec![a, server])).unwrap_err();
    match err {
        Error::NameCollision {
            name,
            existing,
            requested,
        } => {
            assert_eq!(name, "a.server.ts");
            assert!(existing.contains("a.server.proto"));
            assert!(requested.contains("generic-server"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_option_aborts_the_run() {
    let err = generate(&request(&["a.proto"], Some("generate_dependencies,bogus"), a_imports_b())).unwrap_err();
    assert!(matches!(err, Error::UnknownOption { ref key, .. } if key == "bogus"));
}

#[test]
fn dangling_import_aborts_the_run() {
    let a = FileBuilder::new("a.proto", "app").import("nowhere.proto").build();
    let err = generate(&request(&["a.proto"], None, vec![a])).unwrap_err();
    assert!(matches!(err, Error::RequestParse(_)));
}

#[test]
fn generator_errors_abort_the_run() {
    let a = FileBuilder::new("a.proto", "pkg")
        .message(MessageBuilder::new("Outer").nested(MessageBuilder::new("Inner")))
        .message(MessageBuilder::new("Outer_Inner"))
        .build();
    let err = generate(&request(&["a.proto"], None, vec![a])).unwrap_err();
    match err {
        Error::Generator { file, type_name, .. } => {
            assert_eq!(file, "a.proto");
            assert_eq!(type_name, "pkg.Outer_Inner");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn map_entries_are_never_rendered() {
    let a = FileBuilder::new("a.proto", "pkg")
        .message(
            MessageBuilder::new("Inventory")
                .map_field("stock", 1, Type::String, Type::Int32, None)
                .map_field("items", 2, Type::String, Type::Message, Some(".pkg.Item")),
        )
        .message(MessageBuilder::new("Item"))
        .build();
    let out = generate(&request(&["a.proto"], None, vec![a])).unwrap();
    let content = out[0].content();
    assert!(!content.contains("StockEntry"));
    assert!(!content.contains("ItemsEntry"));
    assert_eq!(content.matches("export interface").count(), 2);
    assert!(content.contains("    items?: { [key: string]: Item };\n"));
}

#[test]
fn output_is_deterministic() {
    let files = || {
        let mut files = a_imports_b();
        files.push(
            FileBuilder::new("z/extra.proto", "extra")
                .import("a.proto")
                .import("b.proto")
                .message(MessageBuilder::new("Z").message_field("a", 1, ".app.A").map_field(
                    "by_name",
                    2,
                    Type::String,
                    Type::Message,
                    Some(".dep.B"),
                ))
                .enumeration(EnumBuilder::new("Flavor", &["FLAVOR_UNSPECIFIED", "SWEET"]))
                .build(),
        );
        files
    };
    let run = || {
        generate(&request(&["z/extra.proto"], Some("generate_dependencies"), files()))
            .unwrap()
            .iter()
            .map(|f| (f.name().to_string(), f.content()))
            .collect::<Vec<_>>()
    };
    let first = run();
    assert_eq!(first, run());
    let names: Vec<_> = first.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["b.ts", "a.ts", "z/extra.ts"]);
    assert!(first[2].1.contains("import type { A } from \"../a\";\n"));
    assert!(first[2].1.contains("import type { B } from \"../b\";\n"));
}

#[test]
fn surviving_files_are_requested_or_used() {
    // c.proto is imported but nothing of it is referenced
    let c = FileBuilder::new("c.proto", "unused")
        .message(MessageBuilder::new("C"))
        .build();
    let mut files = a_imports_b();
    files.insert(0, c);
    files[2].dependency.push("c.proto".into());

    let out = generate(&request(&["a.proto"], Some("generate_dependencies"), files)).unwrap();
    assert_eq!(names(&out), ["b.ts", "a.ts"]);
}

#[test]
fn respond_advertises_proto3_optional() {
    let req = request(&["a.proto"], None, a_imports_b());
    let response = respond(&req.encode_to_vec());
    assert_eq!(response.error, None);
    assert_eq!(response.supported_features, Some(SUPPORTED_FEATURES));
    assert_eq!(response.file.len(), 1);
    assert_eq!(response.file[0].name(), "a.ts");
    assert!(response.file[0].content().starts_with("// @generated by protoc-gen-jsontypes "));
}

#[test]
fn respond_reports_errors_without_files() {
    let req = request(&["a.proto"], Some("nope"), a_imports_b());
    let response = respond(&req.encode_to_vec());
    assert!(response.file.is_empty());
    assert!(response.error.unwrap().contains("nope"));
}
