// Comment extraction from SourceCodeInfo
//
// Builds a map from dotted name paths (relative to the package) to comment
// strings by walking the numeric paths in SourceCodeInfo.Location, and renders
// JSDoc blocks for the generators.

use std::collections::HashMap;

use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};

// Field numbers in descriptor.proto
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;
const ENUM_VALUE: i32 = 2;

/// Extract comments from a FileDescriptorProto's source_code_info.
/// Returns a map from dotted name path (e.g., "MyMessage.my_field") to comment string.
pub fn extract_comments(file: &FileDescriptorProto) -> HashMap<String, String> {
    let mut comments = HashMap::new();

    let Some(source_code_info) = &file.source_code_info else {
        return comments;
    };

    for location in &source_code_info.location {
        // Prefer leading, fall back to trailing
        let Some(comment) = location
            .leading_comments
            .as_deref()
            .or(location.trailing_comments.as_deref())
        else {
            continue;
        };

        if let Some(name_path) = resolve_path(file, &location.path) {
            let trimmed = trim_comment(comment);
            if !trimmed.is_empty() {
                comments.insert(name_path, trimmed);
            }
        }
    }

    comments
}

/// Resolve a location path that ends exactly on a message, field, enum or
/// enum value. Paths into names, types, options etc. resolve to `None`.
fn resolve_path(file: &FileDescriptorProto, path: &[i32]) -> Option<String> {
    let mut parts = Vec::new();
    match path {
        [FILE_MESSAGE_TYPE, index, rest @ ..] => {
            message_path(file.message_type.get(*index as usize)?, rest, &mut parts)?
        }
        [FILE_ENUM_TYPE, index, rest @ ..] => {
            enum_path(file.enum_type.get(*index as usize)?, rest, &mut parts)?
        }
        _ => return None,
    }
    Some(parts.join("."))
}

fn message_path<'a>(message: &'a DescriptorProto, rest: &[i32], parts: &mut Vec<&'a str>) -> Option<()> {
    parts.push(message.name());
    match rest {
        [] => Some(()),
        [MESSAGE_FIELD, index] => {
            parts.push(message.field.get(*index as usize)?.name());
            Some(())
        }
        [MESSAGE_NESTED_TYPE, index, rest @ ..] => {
            message_path(message.nested_type.get(*index as usize)?, rest, parts)
        }
        [MESSAGE_ENUM_TYPE, index, rest @ ..] => {
            enum_path(message.enum_type.get(*index as usize)?, rest, parts)
        }
        _ => None,
    }
}

fn enum_path<'a>(enumeration: &'a EnumDescriptorProto, rest: &[i32], parts: &mut Vec<&'a str>) -> Option<()> {
    parts.push(enumeration.name());
    match rest {
        [] => Some(()),
        [ENUM_VALUE, index] => {
            parts.push(enumeration.value.get(*index as usize)?.name());
            Some(())
        }
        _ => None,
    }
}

/// Trim and clean up a comment string.
fn trim_comment(comment: &str) -> String {
    comment
        .lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Render a JSDoc block: the comment, a blank separator line, then tags.
pub fn doc_block(indent: &str, comment: Option<&str>, tags: &[String]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    if let Some(comment) = comment {
        lines.extend(comment.lines());
        if !tags.is_empty() {
            lines.push("");
        }
    }
    lines.extend(tags.iter().map(String::as_str));

    let mut out = format!("{indent}/**\n");
    for line in lines {
        let line = line.replace("*/", "*\\/");
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}
