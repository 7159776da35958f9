// Output path and TypeScript identifier derivation

/// Suffix every input file name is expected to carry.
pub const SOURCE_SUFFIX: &str = ".proto";

/// Global objects a generated type must not shadow.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Object", "Array", "String", "Number", "Boolean", "Symbol", "BigInt", "Function", "Date",
    "RegExp", "Error", "Promise", "Map", "Set", "WeakMap", "WeakSet", "JSON", "Math", "Record",
    "Partial", "Required", "Readonly", "Pick", "Omit", "Uint8Array", "ArrayBuffer", "Infinity",
    "NaN", "undefined", "globalThis",
];

/// Strip the source suffix from an input path. Paths without the suffix are
/// used as is.
pub fn strip_source_suffix(path: &str) -> &str {
    path.strip_suffix(SOURCE_SUFFIX).unwrap_or(path)
}

/// TypeScript name for a declaration: the full name relative to its package,
/// nested segments joined with `_`.
pub fn type_name(full_name: &str, package: &str) -> String {
    let relative = if package.is_empty() {
        full_name
    } else {
        full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name)
    };
    escape_type_name(relative.replace('.', "_"))
}

pub fn escape_type_name(name: String) -> String {
    if RESERVED_TYPE_NAMES.contains(&name.as_str()) {
        format!("{name}$")
    } else {
        name
    }
}

/// Convert snake_case to PascalCase (map entry names)
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// protoc's default `json_name`: underscores dropped, the following letter
/// upper-cased.
pub fn to_lower_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Property key as written in an interface body. JSON names that are not
/// plain identifiers are quoted.
pub fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if is_identifier {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Module specifier that imports output `to` from output `from`, both
/// relative to the output root, e.g. `"../other/b"`.
pub fn relative_module(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to = to.strip_suffix(".ts").unwrap_or(to);
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count()
        // the last segment of `to` is the file itself
        .min(to_parts.len() - 1);

    let ups = from_dir.len() - common;
    let rest = to_parts[common..].join("/");
    if ups == 0 {
        format!("./{rest}")
    } else {
        format!("{}{rest}", "../".repeat(ups))
    }
}
