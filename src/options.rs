//! Plugin options parsed from the request's parameter string.

use crate::error::{Error, Result};

/// Typed view of the parameter string. Parsed once per run and passed by
/// reference to every stage that needs it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PluginOptions {
    /// Render fields without explicit presence as required properties.
    pub emit_default_values: bool,
    /// Represent enum values by number instead of by name.
    pub enum_as_integer: bool,
    /// Use the proto field name instead of the lowerCamelCase JSON name.
    pub use_proto_field_name: bool,
    /// Emit every file reached through imports, not only the requested ones.
    pub generate_dependencies: bool,
}

impl PluginOptions {
    /// Recognized keys and their descriptions, in the order `--help` lists them.
    pub const KNOWN: &'static [(&'static str, &'static str)] = &[
        (
            "emit_default_values",
            "Fields without explicit presence are always present in the JSON \n\
             produced by the emitter, so render them as required properties.",
        ),
        (
            "enum_as_integer",
            "Enum values are written as numbers instead of names.",
        ),
        (
            "use_proto_field_name",
            "Use the field name from the .proto file instead of the lowerCamelCase \n\
             JSON name.",
        ),
        (
            "generate_dependencies",
            "By default, only the PROTO_FILES passed as input to protoc are generated, \n\
             not the files they import. Set this option to generate code for dependencies \n\
             too.",
        ),
    ];

    /// Parse a comma separated list of `key` or `key=true|false` entries.
    pub fn parse(parameter: Option<&str>) -> Result<Self> {
        let mut options = Self::default();
        let Some(parameter) = parameter else {
            return Ok(options);
        };

        for entry in parameter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (entry, None),
            };
            let enabled = match value {
                None | Some("true") => true,
                Some("false") => false,
                Some(other) => {
                    if !Self::is_known(key) {
                        return Err(unknown(key));
                    }
                    return Err(Error::InvalidOptionValue {
                        key: key.to_string(),
                        value: other.to_string(),
                    });
                }
            };
            let flag = match key {
                "emit_default_values" => &mut options.emit_default_values,
                "enum_as_integer" => &mut options.enum_as_integer,
                "use_proto_field_name" => &mut options.use_proto_field_name,
                "generate_dependencies" => &mut options.generate_dependencies,
                _ => return Err(unknown(key)),
            };
            *flag = enabled;
        }

        Ok(options)
    }

    fn is_known(key: &str) -> bool {
        Self::KNOWN.iter().any(|(known, _)| *known == key)
    }
}

fn unknown(key: &str) -> Error {
    let expected = PluginOptions::KNOWN
        .iter()
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join(", ");
    Error::UnknownOption {
        key: key.to_string(),
        expected,
    }
}
