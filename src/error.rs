//! Error types for a generation run.
//!
//! Every variant is fatal to the run that raised it. Nothing is retried and no
//! partial output is returned; the plugin binary reports the error back to
//! protoc through the response's `error` field.

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request envelope or one of its file descriptors could not be
    /// decoded, an import is dangling, or a requested file is missing.
    #[error("failed to parse code generator request: {0}")]
    RequestParse(String),

    /// The parameter string names an option this plugin does not know.
    #[error("unknown option \"{key}\", expected one of: {expected}")]
    UnknownOption { key: String, expected: String },

    /// A known flag was given a value other than `true` or `false`.
    #[error("invalid value \"{value}\" for option \"{key}\", expected true or false")]
    InvalidOptionValue { key: String, value: String },

    /// Two different registrations resolve to the same output path.
    #[error("output name \"{name}\" requested by {requested} is already taken by {existing}")]
    NameCollision {
        name: String,
        existing: String,
        requested: String,
    },

    /// A registration key was registered again under a different name.
    #[error("{key} is already registered as \"{existing}\", cannot register it as \"{requested}\"")]
    DuplicateRegistration {
        key: String,
        existing: String,
        requested: String,
    },

    /// A name was looked up before it was registered.
    #[error("no output name registered for {key}")]
    NotRegistered { key: String },

    /// A per-kind generator failed while rendering a declaration.
    #[error("failed to generate {type_name} in {file}: {reason}")]
    Generator {
        file: String,
        type_name: String,
        reason: String,
    },
}
