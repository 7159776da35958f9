// Output naming table
//
// Every (input file, output kind) pair that may ever be emitted gets its
// output path here before any generator runs, so generators can resolve the
// output path of another file when writing an import.

use std::collections::HashMap;
use std::fmt;

use super::names::strip_source_suffix;
use crate::error::{Error, Result};

/// Flavor of output an input file may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    Main,
    GenericServer,
    Grpc1Server,
    Client,
    PromiseClient,
    RxClient,
    Grpc1Client,
}

impl OutputKind {
    pub const ALL: [OutputKind; 7] = [
        OutputKind::Main,
        OutputKind::GenericServer,
        OutputKind::Grpc1Server,
        OutputKind::Client,
        OutputKind::PromiseClient,
        OutputKind::RxClient,
        OutputKind::Grpc1Client,
    ];

    /// Appended to the stripped input path.
    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Main => ".ts",
            OutputKind::GenericServer => ".server.ts",
            OutputKind::Grpc1Server => ".grpc-server.ts",
            OutputKind::Client => ".client.ts",
            OutputKind::PromiseClient => ".promise-client.ts",
            OutputKind::RxClient => ".rx-client.ts",
            OutputKind::Grpc1Client => ".grpc-client.ts",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Main => "main",
            OutputKind::GenericServer => "generic-server",
            OutputKind::Grpc1Server => "grpc1-server",
            OutputKind::Client => "client",
            OutputKind::PromiseClient => "promise-client",
            OutputKind::RxClient => "rx-client",
            OutputKind::Grpc1Client => "grpc1-client",
        }
    }

    /// Output path of `file_name` for this kind.
    pub fn output_name(self, file_name: &str) -> String {
        format!("{}{}", strip_source_suffix(file_name), self.suffix())
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    file: String,
    kind: OutputKind,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file \"{}\" ({})", self.file, self.kind)
    }
}

/// Registration key to output name, unique in both directions. Lives for one
/// generation run.
#[derive(Debug, Default)]
pub struct FileTable {
    names: HashMap<Key, String>,
    owners: HashMap<String, Key>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as the output of `file` for `kind`.
    ///
    /// Registering the same triple again is a no-op.
    pub fn register(&mut self, name: impl Into<String>, file: &str, kind: OutputKind) -> Result<()> {
        let name = name.into();
        let key = Key {
            file: file.to_string(),
            kind,
        };

        if let Some(owner) = self.owners.get(&name) {
            if *owner == key {
                return Ok(());
            }
            return Err(Error::NameCollision {
                name,
                existing: owner.to_string(),
                requested: key.to_string(),
            });
        }
        if let Some(existing) = self.names.get(&key) {
            return Err(Error::DuplicateRegistration {
                key: key.to_string(),
                existing: existing.clone(),
                requested: name,
            });
        }

        tracing::trace!(%key, %name, "registered output name");
        self.owners.insert(name.clone(), key.clone());
        self.names.insert(key, name);
        Ok(())
    }

    /// Register every output kind of `file` under the fixed naming convention.
    pub fn register_all_kinds<'a>(&mut self, files: impl IntoIterator<Item = &'a str> + Clone) -> Result<()> {
        for file in files.clone() {
            self.register(OutputKind::Main.output_name(file), file, OutputKind::Main)?;
        }
        for file in files {
            for kind in OutputKind::ALL.into_iter().skip(1) {
                self.register(kind.output_name(file), file, kind)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, file: &str, kind: OutputKind) -> Result<&str> {
        let key = Key {
            file: file.to_string(),
            kind,
        };
        self.names
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| Error::NotRegistered { key: key.to_string() })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
