//! The protoc plugin envelope.
//!
//! `prost_types::compiler::CodeGeneratorRequest` decodes `proto_file` into
//! `prost_types::FileDescriptorProto`, which drops extension fields set on
//! option messages. The request here keeps each file descriptor as raw bytes so
//! custom option values survive until the descriptor pool decodes them.

use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::CodeGeneratorResponse;

use crate::codegen::out_file::OutFile;
use crate::error::{Error, Result};

/// Capabilities advertised to protoc: proto3 `optional` fields are supported.
pub const SUPPORTED_FEATURES: u64 = Feature::Proto3Optional as u64;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CodeGeneratorRequest {
    /// Files explicitly passed to protoc.
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: ::prost::alloc::vec::Vec<String>,
    /// Raw plugin parameter string.
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    /// Encoded `FileDescriptorProto`s, dependencies before dependents.
    #[prost(bytes, repeated, tag = "15")]
    pub proto_file: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub(crate) struct RawFileDescriptorSet {
    #[prost(bytes, repeated, tag = "1")]
    pub file: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

impl CodeGeneratorRequest {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes).map_err(|e| {
            Error::RequestParse(format!(
                "{e}; make sure protoc-gen-jsontypes is invoked as a protoc plugin"
            ))
        })
    }

    pub fn is_requested(&self, file_name: &str) -> bool {
        self.file_to_generate.iter().any(|f| f == file_name)
    }
}

/// Build the response protoc expects from the outcome of a run.
pub fn into_response(result: Result<Vec<OutFile>>) -> CodeGeneratorResponse {
    match result {
        Ok(files) => CodeGeneratorResponse {
            supported_features: Some(SUPPORTED_FEATURES),
            file: files
                .iter()
                .map(|out| File {
                    name: Some(out.name().to_string()),
                    content: Some(out.content()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        },
        Err(e) => CodeGeneratorResponse {
            error: Some(e.to_string()),
            supported_features: Some(SUPPORTED_FEATURES),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_parse_error() {
        let err = CodeGeneratorRequest::from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, Error::RequestParse(_)));
    }

    #[test]
    fn error_response_carries_message_and_features() {
        let response = into_response(Err(Error::NotRegistered {
            key: "file \"a.proto\" (main)".into(),
        }));
        assert!(response.file.is_empty());
        assert_eq!(response.supported_features, Some(SUPPORTED_FEATURES));
        assert!(response.error.unwrap().contains("a.proto"));
    }

    #[test]
    fn requested_files_match_literally() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["pkg/a.proto".into()],
            ..Default::default()
        };
        assert!(request.is_requested("pkg/a.proto"));
        assert!(!request.is_requested("a.proto"));
    }
}
