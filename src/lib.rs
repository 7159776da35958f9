//! protoc plugin emitting TypeScript types for the protobuf JSON mapping.
//!
//! The interesting part is not the printing of declarations but deciding which
//! outputs exist: every known file gets a collision-free set of output names,
//! every file is rendered, and the result is pruned down to what protoc asked
//! for.

pub mod codegen;
pub mod error;
pub mod options;
pub mod registry;
pub mod request;
pub mod test_utils;

pub use codegen::generate;
pub use codegen::out_file::OutFile;
pub use error::{Error, Result};
pub use options::PluginOptions;
pub use request::{CodeGeneratorRequest, SUPPORTED_FEATURES};

use prost_types::compiler::CodeGeneratorResponse;

/// Decode a serialized request, run the generator and wrap the outcome in
/// the response protoc expects. Failures end up in the response's `error`.
pub fn respond(request_bytes: &[u8]) -> CodeGeneratorResponse {
    let result = CodeGeneratorRequest::from_bytes(request_bytes).and_then(|request| generate(&request));
    if let Err(e) = &result {
        tracing::error!("generation failed: {e}");
    }
    request::into_response(result)
}
