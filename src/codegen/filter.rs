// Output filter
//
// The candidate set holds one output per known file. Two prunes run in a
// fixed order: the explicit-request gate, then custom-option suppression
// evaluated against the survivors of the first prune.

use prost_reflect::FileDescriptor;

use super::out_file::OutFile;
use crate::options::PluginOptions;
use crate::registry::DescriptorRegistry;

pub fn filter_out_files(
    mut out_files: Vec<OutFile>,
    file_to_generate: &[String],
    options: &PluginOptions,
    registry: &DescriptorRegistry,
) -> Vec<OutFile> {
    let requested = |out: &OutFile| file_to_generate.iter().any(|f| f == out.source().name());

    // plugins only return the files they were asked for, unless
    // "generate_dependencies" is set
    if !options.generate_dependencies {
        out_files.retain(|out| {
            let keep = requested(out);
            if !keep {
                tracing::debug!(file = out.name(), "dropped: not requested");
            }
            keep
        });
    }

    // files imported only to declare or use custom options are not emitted,
    // unless explicitly requested
    let survivors: Vec<FileDescriptor> = out_files.iter().map(|out| out.source().clone()).collect();
    out_files.retain(|out| {
        let keep = requested(out) || registry.is_file_used(out.source(), &survivors);
        if !keep {
            tracing::debug!(file = out.name(), "dropped: not used by any emitted file");
        }
        keep
    });

    out_files
}
