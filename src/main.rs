use std::fs;
use std::io::{self, Read, Write};

use anyhow::Context;
use prost::Message;
use protoc_gen_jsontypes::PluginOptions;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<_> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("protoc-gen-jsontypes");

    match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => {
            print_usage(program);
            return Ok(());
        }
        Some("--version") => {
            println!("protoc-gen-jsontypes {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Read the CodeGeneratorRequest
    let request_bytes = match args.get(1).map(String::as_str) {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("couldn't read request from stdin")?;
            buf
        }
        Some(path) => fs::read(path).with_context(|| format!("couldn't read request from {path}"))?,
    };
    tracing::debug!(bytes = request_bytes.len(), "read request");

    let response = protoc_gen_jsontypes::respond(&request_bytes);
    for file in &response.file {
        tracing::info!(file = file.name(), "generated");
    }

    let mut output = Vec::new();
    response
        .encode(&mut output)
        .context("couldn't encode CodeGeneratorResponse")?;
    io::stdout()
        .write_all(&output)
        .context("couldn't write response to stdout")?;
    Ok(())
}

// stdout carries the plugin protocol, logs go to stderr
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_usage(program: &str) {
    eprintln!("protoc-gen-jsontypes: TypeScript types for the protobuf JSON mapping");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  protoc --plugin={program} --jsontypes_out=<dir> [--jsontypes_opt=<options>] PROTO_FILES");
    eprintln!("  {program} <request.bin>     read a serialized CodeGeneratorRequest from a file");
    eprintln!();
    eprintln!("OPTIONS:");
    for (key, description) in PluginOptions::KNOWN {
        eprintln!("  {key}");
        for line in description.lines() {
            eprintln!("      {}", line.trim());
        }
    }
    eprintln!();
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to log to stderr.");
}
