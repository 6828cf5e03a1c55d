use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use tracefile::{open_for_read, open_for_write, AnyFile, Format, Offset, WriteOptions};

const COPY_BUF_LEN: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "tracefile")]
#[command(about = "Inspect and re-encode compressed trace files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the format of a trace and walk its stream
    Info {
        path: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// List the offset of every chunk (chunked formats only)
        #[arg(long)]
        chunks: bool,
    },
    /// Re-encode a trace under another backend
    Repack {
        input: PathBuf,

        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Snappy)]
        format: Format,

        /// Uncompressed bytes per chunk (default 1 MiB)
        #[arg(long, default_value_t = 1_048_576)]
        chunk_size: usize,
    },
}

#[derive(Serialize)]
struct InfoReport {
    path: PathBuf,
    format: Format,
    supports_offsets: bool,
    compressed_len: u64,
    uncompressed_len: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<Vec<Offset>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { path, json, chunks } => {
            let report = info(&path, chunks)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Repack {
            input,
            output,
            format,
            chunk_size,
        } => {
            let options = WriteOptions::default().with_chunk_size(chunk_size);
            let copied = repack(&input, &output, format, options)?;
            info!(
                "repacked {} -> {} ({} bytes, {})",
                input.display(),
                output.display(),
                copied,
                format
            );
        }
    }

    Ok(())
}

fn info(path: &Path, list_chunks: bool) -> Result<InfoReport> {
    let compressed_len = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let mut file = open_for_read(path).with_context(|| format!("open {}", path.display()))?;
    let supports_offsets = file.supports_offsets();

    let mut chunks = (list_chunks && supports_offsets).then(Vec::new);
    let mut buf = vec![0u8; COPY_BUF_LEN];
    let mut uncompressed_len = 0u64;
    loop {
        let n = file.read_some(&mut buf).context("decode input")?;
        if n == 0 {
            break;
        }
        uncompressed_len += n as u64;
        if let Some(chunks) = chunks.as_mut() {
            // Reads stop at chunk boundaries, so the offset names the chunk
            // these bytes came from.
            let chunk = file.current_offset().chunk;
            if chunks.last().map(|last: &Offset| last.chunk) != Some(chunk) {
                chunks.push(Offset::new(chunk, 0));
            }
        }
    }

    Ok(InfoReport {
        path: path.to_path_buf(),
        format: file.format(),
        supports_offsets,
        compressed_len,
        uncompressed_len,
        chunks,
    })
}

fn repack(input: &Path, output: &Path, format: Format, options: WriteOptions) -> Result<u64> {
    let mut source = open_for_read(input).with_context(|| format!("open {}", input.display()))?;
    if source.format() == format {
        info!("{} is already {format}; re-encoding anyway", input.display());
    }
    let mut sink = open_for_write(output, format, options)
        .with_context(|| format!("create {}", output.display()))?;
    let copied = pump(&mut source, |bytes| {
        sink.write(bytes).context("write output")?;
        Ok(())
    })?;
    sink.flush().context("flush output")?;
    sink.close();
    Ok(copied)
}

/// Drains `file` through `sink` in buffers of up to `COPY_BUF_LEN` bytes.
fn pump(file: &mut AnyFile, mut sink: impl FnMut(&[u8]) -> Result<()>) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUF_LEN];
    let mut total = 0u64;
    loop {
        let n = file.read_some(&mut buf).context("decode input")?;
        if n == 0 {
            break;
        }
        total += n as u64;
        sink(&buf[..n])?;
    }
    Ok(total)
}

fn print_report(report: &InfoReport) {
    println!("path:             {}", report.path.display());
    println!("format:           {}", report.format);
    println!("supports offsets: {}", report.supports_offsets);
    println!("compressed:       {} bytes", report.compressed_len);
    println!("uncompressed:     {} bytes", report.uncompressed_len);
    if let Some(chunks) = &report.chunks {
        println!("chunks:           {}", chunks.len());
        for offset in chunks {
            println!("  chunk @ {}", offset.chunk);
        }
    }
}
