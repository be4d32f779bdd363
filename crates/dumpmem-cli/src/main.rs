//! dumpmem: inspect captured process memory in crash dump snapshots.
//!
//! Reads go through the uncached segment reader. Data is written to stdout,
//! diagnostics to stderr.

mod commands;
mod hexdump;
mod segments;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dumpmem", version, about = "Read memory out of crash dump snapshots")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Read memory at a virtual address
    Read {
        /// Snapshot file
        image: PathBuf,
        /// JSON segment table (array of {virtual_address, size, file_offset})
        #[arg(long)]
        segments: PathBuf,
        #[arg(long, value_parser = segments::parse_number)]
        address: u64,
        #[arg(long, value_parser = segments::parse_number, default_value = "64")]
        length: u64,
        /// Pointer width of the captured process (4 or 8)
        #[arg(long, default_value_t = 8)]
        pointer_size: u32,
    },
    /// Read raw snapshot bytes at a file offset
    Rva {
        image: PathBuf,
        #[arg(long, value_parser = segments::parse_number)]
        offset: u64,
        #[arg(long, value_parser = segments::parse_number, default_value = "64")]
        length: u64,
    },
    /// Show which segment contains an address
    Locate {
        #[arg(long)]
        segments: PathBuf,
        #[arg(long, value_parser = segments::parse_number)]
        address: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();

    match cli.cmd {
        Cmd::Read {
            image,
            segments,
            address,
            length,
            pointer_size,
        } => commands::cmd_read(&mut out, &image, &segments, address, length, pointer_size),
        Cmd::Rva {
            image,
            offset,
            length,
        } => commands::cmd_rva(&mut out, &image, offset, length),
        Cmd::Locate { segments, address } => commands::cmd_locate(&mut out, &segments, address),
    }
}
