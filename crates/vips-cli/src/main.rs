//! vips - inspect VIPS native image files
//!
//! Prints headers, history and metadata, and dumps pixel lines in host
//! byte order.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vips_io::OpenOptions;

mod commands;

#[derive(Parser)]
#[command(name = "vips")]
#[command(author, version, about = "Inspect VIPS native image files")]
#[command(long_about = "
Reads VIPS .v files: fixed header, XML history and metadata, pixel data.

Examples:
  vips header image.v                  # Show header
  vips info a.v b.v --all              # Header, history and metadata
  vips header big.v --header-only      # Decode the header, nothing else
  vips dump image.v --top 10 -n 5 -o lines.raw
  vips --mmap-limit 0 dump image.v     # Force windowed access
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Map files whole below this many bytes (overrides VIPS_MMAP_LIMIT)
    #[arg(long, global = true, value_name = "BYTES")]
    mmap_limit: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, history and metadata
    #[command(visible_alias = "info")]
    Header(HeaderArgs),

    /// Write host-order pixel bytes of a line range
    Dump(DumpArgs),
}

#[derive(Args)]
struct HeaderArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Show history and all metadata fields
    #[arg(short, long)]
    all: bool,

    /// Decode the header only: no metadata, no mapping
    #[arg(long)]
    header_only: bool,
}

#[derive(Args)]
struct DumpArgs {
    /// Input image
    input: PathBuf,

    /// First line
    #[arg(short, long, default_value = "0")]
    top: u32,

    /// Number of lines (default: to the bottom of the image)
    #[arg(short = 'n', long)]
    lines: Option<u32>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "vips_io=debug,vips_cli=debug"
    } else {
        "vips_io=warn,vips_cli=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_options(cli: &Cli) -> OpenOptions {
    let mut options = OpenOptions::from_env();
    if let Some(limit) = cli.mmap_limit {
        options.mmap_threshold = limit;
    }
    options
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let options = open_options(&cli);

    match cli.command {
        Commands::Header(args) => commands::header::run(args, &options, cli.verbose),
        Commands::Dump(args) => commands::dump::run(args, &options, cli.verbose),
    }
}
