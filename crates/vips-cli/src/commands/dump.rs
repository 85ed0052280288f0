//! Dump command.
//!
//! Writes the host-order bytes of a range of lines, to a file or stdout.

use crate::DumpArgs;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, Write};
use tracing::{debug, info};
use vips_io::OpenOptions;

/// Runs the dump command.
pub fn run(args: DumpArgs, options: &OpenOptions, verbose: bool) -> Result<()> {
    let image = super::open_image(&args.input, options)?;
    let height = image.header().height;

    if args.top > height {
        bail!("--top {} is past the last line ({})", args.top, height);
    }
    let count = args.lines.unwrap_or(height - args.top);

    debug!(
        "dumping lines {}..{} of {}",
        args.top,
        args.top as u64 + count as u64,
        args.input.display()
    );

    let region = image
        .lines(args.top, count)
        .with_context(|| format!("Failed to read lines from {}", args.input.display()))?;

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            file.write_all(&region)?;
            if verbose {
                info!("wrote {} bytes to {}", region.len(), path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&region)?;
            stdout.flush()?;
        }
    }

    drop(region);
    image.close()?;
    Ok(())
}
