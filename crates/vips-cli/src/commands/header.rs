//! Header command (alias `info`).
//!
//! Prints the decoded header of each file, how it was opened, and with
//! `--all` its history and typed metadata.

use crate::HeaderArgs;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use vips_io::{Header, Image, OpenOptions};

/// Runs the header command.
pub fn run(args: HeaderArgs, options: &OpenOptions, verbose: bool) -> Result<()> {
    for path in &args.input {
        if args.header_only {
            let header = vips_io::read_header(path)
                .with_context(|| format!("Failed to read header: {}", path.display()))?;
            println!("{}", path.display());
            print_header(&header);
        } else {
            let image = super::open_image(path, options)?;
            print_image(path, &image, args.all, verbose);
            image.close()?;
        }

        if args.input.len() > 1 {
            println!();
        }
    }

    Ok(())
}

fn print_header(header: &Header) {
    println!("  Size:           {}x{}", header.width, header.height);
    println!("  Bands:          {}", header.bands);
    println!(
        "  Format:         {:?} ({} bits)",
        header.band_fmt,
        header.bits_per_sample()
    );
    println!("  Coding:         {:?}", header.coding);
    println!("  Interpretation: {:?}", header.interpretation);
    println!(
        "  Resolution:     {:.4} x {:.4} px/mm",
        header.xres, header.yres
    );
    println!("  Offset:         {}, {}", header.xoffset, header.yoffset);
    println!("  Byte order:     {:?}", header.byte_order);
    println!(
        "  Pixel data:     {}",
        super::format_size(header.pixel_length())
    );
}

fn print_image(path: &Path, image: &Image, all: bool, verbose: bool) {
    let raw = image.descriptor();

    println!("{}", path.display());
    print_header(raw.header());
    println!("  File size:      {}", super::format_size(raw.file_len()));
    println!("  Access:         {:?}", raw.access());
    if image.is_swapped() {
        println!("  Swapped:        yes");
    }

    if verbose {
        let extension = raw.file_len().saturating_sub(raw.header().predicted_file_size());
        debug!("{}: {} byte extension block", path.display(), extension);
        println!("  Extension:      {}", super::format_size(extension));
    }

    if all {
        let history = image.history();
        if !history.is_empty() {
            println!("  History:");
            for line in history {
                println!("    {}", line);
            }
        }

        let meta = image.meta();
        if !meta.is_empty() {
            println!("  Metadata:");
            for (key, value) in meta.sorted() {
                println!("    {} ({}): {}", key, value.type_name(), value);
            }
        }
    }
}
