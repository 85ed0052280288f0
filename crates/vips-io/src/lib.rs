//! # vips-io
//!
//! Reader for VIPS native image files (`.v`).
//!
//! A VIPS file is a 64-byte header, raw pixel data, and an optional XML
//! extension block carrying history and typed metadata. This crate opens
//! such files and hands back pixels in host byte order:
//!
//! - [`header`] - Header field table and codec
//! - [`extension`] / [`meta`] / [`metadata`] - XML extension block
//! - [`mapping`] / [`window`] - Whole-file or windowed mmap access
//! - [`swap`] - Byte-order correction for files from the other endianness
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vips_io::open;
//!
//! let image = open("photo.v")?;
//! println!("{}x{}", image.header().width, image.header().height);
//! for line in image.history() {
//!     println!("  {}", line);
//! }
//! let first = image.lines(0, 1)?;
//! image.close()?;
//! ```
//!
//! # Open sequence
//!
//! | Step | Failure |
//! |------|---------|
//! | open read-write, fall back to read-only | [`IoError::CannotOpen`] |
//! | read and decode the header | [`IoError::HeaderRead`] |
//! | check predicted size against file length | [`IoError::Truncated`] |
//! | read XML metadata | logged as a warning |
//! | map the file | [`IoError::MappingFailure`] |
//! | byte-order correction | [`IoError::UnknownCodingForSwap`] |
//!
//! # Feature Flags
//!
//! - `parallel` - Swap large regions with rayon (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod image;
mod open;
mod options;

pub mod attrs;
pub mod extension;
pub mod header;
pub mod mapping;
pub mod meta;
pub mod metadata;
pub mod swap;
pub mod window;

pub use attrs::{AttrValue, Attrs, TypeRegistry};
pub use error::{IoError, IoResult};
pub use header::{HEADER_SIZE, Header, MAGIC_INTEL, MAGIC_SPARC};
pub use image::{AccessMode, Image, ImageDescriptor};
pub use open::{is_vips_file, read_header};
pub use options::{DEFAULT_MMAP_THRESHOLD, MMAP_LIMIT_ENV, OpenOptions};
pub use swap::SwapImage;
pub use window::{Region, Window};

pub use vips_core::{BandFormat, ByteOrder, Coding, Interpretation};

use std::path::Path;

/// Opens a VIPS image for reading with default options.
///
/// # Example
///
/// ```rust,ignore
/// let image = vips_io::open("input.v")?;
/// assert!(!image.is_swapped() || image.header().byte_order.is_native());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    open_with(path, &OpenOptions::default())
}

/// Opens a VIPS image for reading.
///
/// The raw descriptor goes through byte-order correction, so the result
/// always produces host-order samples.
pub fn open_with<P: AsRef<Path>>(path: P, options: &OpenOptions) -> IoResult<Image> {
    let raw = ImageDescriptor::open_read(path, options)?;
    swap::correct_byte_order(raw)
}

/// Opens a VIPS image with a read-write mapping of the whole file.
///
/// No byte-order correction is applied; pixels are in file order.
pub fn open_read_write<P: AsRef<Path>>(path: P, options: &OpenOptions) -> IoResult<ImageDescriptor> {
    ImageDescriptor::open_read_write(path, options)
}
