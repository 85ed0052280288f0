//! # vips-core
//!
//! Core vocabulary for the VIPS image file format.
//!
//! This crate holds the small, dependency-free types every other crate in
//! the workspace speaks in terms of:
//!
//! - [`BandFormat`] - Sample format of each band (uchar, short, float, complex...)
//! - [`Coding`] - How pixels are packed on disk (raw samples, LABQ, opaque)
//! - [`Interpretation`] - Colour interpretation tag
//! - [`ByteOrder`] - Byte order of multi-byte values, with host detection
//!
//! ## Crate Structure
//!
//! ```text
//! vips-core (this crate)
//!    ^
//!    |
//!    +-- vips-io (header codec, open, mapping, byte-order pipeline)
//!           ^
//!           |
//!           +-- vips-cli
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod format;

pub use error::{CoreError, CoreResult};
pub use format::{BandFormat, ByteOrder, Coding, Interpretation};
