//! Pixel format vocabulary for VIPS images.
//!
//! This module provides the canonical definitions of the enumerated header
//! fields, with the numeric codes they carry on disk.
//!
//! # Types
//!
//! - [`BandFormat`] - Per-band sample type (8/16/32-bit integers, float, double, complex)
//! - [`Coding`] - Pixel packing scheme (NONE, LABQ, or opaque)
//! - [`Interpretation`] - Colour interpretation hint
//! - [`ByteOrder`] - Byte order of multi-byte values
//!
//! # Usage
//!
//! ```rust
//! use vips_core::format::{BandFormat, ByteOrder, Coding};
//!
//! let fmt = BandFormat::from_code(3).unwrap();
//! assert_eq!(fmt, BandFormat::Short);
//! assert_eq!(fmt.size_of(), 2);
//! assert_eq!(fmt.bits(), 16);
//!
//! assert_eq!(Coding::from_code(2), Coding::Labq);
//! assert_eq!(ByteOrder::native().opposite().opposite(), ByteOrder::native());
//! ```

use crate::{CoreError, CoreResult};

// === Band Format ===

/// Sample format of one band of one pixel.
///
/// Codes match the on-disk `BandFmt` header field.
///
/// | Format | Code | Bytes | Signed |
/// |--------|------|-------|--------|
/// | UChar | 0 | 1 | No |
/// | Char | 1 | 1 | Yes |
/// | UShort | 2 | 2 | No |
/// | Short | 3 | 2 | Yes |
/// | UInt | 4 | 4 | No |
/// | Int | 5 | 4 | Yes |
/// | Float | 6 | 4 | - |
/// | Complex | 7 | 8 | - |
/// | Double | 8 | 8 | - |
/// | DpComplex | 9 | 16 | - |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BandFormat {
    /// Unsigned 8-bit integer.
    #[default]
    UChar,
    /// Signed 8-bit integer.
    Char,
    /// Unsigned 16-bit integer.
    UShort,
    /// Signed 16-bit integer.
    Short,
    /// Unsigned 32-bit integer.
    UInt,
    /// Signed 32-bit integer.
    Int,
    /// 32-bit IEEE float.
    Float,
    /// Pair of 32-bit floats (real, imaginary).
    Complex,
    /// 64-bit IEEE float.
    Double,
    /// Pair of 64-bit floats (real, imaginary).
    DpComplex,
}

impl BandFormat {
    /// All formats in code order.
    pub const ALL: [BandFormat; 10] = [
        BandFormat::UChar,
        BandFormat::Char,
        BandFormat::UShort,
        BandFormat::Short,
        BandFormat::UInt,
        BandFormat::Int,
        BandFormat::Float,
        BandFormat::Complex,
        BandFormat::Double,
        BandFormat::DpComplex,
    ];

    /// Parses the on-disk code.
    pub fn from_code(code: i32) -> CoreResult<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(CoreError::UnknownBandFormat(code))
    }

    /// Returns the on-disk code.
    #[inline]
    pub const fn code(&self) -> i32 {
        match self {
            Self::UChar => 0,
            Self::Char => 1,
            Self::UShort => 2,
            Self::Short => 3,
            Self::UInt => 4,
            Self::Int => 5,
            Self::Float => 6,
            Self::Complex => 7,
            Self::Double => 8,
            Self::DpComplex => 9,
        }
    }

    /// Size of one sample in bytes.
    #[inline]
    pub const fn size_of(&self) -> usize {
        match self {
            Self::UChar | Self::Char => 1,
            Self::UShort | Self::Short => 2,
            Self::UInt | Self::Int | Self::Float => 4,
            Self::Complex | Self::Double => 8,
            Self::DpComplex => 16,
        }
    }

    /// Bits per sample. This is what the deprecated `Bbits` field should hold.
    #[inline]
    pub const fn bits(&self) -> i32 {
        (self.size_of() * 8) as i32
    }

    /// Width of the unit a byte swap reverses.
    ///
    /// Complex formats swap each of their two components separately.
    #[inline]
    pub const fn swap_unit(&self) -> usize {
        match self {
            Self::Complex => 4,
            Self::DpComplex => 8,
            _ => self.size_of(),
        }
    }

    /// True for the single-byte formats, which never need swapping.
    #[inline]
    pub const fn is_single_byte(&self) -> bool {
        matches!(self, Self::UChar | Self::Char)
    }

    /// True for complex formats.
    #[inline]
    pub const fn is_complex(&self) -> bool {
        matches!(self, Self::Complex | Self::DpComplex)
    }
}

// === Coding ===

/// Pixel coding scheme.
///
/// `None` means raw samples laid out band-interleaved, line by line. `Labq`
/// is a packed 4-byte colorimetric code that does not depend on byte order.
/// Everything else is carried through as an opaque code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Coding {
    /// Raw samples.
    #[default]
    None,
    /// Packed Lab, 4 bytes per pixel.
    Labq,
    /// Any other coding (RAD, obsolete colour-quantised, ...).
    Other(i32),
}

impl Coding {
    /// Parses the on-disk code. Never fails; unknown codes become `Other`.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::None,
            2 => Self::Labq,
            other => Self::Other(other),
        }
    }

    /// Returns the on-disk code.
    pub const fn code(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Labq => 2,
            Self::Other(code) => *code,
        }
    }
}

// === Interpretation ===

/// Colour interpretation tag (the `Type` header field).
///
/// Purely advisory; nothing in the read path depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpretation {
    /// Generic many-band image.
    #[default]
    Multiband,
    /// Greyscale.
    BW,
    /// Histogram or lookup table.
    Histogram,
    /// CIE XYZ.
    Xyz,
    /// CIE Lab.
    Lab,
    /// CMYK.
    Cmyk,
    /// Packed Lab.
    Labq,
    /// Generic RGB.
    Rgb,
    /// CIE LCh.
    Lch,
    /// Signed-short Lab.
    Labs,
    /// sRGB.
    Srgb,
    /// CIE Yxy.
    Yxy,
    /// Fourier transform.
    Fourier,
    /// 16-bit RGB.
    Rgb16,
    /// 16-bit greyscale.
    Grey16,
    /// Any other code.
    Other(i32),
}

impl Interpretation {
    /// Parses the on-disk code.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Multiband,
            1 => Self::BW,
            10 => Self::Histogram,
            12 => Self::Xyz,
            13 => Self::Lab,
            15 => Self::Cmyk,
            16 => Self::Labq,
            17 => Self::Rgb,
            19 => Self::Lch,
            21 => Self::Labs,
            22 => Self::Srgb,
            23 => Self::Yxy,
            24 => Self::Fourier,
            25 => Self::Rgb16,
            26 => Self::Grey16,
            other => Self::Other(other),
        }
    }

    /// Returns the on-disk code.
    pub const fn code(&self) -> i32 {
        match self {
            Self::Multiband => 0,
            Self::BW => 1,
            Self::Histogram => 10,
            Self::Xyz => 12,
            Self::Lab => 13,
            Self::Cmyk => 15,
            Self::Labq => 16,
            Self::Rgb => 17,
            Self::Lch => 19,
            Self::Labs => 21,
            Self::Srgb => 22,
            Self::Yxy => 23,
            Self::Fourier => 24,
            Self::Rgb16 => 25,
            Self::Grey16 => 26,
            Self::Other(code) => *code,
        }
    }
}

// === Byte Order ===

/// Byte order of multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first (Intel).
    Little,
    /// Most significant byte first (SPARC, network order).
    Big,
}

impl ByteOrder {
    /// Byte order of the machine we are running on.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// The other byte order.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }

    /// True for [`ByteOrder::Big`].
    #[inline]
    pub const fn is_msb_first(self) -> bool {
        matches!(self, Self::Big)
    }

    /// True if this is the host order.
    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

// === Tests ===
