//! Fixed-layout VIPS header: field table, codec and pixel-length prediction.
//!
//! # Layout
//!
//! | Offset | Width | Field |
//! |--------|-------|-------|
//! | 0 | 4 | magic (always MSB first) |
//! | 4 | 4 each | Xsize, Ysize, Bands, Bbits, BandFmt, Coding, Type, Xres, Yres, Length |
//! | 44 | 2 each | Compression, Level |
//! | 48 | 4 each | Xoffset, Yoffset |
//! | 56 | 8 | reserved, zero on write, ignored on read |
//!
//! The magic selects the byte order of every following field:
//! [`MAGIC_INTEL`] means little-endian, [`MAGIC_SPARC`] means big-endian.
//! Files are written in host order.
//!
//! # Example
//!
//! ```rust
//! use vips_core::BandFormat;
//! use vips_io::header::Header;
//!
//! let header = Header::new(640, 480, 3, BandFormat::UChar);
//! let bytes = header.encode();
//! let decoded = Header::decode(&bytes).unwrap();
//! assert_eq!(decoded, header);
//! assert_eq!(decoded.predicted_file_size(), 64 + 640 * 480 * 3);
//! ```

use crate::{IoError, IoResult};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use std::io::Write;
use vips_core::{BandFormat, ByteOrder, Coding, Interpretation};

// === Constants ===

/// Magic for files whose fields are little-endian.
pub const MAGIC_INTEL: u32 = 0xb6a6_f208;
/// Magic for files whose fields are big-endian.
pub const MAGIC_SPARC: u32 = 0x08f2_a6b6;
/// Size of the fixed header block in bytes.
pub const HEADER_SIZE: usize = 64;
/// Bytes taken by the magic.
const MAGIC_SIZE: usize = 4;

// === Field Table ===

/// Identity of one header field after the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Image width in pixels.
    Xsize,
    /// Image height in pixels.
    Ysize,
    /// Number of bands.
    Bands,
    /// Bits per sample. Written, never trusted on read.
    Bbits,
    /// Band format code.
    BandFmt,
    /// Coding code.
    Coding,
    /// Interpretation code.
    Type,
    /// Horizontal resolution, f32 bit pattern.
    Xres,
    /// Vertical resolution, f32 bit pattern.
    Yres,
    /// Encoded pixel length for coded images.
    Length,
    /// Compression scheme tag.
    Compression,
    /// Quality level.
    Level,
    /// Horizontal offset.
    Xoffset,
    /// Vertical offset.
    Yoffset,
}

/// On-disk width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// Two bytes.
    Two,
    /// Four bytes.
    Four,
}

impl FieldWidth {
    /// Width in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::Two => 2,
            FieldWidth::Four => 4,
        }
    }
}

/// One entry of the header field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Which field.
    pub id: FieldId,
    /// How wide it is on disk.
    pub width: FieldWidth,
}

const fn field(id: FieldId, width: FieldWidth) -> FieldSpec {
    FieldSpec { id, width }
}

/// Header fields in on-disk order, following the magic.
pub const FIELDS: [FieldSpec; 14] = [
    field(FieldId::Xsize, FieldWidth::Four),
    field(FieldId::Ysize, FieldWidth::Four),
    field(FieldId::Bands, FieldWidth::Four),
    field(FieldId::Bbits, FieldWidth::Four),
    field(FieldId::BandFmt, FieldWidth::Four),
    field(FieldId::Coding, FieldWidth::Four),
    field(FieldId::Type, FieldWidth::Four),
    field(FieldId::Xres, FieldWidth::Four),
    field(FieldId::Yres, FieldWidth::Four),
    field(FieldId::Length, FieldWidth::Four),
    field(FieldId::Compression, FieldWidth::Two),
    field(FieldId::Level, FieldWidth::Two),
    field(FieldId::Xoffset, FieldWidth::Four),
    field(FieldId::Yoffset, FieldWidth::Four),
];

/// Bytes used by the magic plus every table field.
pub const fn used_header_bytes() -> usize {
    let mut total = MAGIC_SIZE;
    let mut i = 0;
    while i < FIELDS.len() {
        total += FIELDS[i].width.bytes();
        i += 1;
    }
    total
}

const _: () = assert!(used_header_bytes() <= HEADER_SIZE);

/// Width and byte order of a single field access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldCodec {
    TwoLittle,
    TwoBig,
    FourLittle,
    FourBig,
}

impl FieldCodec {
    fn new(width: FieldWidth, order: ByteOrder) -> Self {
        match (width, order) {
            (FieldWidth::Two, ByteOrder::Little) => Self::TwoLittle,
            (FieldWidth::Two, ByteOrder::Big) => Self::TwoBig,
            (FieldWidth::Four, ByteOrder::Little) => Self::FourLittle,
            (FieldWidth::Four, ByteOrder::Big) => Self::FourBig,
        }
    }

    /// Reads a zero-extended value. `buf` must hold at least the field width.
    fn read(self, buf: &[u8]) -> u32 {
        match self {
            Self::TwoLittle => LittleEndian::read_u16(buf) as u32,
            Self::TwoBig => BigEndian::read_u16(buf) as u32,
            Self::FourLittle => LittleEndian::read_u32(buf),
            Self::FourBig => BigEndian::read_u32(buf),
        }
    }

    /// Writes the low bits of `value`.
    fn write(self, value: u32, buf: &mut [u8]) {
        match self {
            Self::TwoLittle => LittleEndian::write_u16(buf, value as u16),
            Self::TwoBig => BigEndian::write_u16(buf, value as u16),
            Self::FourLittle => LittleEndian::write_u32(buf, value),
            Self::FourBig => BigEndian::write_u32(buf, value),
        }
    }
}

/// Maps a magic number to the byte order it announces.
pub fn byte_order_of_magic(magic: u32) -> Option<ByteOrder> {
    match magic {
        MAGIC_INTEL => Some(ByteOrder::Little),
        MAGIC_SPARC => Some(ByteOrder::Big),
        _ => None,
    }
}

/// Magic number announcing `order`.
pub const fn magic_for(order: ByteOrder) -> u32 {
    match order {
        ByteOrder::Little => MAGIC_INTEL,
        ByteOrder::Big => MAGIC_SPARC,
    }
}

/// Returns true if `bytes` starts with either VIPS magic.
pub fn can_read(bytes: &[u8]) -> bool {
    bytes.len() >= MAGIC_SIZE && byte_order_of_magic(BigEndian::read_u32(bytes)).is_some()
}

// === Header ===

/// Decoded fixed header.
///
/// `byte_order` records the order the fields were stored in, as announced
/// by the magic. Bits-per-sample is not stored; it always follows
/// `band_fmt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of bands.
    pub bands: u32,
    /// Sample format.
    pub band_fmt: BandFormat,
    /// Pixel coding.
    pub coding: Coding,
    /// Colour interpretation.
    pub interpretation: Interpretation,
    /// Horizontal resolution, pixels per millimetre.
    pub xres: f32,
    /// Vertical resolution, pixels per millimetre.
    pub yres: f32,
    /// Encoded pixel length in bytes. Only meaningful when coding is not NONE.
    pub length: u32,
    /// Compression scheme tag.
    pub compression: i16,
    /// Quality level.
    pub level: i16,
    /// Horizontal offset.
    pub xoffset: i32,
    /// Vertical offset.
    pub yoffset: i32,
    /// Byte order of the file the header came from.
    pub byte_order: ByteOrder,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            bands: 0,
            band_fmt: BandFormat::UChar,
            coding: Coding::None,
            interpretation: Interpretation::Multiband,
            xres: 1.0,
            yres: 1.0,
            length: 0,
            compression: 0,
            level: 0,
            xoffset: 0,
            yoffset: 0,
            byte_order: ByteOrder::native(),
        }
    }
}

impl Header {
    /// Creates a raw-coded header in host byte order.
    pub fn new(width: u32, height: u32, bands: u32, band_fmt: BandFormat) -> Self {
        Self {
            width,
            height,
            bands,
            band_fmt,
            ..Default::default()
        }
    }

    /// Bits per sample, derived from the band format.
    #[inline]
    pub fn bits_per_sample(&self) -> i32 {
        self.band_fmt.bits()
    }

    /// Header size. Constant for this format.
    #[inline]
    pub const fn header_size(&self) -> u64 {
        HEADER_SIZE as u64
    }

    // --- Pixel-length prediction ---

    /// Bytes in one scan line of raw samples. The format has no line padding.
    pub fn sizeof_line(&self) -> u64 {
        (self.band_fmt.size_of() as u64)
            .saturating_mul(self.bands as u64)
            .saturating_mul(self.width as u64)
    }

    /// Predicted number of pixel bytes following the header.
    ///
    /// Raw images are `sizeof_line * height`; coded images use the recorded
    /// `length`. Saturates instead of wrapping, so an absurd header can only
    /// ever look too large for its file.
    pub fn pixel_length(&self) -> u64 {
        match self.coding {
            Coding::None => self.sizeof_line().saturating_mul(self.height as u64),
            _ => self.length as u64,
        }
    }

    /// Predicted size of header plus pixel data.
    pub fn predicted_file_size(&self) -> u64 {
        self.pixel_length().saturating_add(self.header_size())
    }

    // --- Codec ---

    /// Decodes a header block.
    ///
    /// Reads at most [`HEADER_SIZE`] bytes. Fails with
    /// [`IoError::NotThisFormat`] if the magic is not recognised.
    pub fn decode(bytes: &[u8]) -> IoResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(IoError::InvalidHeader(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let magic = BigEndian::read_u32(&bytes[..MAGIC_SIZE]);
        let order = byte_order_of_magic(magic).ok_or(IoError::NotThisFormat { magic })?;

        let mut raw = [0u32; FIELDS.len()];
        let mut offset = MAGIC_SIZE;
        for (slot, spec) in raw.iter_mut().zip(FIELDS.iter()) {
            let width = spec.width.bytes();
            *slot = FieldCodec::new(spec.width, order).read(&bytes[offset..offset + width]);
            offset += width;
        }

        let get = |id: FieldId| -> u32 {
            FIELDS
                .iter()
                .position(|f| f.id == id)
                .map(|i| raw[i])
                .unwrap_or_default()
        };
        let non_negative = |id: FieldId| -> IoResult<u32> {
            let value = get(id) as i32;
            u32::try_from(value)
                .map_err(|_| IoError::InvalidHeader(format!("{:?} is negative ({})", id, value)))
        };

        Ok(Self {
            width: non_negative(FieldId::Xsize)?,
            height: non_negative(FieldId::Ysize)?,
            bands: non_negative(FieldId::Bands)?,
            band_fmt: BandFormat::from_code(get(FieldId::BandFmt) as i32)?,
            coding: Coding::from_code(get(FieldId::Coding) as i32),
            interpretation: Interpretation::from_code(get(FieldId::Type) as i32),
            xres: f32::from_bits(get(FieldId::Xres)),
            yres: f32::from_bits(get(FieldId::Yres)),
            length: get(FieldId::Length),
            compression: get(FieldId::Compression) as u16 as i16,
            level: get(FieldId::Level) as u16 as i16,
            xoffset: get(FieldId::Xoffset) as i32,
            yoffset: get(FieldId::Yoffset) as i32,
            byte_order: order,
        })
    }

    /// Raw on-disk value of one field.
    fn raw_field(&self, id: FieldId) -> u32 {
        match id {
            FieldId::Xsize => self.width,
            FieldId::Ysize => self.height,
            FieldId::Bands => self.bands,
            FieldId::Bbits => self.bits_per_sample() as u32,
            FieldId::BandFmt => self.band_fmt.code() as u32,
            FieldId::Coding => self.coding.code() as u32,
            FieldId::Type => self.interpretation.code() as u32,
            FieldId::Xres => self.xres.to_bits(),
            FieldId::Yres => self.yres.to_bits(),
            FieldId::Length => self.length,
            FieldId::Compression => self.compression as u16 as u32,
            FieldId::Level => self.level as u16 as u32,
            FieldId::Xoffset => self.xoffset as u32,
            FieldId::Yoffset => self.yoffset as u32,
        }
    }

    /// Encodes in host byte order, the way files are written.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        self.encode_with_order(ByteOrder::native())
    }

    /// Encodes with an explicit field byte order.
    ///
    /// The magic is always written MSB first and announces `order`. The
    /// `byte_order` field of `self` is ignored. Reserved bytes are zero.
    pub fn encode_with_order(&self, order: ByteOrder) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        BigEndian::write_u32(&mut out[..MAGIC_SIZE], magic_for(order));

        let mut offset = MAGIC_SIZE;
        for spec in FIELDS.iter() {
            let width = spec.width.bytes();
            FieldCodec::new(spec.width, order)
                .write(self.raw_field(spec.id), &mut out[offset..offset + width]);
            offset += width;
        }

        out
    }

    /// Writes the host-order header block.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(&self.encode())?;
        Ok(())
    }
}

// === Tests ===
