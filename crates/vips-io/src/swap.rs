//! Byte-order correction.
//!
//! Files are written in the byte order of the machine that made them. When
//! that differs from the host, [`correct_byte_order`] puts a [`SwapImage`]
//! in front of the raw descriptor: the file stays untouched and each region
//! is swapped as it is read.
//!
//! | File | Result |
//! |------|--------|
//! | host order | raw descriptor |
//! | LABQ coding | raw descriptor (packed bytes have no order) |
//! | other non-raw coding | [`IoError::UnknownCodingForSwap`] |
//! | single-byte samples | raw descriptor |
//! | otherwise | [`SwapImage`] |
//!
//! Complex formats swap each component on its own, so a `Complex` pixel is
//! two 4-byte swaps, not one 8-byte swap.

use crate::header::Header;
use crate::image::{Image, ImageDescriptor};
use crate::{IoError, IoResult};
use vips_core::{ByteOrder, Coding};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Regions at least this large are swapped in parallel.
#[cfg(feature = "parallel")]
const PARALLEL_SWAP_BYTES: usize = 1 << 20;

/// Wraps `raw` so it yields host-order samples.
///
/// On error `raw` is closed before returning.
pub fn correct_byte_order(raw: ImageDescriptor) -> IoResult<Image> {
    let Header {
        byte_order,
        coding,
        band_fmt,
        ..
    } = *raw.header();

    if byte_order.is_native() {
        return Ok(Image::Native(raw));
    }

    match coding {
        Coding::Labq => return Ok(Image::Native(raw)),
        Coding::None => {}
        other => {
            if let Err(e) = raw.close() {
                tracing::debug!("close after swap refusal failed: {}", e);
            }
            return Err(IoError::UnknownCodingForSwap(other));
        }
    }

    if band_fmt.is_single_byte() {
        return Ok(Image::Native(raw));
    }

    tracing::debug!(
        "\"{}\": {:?} order on a {:?} host, swapping {:?} samples",
        raw.path().display(),
        byte_order,
        ByteOrder::native(),
        band_fmt
    );
    Ok(Image::Swapped(SwapImage::new(raw)))
}

/// Reverses every `unit`-byte group of `data` in place.
///
/// A trailing partial group is left alone.
pub fn swap_in_place(data: &mut [u8], unit: usize) {
    if unit < 2 {
        return;
    }
    swap_chunks(data, unit);
}

#[cfg(feature = "parallel")]
fn swap_chunks(data: &mut [u8], unit: usize) {
    if data.len() >= PARALLEL_SWAP_BYTES {
        data.par_chunks_exact_mut(unit).for_each(<[u8]>::reverse);
    } else {
        data.chunks_exact_mut(unit).for_each(<[u8]>::reverse);
    }
}

#[cfg(not(feature = "parallel"))]
fn swap_chunks(data: &mut [u8], unit: usize) {
    data.chunks_exact_mut(unit).for_each(<[u8]>::reverse);
}

/// A descriptor whose samples are byte-swapped on read.
#[derive(Debug)]
pub struct SwapImage {
    upstream: ImageDescriptor,
    header: Header,
    unit: usize,
}

impl SwapImage {
    fn new(upstream: ImageDescriptor) -> Self {
        let header = Header {
            byte_order: ByteOrder::native(),
            ..upstream.header().clone()
        };
        let unit = upstream.header().band_fmt.swap_unit();
        Self {
            upstream,
            header,
            unit,
        }
    }

    /// Header of the swapped output: the file's, in host order.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The raw descriptor being read from.
    pub fn upstream(&self) -> &ImageDescriptor {
        &self.upstream
    }

    /// Bytes reversed per swap.
    pub fn swap_unit(&self) -> usize {
        self.unit
    }

    /// Host-order copy of lines `top..top + height`.
    pub fn lines(&self, top: u32, height: u32) -> IoResult<Vec<u8>> {
        let mut out = self.upstream.lines(top, height)?.into_owned();
        swap_in_place(&mut out, self.unit);
        Ok(out)
    }

    /// Closes the swap stage and the descriptor it owns.
    pub fn close(self) -> IoResult<()> {
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_units() {
        let mut data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_in_place(&mut data, 2);
        assert_eq!(data, [2, 1, 4, 3, 6, 5, 8, 7]);

        let mut data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_in_place(&mut data, 4);
        assert_eq!(data, [4, 3, 2, 1, 8, 7, 6, 5]);

        let mut data = [1u8, 2, 3];
        swap_in_place(&mut data, 1);
        assert_eq!(data, [1, 2, 3]);
    }

    #[test]
    fn test_partial_tail_untouched() {
        let mut data = [1u8, 2, 3, 4, 5];
        swap_in_place(&mut data, 2);
        assert_eq!(data, [2, 1, 4, 3, 5]);
    }

    #[test]
    fn test_large_buffer_matches_sequential() {
        let len = (1 << 20) + 16;
        let mut data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut expected = data.clone();
        expected.chunks_exact_mut(8).for_each(|c| c.reverse());
        swap_in_place(&mut data, 8);
        assert_eq!(data, expected);
    }
}
