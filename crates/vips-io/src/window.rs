//! Line regions of pixel data.
//!
//! Small images are mapped whole at open and regions are plain slices into
//! that mapping. Large images defer mapping; each request maps just the
//! band of lines it needs as a [`Window`].

use crate::header::Header;
use crate::{IoError, IoResult};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

/// A read-only mapping of a band of scan lines.
#[derive(Debug)]
pub struct Window {
    map: Mmap,
    top: u32,
    height: u32,
}

impl Window {
    /// Maps lines `top..top + height` of a raw-coded image.
    ///
    /// `height` must be non-zero and the range must already have passed
    /// [`line_range`].
    pub(crate) fn map(
        file: &File,
        path: &Path,
        header: &Header,
        top: u32,
        height: u32,
    ) -> IoResult<Self> {
        let line = header.sizeof_line();
        let offset = header
            .header_size()
            .saturating_add(line.saturating_mul(top as u64));
        let len = to_usize(line.saturating_mul(height as u64), path)?;

        tracing::trace!(top, height, offset, len, "mapping window");

        // SAFETY: the mapping is read-only. `line_range` keeps it inside the
        // predicted pixel region and the open path checked that region
        // against the file length. The file is not modified through this
        // handle while the window lives.
        let map = unsafe { MmapOptions::new().offset(offset).len(len).map(file) }.map_err(
            |source| IoError::MappingFailure {
                path: path.to_path_buf(),
                source,
            },
        )?;

        Ok(Self { map, top, height })
    }

    /// First line covered.
    pub fn top(&self) -> u32 {
        self.top
    }

    /// Number of lines covered.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Deref for Window {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map
    }
}

fn to_usize(len: u64, path: &Path) -> IoResult<usize> {
    usize::try_from(len).map_err(|_| IoError::MappingFailure {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} bytes do not fit the address space", len),
        ),
    })
}

/// Pixel bytes for a run of lines.
#[derive(Debug)]
pub enum Region<'a> {
    /// Slice of a whole-file mapping.
    Mapped(&'a [u8]),
    /// Dedicated mapping of just these lines.
    Window(Window),
    /// Bytes copied out of the file, e.g. after byte swapping.
    Owned(Vec<u8>),
}

impl Region<'_> {
    /// Copies the region into an owned buffer.
    pub fn into_owned(self) -> Vec<u8> {
        match self {
            Region::Owned(v) => v,
            other => other.to_vec(),
        }
    }
}

impl Deref for Region<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Region::Mapped(s) => s,
            Region::Window(w) => w,
            Region::Owned(v) => v,
        }
    }
}

/// Validates `top..top + height` against the image and returns the byte
/// range of those lines relative to the start of pixel data.
///
/// The range never extends past [`Header::pixel_length`]. Coded images
/// whose recorded length is shorter than `height` whole lines can only
/// reach the lines that fit in it.
pub(crate) fn line_range(header: &Header, top: u32, height: u32) -> IoResult<std::ops::Range<usize>> {
    let end = top as u64 + height as u64;
    let out_of_range = || IoError::LinesOutOfRange {
        top: top as u64,
        end,
        height: header.height as u64,
    };
    if end > header.height as u64 {
        return Err(out_of_range());
    }
    let line = header.sizeof_line();
    let start = line.saturating_mul(top as u64);
    let stop = line.saturating_mul(end);
    if stop > header.pixel_length() {
        return Err(out_of_range());
    }
    match (usize::try_from(start), usize::try_from(stop)) {
        (Ok(start), Ok(stop)) => Ok(start..stop),
        _ => Err(out_of_range()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vips_core::{BandFormat, Coding};

    #[test]
    fn test_line_range() {
        let header = Header::new(4, 10, 3, BandFormat::UShort);
        assert_eq!(line_range(&header, 0, 1).unwrap(), 0..24);
        assert_eq!(line_range(&header, 2, 3).unwrap(), 48..120);
        assert_eq!(line_range(&header, 10, 0).unwrap(), 240..240);
        assert!(matches!(
            line_range(&header, 8, 3),
            Err(IoError::LinesOutOfRange { top: 8, end: 11, height: 10 })
        ));
    }

    #[test]
    fn test_line_range_stays_inside_recorded_length() {
        let mut header = Header::new(2, 2, 4, BandFormat::UChar);
        header.coding = Coding::Labq;
        header.length = 8;
        assert_eq!(line_range(&header, 0, 1).unwrap(), 0..8);
        assert!(matches!(
            line_range(&header, 0, 2),
            Err(IoError::LinesOutOfRange { top: 0, end: 2, height: 2 })
        ));
        assert!(matches!(
            line_range(&header, 1, 1),
            Err(IoError::LinesOutOfRange { top: 1, end: 2, height: 2 })
        ));
    }

    #[test]
    fn test_window_maps_requested_lines() {
        let header = Header::new(3, 4, 1, BandFormat::UChar);
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&header.encode()).unwrap();
        tmp.write_all(&(0u8..12).collect::<Vec<_>>()).unwrap();
        tmp.flush().unwrap();

        let window = Window::map(tmp.as_file(), tmp.path(), &header, 1, 2).unwrap();
        assert_eq!(window.top(), 1);
        assert_eq!(window.height(), 2);
        assert_eq!(&window[..], &[3, 4, 5, 6, 7, 8]);

        let region = Region::Window(window);
        assert_eq!(region.into_owned(), vec![3, 4, 5, 6, 7, 8]);
    }
}
