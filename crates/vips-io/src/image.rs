//! Open image handles.
//!
//! [`ImageDescriptor`] is the raw handle produced by the open path: the
//! file, its decoded header, reconciled metadata and whatever mapping the
//! strategy chose. [`Image`] is what callers get back from
//! [`open`](crate::open): either that raw handle, when the file is already
//! in host byte order, or a [`SwapImage`] wrapping it.
//!
//! # Access modes
//!
//! | Mode | Pixels | Regions |
//! |------|--------|---------|
//! | `MappedReadOnly` | whole file mapped read-only | slices of the mapping |
//! | `MappedReadWrite` | whole file mapped read-write | slices of the mapping |
//! | `PendingWindow` | not mapped | one [`Window`](crate::Window) per request |

use crate::attrs::{Attrs, TypeRegistry};
use crate::header::Header;
use crate::mapping::{self, Mapping};
use crate::meta::MetaDocument;
use crate::metadata::{ImageMetadata, read_and_reconcile};
use crate::open::file_length;
use crate::swap::SwapImage;
use crate::window::{Region, Window, line_range};
use crate::{IoError, IoResult, OpenOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use vips_core::Coding;

/// How the pixel data of a descriptor is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// No mapping decided yet.
    Unopened,
    /// Whole file mapped read-only.
    MappedReadOnly,
    /// Whole file mapped read-write.
    MappedReadWrite,
    /// Too large to map whole; regions are mapped on demand.
    PendingWindow,
}

/// Raw handle to an open VIPS file.
#[derive(Debug)]
pub struct ImageDescriptor {
    pub(crate) path: PathBuf,
    pub(crate) file: File,
    pub(crate) writable: bool,
    pub(crate) header: Header,
    pub(crate) file_len: u64,
    pub(crate) access: AccessMode,
    pub(crate) mapping: Mapping,
    pub(crate) metadata: ImageMetadata,
}

impl ImageDescriptor {
    /// Path the image was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded header, in the byte order of the file.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// File length observed at open or last remap.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// True if the underlying file handle allows writing.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Current access mode.
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Reconciled metadata.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Processing history.
    pub fn history(&self) -> &[String] {
        self.metadata.history()
    }

    /// Typed metadata fields.
    pub fn meta(&self) -> &Attrs {
        self.metadata.attrs()
    }

    /// Attached XML document.
    pub fn document(&self) -> Option<&MetaDocument> {
        self.metadata.document()
    }

    /// Pixel bytes, when the whole file is mapped.
    ///
    /// The slice starts right after the header and covers the predicted
    /// pixel length. `None` in `PendingWindow` mode.
    pub fn pixels(&self) -> Option<&[u8]> {
        let range = self.pixel_span();
        self.mapping.bytes()?.get(range)
    }

    /// Mutable pixel bytes, only in `MappedReadWrite` mode.
    pub fn pixels_mut(&mut self) -> Option<&mut [u8]> {
        let range = self.pixel_span();
        self.mapping.bytes_mut()?.get_mut(range)
    }

    fn pixel_span(&self) -> std::ops::Range<usize> {
        let start = self.header.header_size() as usize;
        let end = usize::try_from(self.header.predicted_file_size()).unwrap_or(usize::MAX);
        start..end
    }

    /// Pixel bytes of lines `top..top + height`.
    ///
    /// Mapped images hand out a slice; `PendingWindow` images map just
    /// those lines.
    pub fn lines(&self, top: u32, height: u32) -> IoResult<Region<'_>> {
        if let Coding::Other(code) = self.header.coding {
            return Err(IoError::UnsupportedOperation(format!(
                "line access for coding {}",
                code
            )));
        }
        let range = line_range(&self.header, top, height)?;

        match self.access {
            AccessMode::MappedReadOnly | AccessMode::MappedReadWrite => self
                .pixels()
                .and_then(|p| p.get(range))
                .map(Region::Mapped)
                .ok_or(IoError::LinesOutOfRange {
                    top: top as u64,
                    end: top as u64 + height as u64,
                    height: self.header.height as u64,
                }),
            AccessMode::PendingWindow if range.is_empty() => Ok(Region::Owned(Vec::new())),
            AccessMode::PendingWindow => Ok(Region::Window(Window::map(
                &self.file,
                &self.path,
                &self.header,
                top,
                height,
            )?)),
            AccessMode::Unopened => Err(IoError::UnsupportedOperation(
                "image has no access mode yet".into(),
            )),
        }
    }

    /// Replaces the current mapping with a whole-file one.
    ///
    /// A read-write remap needs a handle that was opened for writing; on a
    /// read-only handle it fails and the current mapping stays in place.
    /// If the new mapping fails, the descriptor falls back to
    /// `PendingWindow`.
    pub fn remap(&mut self, read_write: bool) -> IoResult<()> {
        if read_write && !self.writable {
            return Err(mapping::read_only_refusal(&self.path));
        }
        self.release_mapping()?;
        self.access = AccessMode::PendingWindow;
        self.file_len = file_length(&self.file, &self.path)?;
        mapping::map_whole(self, read_write)
    }

    /// Rebuilds history and typed metadata from the file.
    pub fn reread_metadata(&mut self, options: &OpenOptions) -> IoResult<()> {
        self.reconcile(&options.registry)
    }

    pub(crate) fn reconcile(&mut self, registry: &TypeRegistry) -> IoResult<()> {
        read_and_reconcile(&mut self.metadata, &self.header, &mut self.file, registry)
    }

    fn release_mapping(&mut self) -> IoResult<()> {
        if let Mapping::ReadWrite(map) = &self.mapping {
            map.flush()?;
        }
        self.mapping = Mapping::None;
        Ok(())
    }

    /// Flushes a read-write mapping and releases the file.
    pub fn close(mut self) -> IoResult<()> {
        tracing::debug!("closing \"{}\"", self.path.display());
        self.release_mapping()
    }
}

// === Caller-facing handle ===

/// An open image whose pixels are in host byte order.
#[derive(Debug)]
pub enum Image {
    /// The file was already in host order, or needs no swapping.
    Native(ImageDescriptor),
    /// Samples are swapped on the way out.
    Swapped(SwapImage),
}

impl Image {
    /// The raw descriptor underneath.
    pub fn descriptor(&self) -> &ImageDescriptor {
        match self {
            Image::Native(d) => d,
            Image::Swapped(s) => s.upstream(),
        }
    }

    /// Header of the pixels this handle produces.
    ///
    /// For a swapped image the byte order is the host's.
    pub fn header(&self) -> &Header {
        match self {
            Image::Native(d) => d.header(),
            Image::Swapped(s) => s.header(),
        }
    }

    /// True if a byte-swap stage sits in front of the file.
    pub fn is_swapped(&self) -> bool {
        matches!(self, Image::Swapped(_))
    }

    /// Processing history.
    pub fn history(&self) -> &[String] {
        self.descriptor().history()
    }

    /// Typed metadata fields.
    pub fn meta(&self) -> &Attrs {
        self.descriptor().meta()
    }

    /// Pixel bytes of lines `top..top + height`, in host byte order.
    pub fn lines(&self, top: u32, height: u32) -> IoResult<Region<'_>> {
        match self {
            Image::Native(d) => d.lines(top, height),
            Image::Swapped(s) => Ok(Region::Owned(s.lines(top, height)?)),
        }
    }

    /// Closes the image and everything it owns.
    pub fn close(self) -> IoResult<()> {
        match self {
            Image::Native(d) => d.close(),
            Image::Swapped(s) => s.close(),
        }
    }
}
