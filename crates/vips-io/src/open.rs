//! The open path.
//!
//! Opening runs these steps in order; the first fatal failure releases
//! everything acquired so far and returns:
//!
//! 1. open the file read-write, falling back to read-only
//! 2. read and decode the 64-byte header
//! 3. compare the predicted size with the file length
//! 4. reconcile XML metadata (failures only warn)
//! 5. apply the mapping strategy

use crate::header::{HEADER_SIZE, Header, can_read};
use crate::image::{AccessMode, ImageDescriptor};
use crate::mapping::{self, Mapping};
use crate::metadata::ImageMetadata;
use crate::{IoError, IoResult, OpenOptions};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Opens `path` read-write if possible, else read-only.
///
/// Returns the file and whether it is writable.
fn open_file(path: &Path) -> IoResult<(File, bool)> {
    match fs::OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => Ok((file, true)),
        Err(e) => {
            tracing::debug!(
                "read-write open of \"{}\" failed ({}), retrying read-only",
                path.display(),
                e
            );
            File::open(path)
                .map(|file| (file, false))
                .map_err(|source| IoError::CannotOpen {
                    path: path.to_path_buf(),
                    source,
                })
        }
    }
}

/// Current length of an open file, with the path attached on failure.
pub(crate) fn file_length(file: &File, path: &Path) -> IoResult<u64> {
    file.metadata()
        .map(|m| m.len())
        .map_err(|source| inspect_failure(path, source))
}

fn inspect_failure(path: &Path, source: std::io::Error) -> IoError {
    IoError::CannotOpen {
        path: path.to_path_buf(),
        source,
    }
}

fn read_fixed_header(file: &mut File, path: &Path) -> IoResult<Header> {
    let mut buf = [0u8; HEADER_SIZE];
    file.read_exact(&mut buf)
        .map_err(IoError::from)
        .and_then(|_| Header::decode(&buf))
        .map_err(|e| IoError::HeaderRead {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
}

/// Reads just the header of a VIPS file.
///
/// No metadata, size check or mapping.
pub fn read_header<P: AsRef<Path>>(path: P) -> IoResult<Header> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| IoError::CannotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    read_fixed_header(&mut file, path)
}

/// Returns true if the file at `path` starts with a VIPS magic.
pub fn is_vips_file<P: AsRef<Path>>(path: P) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| can_read(&magic))
        .unwrap_or(false)
}

impl ImageDescriptor {
    /// Opens for reading. Pixels are mapped whole or windowed depending on
    /// the predicted size.
    pub fn open_read<P: AsRef<Path>>(path: P, options: &OpenOptions) -> IoResult<Self> {
        Self::open(path.as_ref(), false, options)
    }

    /// Opens with a whole-file read-write mapping.
    pub fn open_read_write<P: AsRef<Path>>(path: P, options: &OpenOptions) -> IoResult<Self> {
        Self::open(path.as_ref(), true, options)
    }

    fn open(path: &Path, read_write: bool, options: &OpenOptions) -> IoResult<Self> {
        let (mut file, writable) = open_file(path)?;
        let header = read_fixed_header(&mut file, path)?;

        let file_len = file_length(&file, path)?;
        let predicted = header.predicted_file_size();
        if predicted > file_len {
            return Err(IoError::Truncated {
                path: path.to_path_buf(),
                predicted,
                actual: file_len,
            });
        }

        tracing::debug!(
            "\"{}\": {}x{}x{} {:?}, {:?} order, {} bytes",
            path.display(),
            header.width,
            header.height,
            header.bands,
            header.band_fmt,
            header.byte_order,
            file_len
        );

        let mut image = Self {
            path: path.to_path_buf(),
            file,
            writable,
            header,
            file_len,
            access: AccessMode::Unopened,
            mapping: Mapping::None,
            metadata: ImageMetadata::default(),
        };

        if let Err(e) = image.reconcile(&options.registry) {
            tracing::warn!("error reading XML metadata for \"{}\": {}", path.display(), e);
        }

        mapping::apply_strategy(&mut image, read_write, options.mmap_threshold)?;
        Ok(image)
    }
}
