//! Mapping strategy.
//!
//! Decides, once per open, how pixel data will be reached:
//!
//! - read-write opens always map the whole file writable
//! - read-only opens map the whole file if the predicted size is strictly
//!   below the threshold
//! - everything else waits for windowed access
//!
//! Note the predicted size, not the file length, is compared: a small image
//! with a large extension block is still mapped whole.

use crate::image::{AccessMode, ImageDescriptor};
use crate::{IoError, IoResult};
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::io;
use std::path::Path;

/// The mapping owned by a descriptor.
#[derive(Debug, Default)]
pub(crate) enum Mapping {
    #[default]
    None,
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

impl Mapping {
    pub(crate) fn bytes(&self) -> Option<&[u8]> {
        match self {
            Mapping::None => None,
            Mapping::ReadOnly(m) => Some(&m[..]),
            Mapping::ReadWrite(m) => Some(&m[..]),
        }
    }

    pub(crate) fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Mapping::ReadWrite(m) => Some(&mut m[..]),
            _ => None,
        }
    }
}

/// Returns true if a read-only open of this size maps the whole file.
#[inline]
pub fn should_map_whole(predicted_size: u64, threshold: u64) -> bool {
    predicted_size < threshold
}

/// Applies the strategy to a freshly opened descriptor.
pub(crate) fn apply_strategy(
    image: &mut ImageDescriptor,
    read_write: bool,
    threshold: u64,
) -> IoResult<()> {
    debug_assert_eq!(image.access, AccessMode::Unopened);

    let predicted = image.header.predicted_file_size();
    if read_write || should_map_whole(predicted, threshold) {
        map_whole(image, read_write)?;
    } else {
        image.access = AccessMode::PendingWindow;
    }

    tracing::debug!(
        "\"{}\": predicted {} bytes, threshold {}, access {:?}",
        image.path.display(),
        predicted,
        threshold,
        image.access
    );
    Ok(())
}

/// Error for a read-write mapping requested on a read-only handle.
pub(crate) fn read_only_refusal(path: &Path) -> IoError {
    IoError::MappingFailure {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "file was opened read-only"),
    }
}

/// Maps the whole file of `image`, read-only or read-write.
pub(crate) fn map_whole(image: &mut ImageDescriptor, read_write: bool) -> IoResult<()> {
    let failure = |source: io::Error| IoError::MappingFailure {
        path: image.path.clone(),
        source,
    };

    let mapping = if read_write {
        if !image.writable {
            return Err(read_only_refusal(&image.path));
        }
        // SAFETY: the descriptor owns the file handle for the lifetime of
        // the mapping. Concurrent modification by other processes is not
        // guarded against, same as any mmap-based reader.
        Mapping::ReadWrite(unsafe { MmapOptions::new().map_mut(&image.file) }.map_err(failure)?)
    } else {
        // SAFETY: as above; the mapping is read-only.
        Mapping::ReadOnly(unsafe { MmapOptions::new().map(&image.file) }.map_err(failure)?)
    };

    image.mapping = mapping;
    image.access = if read_write {
        AccessMode::MappedReadWrite
    } else {
        AccessMode::MappedReadOnly
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(should_map_whole(99, 100));
        assert!(!should_map_whole(100, 100));
        assert!(!should_map_whole(101, 100));
        assert!(!should_map_whole(0, 0));
    }

    #[test]
    fn test_mapping_bytes() {
        let mut none = Mapping::None;
        assert!(none.bytes().is_none());
        assert!(none.bytes_mut().is_none());

        let mut anon = MmapMut::map_anon(16).unwrap();
        anon[0] = 9;
        let mut rw = Mapping::ReadWrite(anon);
        assert_eq!(rw.bytes().unwrap()[0], 9);
        rw.bytes_mut().unwrap()[1] = 4;
        assert_eq!(rw.bytes().unwrap()[..2], [9, 4]);
    }
}
