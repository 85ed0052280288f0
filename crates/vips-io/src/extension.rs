//! Extension block: the bytes following the pixel data.
//!
//! A VIPS file may carry an XML document after its pixels. Its presence is
//! inferred purely from the file length: anything past
//! [`Header::predicted_file_size`] is extension. Blocks are capped at
//! [`MAX_EXTENSION_SIZE`].

use crate::header::Header;
use crate::{IoError, IoResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Largest extension block we agree to read.
pub const MAX_EXTENSION_SIZE: u64 = 10 * 1024 * 1024;

/// Bytes read from after the pixel data, NUL-terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionBlock {
    data: Vec<u8>,
}

impl ExtensionBlock {
    fn from_payload(mut data: Vec<u8>) -> Self {
        data.push(0);
        Self { data }
    }

    /// Payload without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Payload length, not counting the terminator.
    pub fn len(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of bytes beyond the predicted pixel region.
pub fn extension_size(header: &Header, file_len: u64) -> u64 {
    file_len.saturating_sub(header.predicted_file_size())
}

/// True if the file has bytes after the pixel data.
///
/// A file whose length cannot be read is treated as having no extension.
pub fn has_extension(header: &Header, file: &File) -> bool {
    match file.metadata() {
        Ok(meta) => extension_size(header, meta.len()) > 0,
        Err(e) => {
            tracing::debug!("cannot stat file for extension check: {}", e);
            false
        }
    }
}

/// Reads the extension block of an open file.
///
/// Returns `Ok(None)` when there is no extension or the file length cannot
/// be determined.
pub fn read_extension(header: &Header, file: &mut File) -> IoResult<Option<ExtensionBlock>> {
    let file_len = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!("cannot stat file for extension read: {}", e);
            return Ok(None);
        }
    };
    read_extension_from(header, file, file_len)
}

/// Reads the extension block from any seekable source of known length.
pub fn read_extension_from<R: Read + Seek>(
    header: &Header,
    reader: &mut R,
    file_len: u64,
) -> IoResult<Option<ExtensionBlock>> {
    let size = extension_size(header, file_len);
    if size > MAX_EXTENSION_SIZE {
        return Err(IoError::ExtensionTooLarge {
            size,
            limit: MAX_EXTENSION_SIZE,
        });
    }
    if size == 0 {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(header.predicted_file_size()))?;

    let mut data = Vec::with_capacity(size as usize + 1);
    let actual = reader.take(size).read_to_end(&mut data)? as u64;
    if actual != size {
        return Err(IoError::ReadIncomplete {
            expected: size,
            actual,
        });
    }

    tracing::debug!("read {} byte extension block", size);

    Ok(Some(ExtensionBlock::from_payload(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use vips_core::BandFormat;

    fn header() -> Header {
        Header::new(4, 2, 1, BandFormat::UChar)
    }

    fn file_with_extension(extra: u64) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&header().encode()).unwrap();
        file.write_all(&[7u8; 8]).unwrap();
        // Sparse tail keeps the 10 MiB cases cheap.
        file.as_file().set_len(header().predicted_file_size() + extra).unwrap();
        file
    }

    #[test]
    fn test_extension_detection_boundaries() {
        for (extra, expected) in [(0u64, false), (1, true), (MAX_EXTENSION_SIZE, true)] {
            let file = file_with_extension(extra);
            assert_eq!(has_extension(&header(), file.as_file()), expected, "extra = {}", extra);
        }
    }

    #[test]
    fn test_read_none_when_exact() {
        let file = file_with_extension(0);
        let mut f = file.reopen().unwrap();
        assert_eq!(read_extension(&header(), &mut f).unwrap(), None);
    }

    #[test]
    fn test_read_too_large() {
        let file = file_with_extension(MAX_EXTENSION_SIZE + 1);
        let mut f = file.reopen().unwrap();
        match read_extension(&header(), &mut f) {
            Err(IoError::ExtensionTooLarge { size, limit }) => {
                assert_eq!(size, MAX_EXTENSION_SIZE + 1);
                assert_eq!(limit, MAX_EXTENSION_SIZE);
            }
            other => panic!("expected ExtensionTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_read_at_limit() {
        let file = file_with_extension(MAX_EXTENSION_SIZE);
        let mut f = file.reopen().unwrap();
        let block = read_extension(&header(), &mut f).unwrap().unwrap();
        assert_eq!(block.len() as u64, MAX_EXTENSION_SIZE);
    }

    #[test]
    fn test_read_payload_nul_terminated() {
        let mut bytes = header().encode().to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(b"<xml/>");
        let len = bytes.len() as u64;

        let block = read_extension_from(&header(), &mut Cursor::new(bytes), len)
            .unwrap()
            .unwrap();
        assert_eq!(block.as_bytes(), b"<xml/>");
        assert_eq!(block.data, b"<xml/>\0");
        assert_eq!(block.len(), 6);
    }

    #[test]
    fn test_read_incomplete() {
        let mut bytes = header().encode().to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(b"abc");

        // Claim the source is longer than it really is.
        let claimed = bytes.len() as u64 + 5;
        match read_extension_from(&header(), &mut Cursor::new(bytes), claimed) {
            Err(IoError::ReadIncomplete { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 3);
            }
            other => panic!("expected ReadIncomplete, got {:?}", other),
        }
    }
}
