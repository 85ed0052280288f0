//! Error types for VIPS file operations.
//!
//! Fatal open errors ([`IoError::CannotOpen`], [`IoError::HeaderRead`],
//! [`IoError::Truncated`], [`IoError::MappingFailure`]) carry the file path
//! and the underlying cause. Metadata errors are recoverable: the open path
//! downgrades them to a warning, see [`IoError::is_metadata_error`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vips_core::{Coding, CoreError};

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file could not be opened, or its length could not be read.
    #[error("unable to open \"{}\", {source}", path.display())]
    CannotOpen {
        /// File we tried to open.
        path: PathBuf,
        /// Error from the read-only attempt.
        source: io::Error,
    },

    /// The magic number is not one of the two VIPS values.
    #[error("not a VIPS image: bad magic 0x{magic:08X}")]
    NotThisFormat {
        /// Magic read MSB first.
        magic: u32,
    },

    /// Header fields decode to values outside their domain.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Short read or decode failure on the fixed header.
    #[error("unable to read header for \"{}\", {source}", path.display())]
    HeaderRead {
        /// File being opened.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: Box<IoError>,
    },

    /// The header predicts more bytes than the file holds.
    #[error("unable to open \"{}\", file has been truncated ({predicted} bytes expected, {actual} present)", path.display())]
    Truncated {
        /// File being opened.
        path: PathBuf,
        /// Header plus predicted pixel bytes.
        predicted: u64,
        /// Actual file length.
        actual: u64,
    },

    /// The trailing extension block exceeds the size cap.
    #[error("extension block of {size} bytes exceeds the {limit} byte limit")]
    ExtensionTooLarge {
        /// Bytes after the pixel data.
        size: u64,
        /// Cap.
        limit: u64,
    },

    /// Fewer bytes than expected came back from a read.
    #[error("unable to read extension block: expected {expected} bytes, got {actual}")]
    ReadIncomplete {
        /// Bytes requested.
        expected: u64,
        /// Bytes read.
        actual: u64,
    },

    /// The extension block is not well-formed XML.
    #[error("malformed XML in extension block: {0}")]
    MalformedMarkup(String),

    /// Root element does not declare the VIPS namespace.
    #[error("incorrect namespace in XML: {}", found.as_deref().unwrap_or("<none>"))]
    WrongNamespace {
        /// First namespace URI declared on the root, if any.
        found: Option<String>,
    },

    /// A metadata field could not be converted to its declared type.
    #[error("error transforming field \"{name}\" from save format to {type_name}: {reason}")]
    MetadataTransform {
        /// Field name.
        name: String,
        /// Declared type name.
        type_name: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// Byte order differs from the host and the coding cannot be swapped.
    #[error("unknown coding type {0:?} for byte-order correction")]
    UnknownCodingForSwap(Coding),

    /// mmap of the file failed.
    #[error("unable to map \"{}\", {source}", path.display())]
    MappingFailure {
        /// File being mapped.
        path: PathBuf,
        /// Error from the mapping call.
        source: io::Error,
    },

    /// Requested lines fall outside the image.
    #[error("lines {top}..{end} out of range for image of height {height}")]
    LinesOutOfRange {
        /// First requested line.
        top: u64,
        /// One past the last requested line.
        end: u64,
        /// Image height.
        height: u64,
    },

    /// Operation not available for this image.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl IoError {
    /// True for the errors that metadata reconciliation may raise.
    ///
    /// These never abort an open; the orchestrator logs them as a warning.
    pub fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            IoError::ExtensionTooLarge { .. }
                | IoError::ReadIncomplete { .. }
                | IoError::MalformedMarkup(_)
                | IoError::WrongNamespace { .. }
                | IoError::MetadataTransform { .. }
        )
    }

    /// Unwraps a [`IoError::HeaderRead`] wrapper, returning the inner cause.
    pub fn root_cause(&self) -> &IoError {
        match self {
            IoError::HeaderRead { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<CoreError> for IoError {
    fn from(err: CoreError) -> Self {
        IoError::InvalidHeader(err.to_string())
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_classification() {
        assert!(IoError::MalformedMarkup("x".into()).is_metadata_error());
        assert!(IoError::WrongNamespace { found: None }.is_metadata_error());
        assert!(!IoError::NotThisFormat { magic: 0 }.is_metadata_error());
        assert!(!IoError::UnknownCodingForSwap(Coding::Other(6)).is_metadata_error());
    }

    #[test]
    fn test_root_cause() {
        let err = IoError::HeaderRead {
            path: PathBuf::from("a.v"),
            source: Box::new(IoError::NotThisFormat { magic: 0x12345678 }),
        };
        assert!(matches!(err.root_cause(), IoError::NotThisFormat { magic: 0x12345678 }));
        assert!(err.to_string().contains("a.v"));
        assert!(err.to_string().contains("12345678"));
    }
}
