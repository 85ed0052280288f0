//! Error types for vips-core.
//!
//! The only failure this crate can produce is an on-disk code that does not
//! name a known value of one of the format enums.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised when converting raw header codes into format types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Band format code outside the known table.
    ///
    /// ```rust
    /// use vips_core::{BandFormat, CoreError};
    ///
    /// assert_eq!(BandFormat::from_code(42), Err(CoreError::UnknownBandFormat(42)));
    /// ```
    #[error("unknown band format code {0}")]
    UnknownBandFormat(i32),
}
