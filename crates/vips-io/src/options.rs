//! Open-time configuration.
//!
//! The only tunable of the read path is the mmap threshold: images whose
//! predicted size is below it are mapped whole at open, larger ones are left
//! for windowed access. The value travels with [`OpenOptions`]; the
//! `VIPS_MMAP_LIMIT` environment variable is an opt-in override for
//! debugging via [`OpenOptions::from_env`].
//!
//! Tests that override the threshold through the environment share process
//! state and must not run concurrently with each other; passing an explicit
//! [`OpenOptions`] avoids that entirely.

use crate::attrs::TypeRegistry;
use std::env;

/// Default mmap threshold: 30 MiB.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 30 * 1024 * 1024;

/// Environment variable overriding the mmap threshold.
pub const MMAP_LIMIT_ENV: &str = "VIPS_MMAP_LIMIT";

/// Options for opening VIPS images.
///
/// # Example
///
/// ```rust
/// use vips_io::OpenOptions;
///
/// // Never map whole files; every read-only open is windowed.
/// let opts = OpenOptions::new().with_mmap_threshold(0);
/// assert_eq!(opts.mmap_threshold, 0);
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Predicted sizes strictly below this are mapped whole on read-only open.
    pub mmap_threshold: u64,
    /// Type transforms used to restore typed metadata.
    pub registry: TypeRegistry,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            registry: TypeRegistry::default(),
        }
    }
}

impl OpenOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options with the threshold taken from `VIPS_MMAP_LIMIT` if set.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(limit) = parse_limit(env::var(MMAP_LIMIT_ENV).ok().as_deref()) {
            tracing::debug!("mmap threshold {} from {}", limit, MMAP_LIMIT_ENV);
            opts.mmap_threshold = limit;
        }
        opts
    }

    /// Sets the mmap threshold.
    pub fn with_mmap_threshold(mut self, bytes: u64) -> Self {
        self.mmap_threshold = bytes;
        self
    }

    /// Replaces the metadata type registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }
}

fn parse_limit(value: Option<&str>) -> Option<u64> {
    let value = value?.trim();
    match value.parse() {
        Ok(limit) => Some(limit),
        Err(e) => {
            tracing::warn!("ignoring {}=\"{}\": {}", MMAP_LIMIT_ENV, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = OpenOptions::default();
        assert_eq!(opts.mmap_threshold, DEFAULT_MMAP_THRESHOLD);
        assert!(opts.registry.is_transformable("gint"));
        assert_eq!(OpenOptions::new().with_mmap_threshold(1).mmap_threshold, 1);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), None);
        assert_eq!(parse_limit(Some("1")), Some(1));
        assert_eq!(parse_limit(Some(" 4096 ")), Some(4096));
        assert_eq!(parse_limit(Some("big")), None);
        assert_eq!(parse_limit(Some("-1")), None);
    }
}
