//! CLI command implementations

pub mod dump;
pub mod header;

use anyhow::{Context, Result};
use std::path::Path;
use vips_io::{Image, OpenOptions};

/// Opens an image, attaching the path to any error.
pub fn open_image(path: &Path, options: &OpenOptions) -> Result<Image> {
    vips_io::open_with(path, options).with_context(|| format!("Failed to open: {}", path.display()))
}

/// Formats a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(30 * 1024 * 1024), "30.00 MB");
    }
}
