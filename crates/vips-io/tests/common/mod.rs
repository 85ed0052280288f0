//! Helpers for writing VIPS files in tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use vips_io::{ByteOrder, Header};

pub const NS: &str = "http://www.vips.ecs.soton.ac.uk/vips/7.12";

/// Writes header (in `order`), pixels and an optional XML tail.
pub fn write_vips(
    dir: &Path,
    name: &str,
    header: &Header,
    order: ByteOrder,
    pixels: &[u8],
    xml: Option<&str>,
) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("create fixture");
    file.write_all(&header.encode_with_order(order)).expect("write header");
    file.write_all(pixels).expect("write pixels");
    if let Some(xml) = xml {
        file.write_all(xml.as_bytes()).expect("write xml");
    }
    path
}

/// 16-bit samples in the given byte order.
pub fn u16_samples(values: &[u16], order: ByteOrder) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| match order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        })
        .collect()
}

/// 32-bit float samples in the given byte order.
pub fn f32_samples(values: &[f32], order: ByteOrder) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| match order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        })
        .collect()
}

/// Metadata document with a history field and the given meta fields.
pub fn metadata_xml(history: &str, fields: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\"?>\n<root xmlns=\"{}\">\n  <header>\n    <field type=\"gchararray\" name=\"Hist\">{}</field>\n  </header>\n  <meta>\n",
        NS, history
    );
    for (type_name, name, value) in fields {
        xml.push_str(&format!(
            "    <field type=\"{}\" name=\"{}\">{}</field>\n",
            type_name, name, value
        ));
    }
    xml.push_str("  </meta>\n</root>\n");
    xml
}
