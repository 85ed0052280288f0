mod common;

use approx::assert_relative_eq;
use common::{f32_samples, u16_samples, write_vips};
use tempfile::tempdir;
use vips_io::{BandFormat, ByteOrder, Coding, Header, Image, IoError, OpenOptions, open, open_with};

fn foreign() -> ByteOrder {
    ByteOrder::native().opposite()
}

#[test]
fn foreign_ushort_is_swapped() {
    let dir = tempdir().unwrap();
    let header = Header::new(2, 2, 1, BandFormat::UShort);
    let values = [1u16, 0x0102, 0xff00, 65535];
    let path = write_vips(dir.path(), "s.v", &header, foreign(), &u16_samples(&values, foreign()), None);

    let image = open(&path).unwrap();
    let Image::Swapped(swapped) = &image else {
        panic!("expected a swap stage");
    };
    assert_eq!(swapped.swap_unit(), 2);
    assert!(image.header().byte_order.is_native());
    assert_eq!(image.descriptor().header().byte_order, foreign());

    let lines = image.lines(0, 2).unwrap();
    assert_eq!(&lines[..], &u16_samples(&values, ByteOrder::native())[..]);
    drop(lines);

    image.close().unwrap();
}

#[test]
fn foreign_header_values_decode() {
    let dir = tempdir().unwrap();
    let mut header = Header::new(3, 1, 1, BandFormat::Float);
    header.xres = 3.5;
    header.yres = 0.25;
    let values = [0.5f32, -1.0, 1.0e6];
    let path = write_vips(dir.path(), "f.v", &header, foreign(), &f32_samples(&values, foreign()), None);

    let image = open(&path).unwrap();
    assert!(image.is_swapped());
    assert_eq!(image.header().width, 3);
    assert_relative_eq!(image.header().xres, 3.5);
    assert_relative_eq!(image.header().yres, 0.25);

    let bytes = image.lines(0, 1).unwrap().into_owned();
    let decoded: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(decoded, values);
}

#[test]
fn complex_swaps_per_component() {
    let dir = tempdir().unwrap();
    let header = Header::new(1, 1, 1, BandFormat::Complex);
    let path = write_vips(
        dir.path(),
        "c.v",
        &header,
        foreign(),
        &f32_samples(&[1.5, -2.0], foreign()),
        None,
    );

    let image = open(&path).unwrap();
    let Image::Swapped(swapped) = &image else {
        panic!("expected a swap stage");
    };
    assert_eq!(swapped.swap_unit(), 4);
    assert_eq!(
        &swapped.lines(0, 1).unwrap()[..],
        &f32_samples(&[1.5, -2.0], ByteOrder::native())[..]
    );
}

#[test]
fn foreign_single_byte_passes_through() {
    let dir = tempdir().unwrap();
    let header = Header::new(4, 1, 1, BandFormat::Char);
    let path = write_vips(dir.path(), "b.v", &header, foreign(), &[1, 2, 3, 4], None);

    let image = open(&path).unwrap();
    assert!(matches!(image, Image::Native(_)));
    assert_eq!(image.header().byte_order, foreign());
}

#[test]
fn foreign_labq_passes_through() {
    let dir = tempdir().unwrap();
    let mut header = Header::new(2, 1, 4, BandFormat::UChar);
    header.coding = Coding::Labq;
    header.length = 8;
    let path = write_vips(dir.path(), "lab.v", &header, foreign(), &[9u8; 8], None);

    let image = open(&path).unwrap();
    assert!(!image.is_swapped());
}

#[test]
fn foreign_unknown_coding_fails() {
    let dir = tempdir().unwrap();
    let mut header = Header::new(2, 1, 1, BandFormat::Short);
    header.coding = Coding::Other(6);
    header.length = 4;
    let path = write_vips(dir.path(), "x.v", &header, foreign(), &[0u8; 4], None);

    match open(&path) {
        Err(IoError::UnknownCodingForSwap(coding)) => assert_eq!(coding, Coding::Other(6)),
        other => panic!("expected UnknownCodingForSwap, got {:?}", other),
    }
}

#[test]
fn swapped_windowed_reads() {
    let dir = tempdir().unwrap();
    let header = Header::new(2, 3, 1, BandFormat::Short);
    let values = [1u16, 2, 3, 4, 5, 6];
    let path = write_vips(dir.path(), "sw.v", &header, foreign(), &u16_samples(&values, foreign()), None);

    let image = open_with(&path, &OpenOptions::new().with_mmap_threshold(0)).unwrap();
    assert!(image.is_swapped());
    assert!(image.descriptor().pixels().is_none());
    assert_eq!(
        &image.lines(1, 2).unwrap()[..],
        &u16_samples(&values[2..], ByteOrder::native())[..]
    );
}
