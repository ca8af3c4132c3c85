mod common;

use vcardqr::render::{RenderStyle, Shape};
use vcardqr::version::Version;
use vcardqr::{encode, QrCodeEcc};

fn assert_round_trip(data: &[u8], ecl: QrCodeEcc, style: &RenderStyle) -> u8 {
    let encoded = encode(data, ecl, style).unwrap();
    let version = encoded.symbol.version().value();
    let decoded = common::decode(&encoded.raster).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].0, usize::from(version));
    assert_eq!(decoded[0].1, data, "{} bytes at {:?}, version {}", data.len(), ecl, version);
    version
}

#[test]
fn round_trip_small_versions() {
    let style = RenderStyle::default().with_module_size(4);
    for ecl in [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
        for len in [0, 1, 7, 14, 30] {
            assert_round_trip(&common::vcard(len)[..len], ecl, &style);
        }
    }
}

#[test]
fn round_trip_version_info_and_multiple_blocks() {
    let style = RenderStyle::default().with_module_size(3);
    // Version 7 and above carry version information; these all split into several blocks
    let v = assert_round_trip(&common::vcard(150), QrCodeEcc::Medium, &style);
    assert!(v >= 7, "version {}", v);
    let v = assert_round_trip(&common::vcard(400), QrCodeEcc::Quartile, &style);
    assert!(v >= 15, "version {}", v);
    let v = assert_round_trip(&common::vcard(1000), QrCodeEcc::Low, &style);
    assert!(v >= 20, "version {}", v);
}

#[test]
fn round_trip_binary_payload() {
    let data: Vec<u8> = (0..=255u8).collect();
    assert_round_trip(&data, QrCodeEcc::Medium, &RenderStyle::default().with_module_size(3));
}

#[test]
fn round_trip_largest_symbol() {
    let data = vec![b'A'; Version::MAX.byte_capacity(QrCodeEcc::High)];
    let v = assert_round_trip(&data, QrCodeEcc::High, &RenderStyle::default().with_module_size(3));
    assert_eq!(v, 40);
}

#[test]
fn round_trip_rounded_dots() {
    let style = RenderStyle::default()
        .with_module_size(8)
        .with_dot_shape(Shape::Rounded);
    assert_round_trip(&common::vcard(80), QrCodeEcc::Medium, &style);
}

#[test]
fn capacity_boundary_at_every_level() {
    for ecl in [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
        let max = Version::MAX.byte_capacity(ecl);
        let fits = vcardqr::QrCode::encode_binary(&vec![0x42; max], ecl).unwrap();
        assert_eq!(fits.version(), Version::MAX);
        let err = vcardqr::QrCode::encode_binary(&vec![0x42; max + 1], ecl).unwrap_err();
        assert!(matches!(
            err,
            vcardqr::EncodeError::CapacityExceeded { len, max: m } if len == max + 1 && m == max
        ));
    }
}
