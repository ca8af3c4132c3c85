mod common;

use image::{Rgba, RgbaImage};
use vcardqr::render::{Color, ModuleClass, RenderStyle, Shape, MAX_LOGO_FRACTION};
use vcardqr::{encode, EncodeError, QrCodeEcc};

const CARD: &[u8] = b"BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane\nEND:VCARD\n";

fn is_finder_at(qr: &vcardqr::QrCode, left: i32, top: i32) -> bool {
    (0..7).all(|dy| {
        (0..7).all(|dx| {
            let dist = (dx - 3i32).abs().max((dy - 3i32).abs());
            let expect_dark = dist != 2;
            qr.get_module(left + dx, top + dy) == expect_dark
                && qr.class(left + dx, top + dy) == Some(ModuleClass::Finder)
        })
    })
}

#[test]
fn contact_card_at_medium() {
    let encoded = encode(CARD, QrCodeEcc::Medium, &RenderStyle::default()).unwrap();
    let qr = &encoded.symbol;
    assert_eq!(CARD.len(), 45);
    assert_eq!(qr.version().value(), 4);
    assert_eq!(qr.size(), 33);

    let far = qr.size() - 7;
    assert!(is_finder_at(qr, 0, 0));
    assert!(is_finder_at(qr, far, 0));
    assert!(is_finder_at(qr, 0, far));
    assert_ne!(qr.class(far + 3, far + 3), Some(ModuleClass::Finder));

    // Mask 2 is what a reference encoder picks for this card
    assert_eq!(qr.mask().value(), 2);
    assert_eq!(qr.decode_format(), Some((QrCodeEcc::Medium, qr.mask())));
    assert_eq!(common::decode_one(&encoded.raster).unwrap(), CARD);
}

#[test]
fn styled_contact_card_still_decodes() {
    let style = RenderStyle::default()
        .with_marker_shape(Shape::Rounded)
        .with_dot_shape(Shape::Circle)
        .with_foreground_color(Color::from_hex("#1a237e").unwrap())
        .with_module_size(12);
    let encoded = encode(CARD, QrCodeEcc::Medium, &style).unwrap();
    assert_eq!(common::decode_one(&encoded.raster).unwrap(), CARD);
}

#[test]
fn high_level_pays_more_overhead() {
    let data = common::vcard(120);
    let low = encode(&data, QrCodeEcc::Low, &RenderStyle::default()).unwrap().symbol;
    let high = encode(&data, QrCodeEcc::High, &RenderStyle::default()).unwrap().symbol;
    assert!(high.version() >= low.version());

    let overhead = |qr: &vcardqr::QrCode| {
        let v = qr.version();
        v.total_codewords() - v.data_codewords(qr.error_correction_level())
    };
    assert!(overhead(&high) >= overhead(&low));
}

#[test]
fn high_level_survives_logo() {
    let data = common::vcard(120);
    // Dark enough that a reader sees the covered modules as dark, not blank
    let logo = RgbaImage::from_pixel(32, 32, Rgba([20, 20, 20, 255]));
    let style = RenderStyle::default()
        .with_module_size(4)
        .with_logo(logo)
        .with_logo_size_fraction(0.30);
    let encoded = encode(&data, QrCodeEcc::High, &style).unwrap();

    let placement = encoded.vector.logo.as_ref().unwrap();
    assert_eq!(placement.size, (encoded.vector.dimension as f32 * 0.30).round() as u32);
    let centre = encoded.raster.width() / 2;
    let pixel = encoded.raster.get_pixel(centre, centre);
    assert!(pixel.0[..3].iter().all(|c| (15..=25).contains(c)), "{:?}", pixel);

    assert_eq!(common::decode_one(&encoded.raster).unwrap(), data);
}

#[test]
fn tiny_logo_at_ceiling() {
    let style = RenderStyle::default()
        .with_logo(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])))
        .with_logo_size_fraction(MAX_LOGO_FRACTION);
    let encoded = encode(CARD, QrCodeEcc::High, &style).unwrap();
    let placement = encoded.vector.logo.unwrap();
    assert!(placement.x + placement.size <= encoded.raster.width());
    assert!(placement.y + placement.size <= encoded.raster.height());
}

#[test]
fn oversized_logo_is_rejected_before_encoding() {
    let style = RenderStyle::default()
        .with_logo(RgbaImage::new(10, 10))
        .with_logo_size_fraction(0.5);
    let err = encode(CARD, QrCodeEcc::High, &style).unwrap_err();
    assert!(matches!(err, EncodeError::LogoOversized { .. }));
    assert!(!err.is_internal());
}
