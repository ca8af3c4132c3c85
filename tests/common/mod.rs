#![allow(dead_code)]

use image::{DynamicImage, RgbaImage};

/// Decodes every symbol rqrr finds in the image, returning the raw payload bytes
/// and the version it reports.
pub fn decode(img: &RgbaImage) -> Result<Vec<(usize, Vec<u8>)>, String> {
    let grey = DynamicImage::ImageRgba8(img.clone()).to_luma8();
    let (width, height) = (grey.width() as usize, grey.height() as usize);
    let raw = grey.as_raw();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| raw[y * width + x]);
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Err("rqrr: no grids found".to_string());
    }

    let mut results = Vec::new();
    for grid in grids {
        let mut payload = Vec::new();
        let meta = grid
            .decode_to(&mut payload)
            .map_err(|e| format!("rqrr: failed to decode grid: {e:?}"))?;
        results.push((meta.version.0, payload));
    }
    Ok(results)
}

/// Decodes a single symbol and returns its payload.
pub fn decode_one(img: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut results = decode(img)?;
    match results.len() {
        1 => Ok(results.remove(0).1),
        n => Err(format!("expected one symbol, found {n}")),
    }
}

/// A contact card padded with note lines until it is at least `len` bytes.
pub fn vcard(len: usize) -> Vec<u8> {
    let mut card = String::from("BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane;;;\nFN:Jane Doe\nTEL;TYPE=CELL:+1-555-0100\n");
    let mut i = 0;
    while card.len() + "END:VCARD\n".len() < len {
        card.push_str(&format!("NOTE:line {i}\n"));
        i += 1;
    }
    card.push_str("END:VCARD\n");
    card.into_bytes()
}
