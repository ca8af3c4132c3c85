#![forbid(unsafe_code)]
//! QR code encoding functionality.
//!
//! This module drives the matrix pipeline: data encoding, error correction,
//! module placement and masking. Each stage hands an owned artifact to the next,
//! and the finished [`QrCode`] is immutable.

use crate::ecc::add_ecc_and_interleave;
use crate::encoder::encode_data;
use crate::error::Result;
use crate::mask::{apply_best_mask, decode_format_bits, Mask, Penalty};
use crate::matrix::{format_positions, Matrix, MatrixBuilder, Module};
use crate::render::ModuleClass;
use crate::version::{QrCodeEcc, Version};

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// Byte mode only, versions 1 to 40, all four error correction levels. The
/// smallest version that holds the data is chosen and the mask is picked by
/// penalty score.
///
/// # Example
///
/// ```rust
/// use vcardqr::qrcode::QrCode;
/// use vcardqr::version::QrCodeEcc;
///
/// let qr = QrCode::encode_text("BEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n", QrCodeEcc::Medium).unwrap();
/// assert_eq!(qr.size(), qr.version().side());
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    ecl: QrCodeEcc,
    mask: Mask,
    penalty: Penalty,
    matrix: Matrix,
}

impl QrCode {
    /// Encodes a text string in byte mode (UTF-8).
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self> {
        Self::encode_binary(text.as_bytes(), ecl)
    }

    /// Encodes arbitrary bytes at the given error correction level.
    ///
    /// Fails with [`EncodeError::CapacityExceeded`](crate::error::EncodeError::CapacityExceeded)
    /// when the data does not fit a version 40 symbol. Any other error is an internal
    /// defect; it is logged and no symbol is produced.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self> {
        Self::build(data, ecl).map_err(|e| {
            if e.is_internal() {
                log::error!("aborting encode of {} bytes: {}", data.len(), e);
            }
            e
        })
    }

    fn build(data: &[u8], ecl: QrCodeEcc) -> Result<Self> {
        let datacodewords = encode_data(data, ecl)?;
        let version = datacodewords.version;
        let allcodewords = add_ecc_and_interleave(&datacodewords)?;
        let unmasked = MatrixBuilder::new(version)?.place_codewords(&allcodewords)?;
        let masked = apply_best_mask(unmasked, ecl)?;
        Ok(Self {
            version,
            ecl,
            mask: masked.mask,
            penalty: masked.penalty,
            matrix: masked.matrix,
        })
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.matrix.side()
    }

    /// Returns this QR Code's error correction level.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// The penalty score of the applied mask.
    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the QR
    /// code's bounds return `false`.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        self.matrix.is_dark(x, y)
    }

    /// Returns the cell at the given coordinates, with its function role.
    pub fn module(&self, x: i32, y: i32) -> Option<Module> {
        self.matrix.get(x, y)
    }

    /// Drawing class of the module at the given coordinates.
    pub fn class(&self, x: i32, y: i32) -> Option<ModuleClass> {
        self.module(x, y).map(ModuleClass::of)
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Reads the 15 format bits from the copy around the top-left finder.
    pub fn format_bits(&self) -> u32 {
        format_positions(self.size())[0]
            .iter()
            .enumerate()
            .filter(|(_, &(x, y))| self.get_module(x, y))
            .fold(0, |bits, (i, _)| bits | 1 << i)
    }

    /// Decodes the level and mask back out of the written format bits.
    pub fn decode_format(&self) -> Option<(QrCodeEcc, Mask)> {
        decode_format_bits(self.format_bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;

    #[test]
    fn test_encode_text_sizes() {
        let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
        assert_eq!(qr.version(), Version::MIN);
        assert_eq!(qr.size(), 21);
        assert_eq!(qr.matrix().unset_count(), 0);
    }

    #[test]
    fn test_format_readback() {
        for ecl in [QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            let qr = QrCode::encode_text("readback", ecl).unwrap();
            assert_eq!(qr.decode_format(), Some((ecl, qr.mask())));
            assert_eq!(qr.error_correction_level(), ecl);
        }
    }

    #[test]
    fn test_both_format_copies_agree() {
        let qr = QrCode::encode_binary(&[0xa5; 100], QrCodeEcc::Quartile).unwrap();
        let [first, second] = format_positions(qr.size());
        for (&(x0, y0), &(x1, y1)) in first.iter().zip(second.iter()) {
            assert_eq!(qr.get_module(x0, y0), qr.get_module(x1, y1));
        }
    }

    #[test]
    fn test_penalty_is_recorded() {
        let qr = QrCode::encode_text("penalty", QrCodeEcc::Medium).unwrap();
        assert_eq!(qr.penalty(), crate::mask::penalty_score(qr.matrix()));
    }

    #[test]
    fn test_deterministic() {
        let a = QrCode::encode_text("same input", QrCodeEcc::High).unwrap();
        let b = QrCode::encode_text("same input", QrCodeEcc::High).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_long() {
        let err = QrCode::encode_binary(&vec![0u8; 2954], QrCodeEcc::Low).unwrap_err();
        assert!(matches!(err, EncodeError::CapacityExceeded { .. }));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_get_module_outside() {
        let qr = QrCode::encode_text("x", QrCodeEcc::Low).unwrap();
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, 21));
        assert_eq!(qr.module(21, 0), None);
        assert_eq!(qr.class(0, -1), None);
        assert_eq!(qr.class(3, 3), Some(ModuleClass::Finder));
    }
}
