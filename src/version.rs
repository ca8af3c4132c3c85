//! Symbol versions, error correction levels and the static capacity tables.
//!
//! Every table here is immutable data baked into the binary, so concurrent encodes
//! read them without synchronization.

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Deserialize)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    #[serde(alias = "L")]
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[serde(alias = "M")]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    #[serde(alias = "Q")]
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    #[serde(alias = "H")]
    High,
}

impl QrCodeEcc {
    /// Row index into the capacity tables.
    pub(crate) fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns the 2-bit indicator stored in the format information.
    pub(crate) fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }

    pub(crate) fn from_format_bits(bits: u8) -> Self {
        use QrCodeEcc::*;
        [Medium, Low, High, Quartile][usize::from(bits & 3)]
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Width and height of the symbol in modules, `4 * version + 17`.
    pub const fn side(self) -> i32 {
        self.0 as i32 * 4 + 17
    }

    /// Iterates over every version from [`Version::MIN`] to [`Version::MAX`].
    pub fn all() -> impl Iterator<Item = Version> {
        (Self::MIN.0..=Self::MAX.0).map(Version)
    }

    /// Number of modules left for codewords once every function pattern and the
    /// format/version areas are taken out. Includes remainder bits.
    pub fn raw_data_modules(self) -> usize {
        let ver = usize::from(self.0);
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    /// Total codewords (data plus error correction) the symbol holds.
    pub fn total_codewords(self) -> usize {
        self.raw_data_modules() / 8
    }

    /// Data codewords available at the given level.
    pub fn data_codewords(self, ecl: QrCodeEcc) -> usize {
        self.total_codewords() - self.ecc_codewords_per_block(ecl) * self.num_blocks(ecl)
    }

    pub fn num_blocks(self, ecl: QrCodeEcc) -> usize {
        table_get(&NUM_ERROR_CORRECTION_BLOCKS, self, ecl)
    }

    pub fn ecc_codewords_per_block(self, ecl: QrCodeEcc) -> usize {
        table_get(&ECC_CODEWORDS_PER_BLOCK, self, ecl)
    }

    /// Width of the byte-mode character count field.
    pub fn char_count_bits(self) -> u8 {
        if self.0 <= 9 {
            8
        } else {
            16
        }
    }

    /// Largest byte-mode payload that fits at the given level.
    pub fn byte_capacity(self, ecl: QrCodeEcc) -> usize {
        let bits = self.data_codewords(ecl) * 8 - 4 - usize::from(self.char_count_bits());
        bits / 8
    }

    /// Centre coordinates of the alignment patterns along one axis, ascending.
    /// Empty for version 1.
    pub fn alignment_positions(self) -> Vec<i32> {
        let ver = i32::from(self.0);
        if ver == 1 {
            return Vec::new();
        }
        let numalign = ver / 7 + 2;
        let step = if ver == 32 {
            26
        } else {
            ((ver * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2
        };
        let mut result: Vec<i32> = (0..numalign - 1).map(|i| self.side() - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];
