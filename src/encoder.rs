//! Byte-mode data encoding.
//!
//! Turns raw bytes into the padded data codewords of the smallest version that can
//! hold them: mode indicator, character count, payload, terminator, zero bits up to a
//! byte boundary, then alternating `0xEC`/`0x11` pad bytes.

use crate::error::{EncodeError, Result};
use crate::version::{QrCodeEcc, Version};

/// Mode indicator for byte mode.
const MODE_BYTE: u32 = 0x4;

const PAD_BYTES: [u32; 2] = [0xec, 0x11];

/// The output of the data encoder: the chosen version and its data codewords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataCodewords {
    pub version: Version,
    pub ecl: QrCodeEcc,
    pub codewords: Vec<u8>,
}

/// Encodes `data` in byte mode at the given level, choosing the smallest version
/// whose data capacity fits the whole bit stream.
pub fn encode_data(data: &[u8], ecl: QrCodeEcc) -> Result<DataCodewords> {
    let version = select_version(data.len(), ecl)?;
    let capacitybits = version.data_codewords(ecl) * 8;

    let mut bb = BitBuffer::with_capacity(capacitybits);
    bb.append_bits(MODE_BYTE, 4);
    bb.append_bits(data.len() as u32, version.char_count_bits());
    for &b in data {
        bb.append_bits(u32::from(b), 8);
    }
    debug_assert_eq!(bb.len(), stream_bits(data.len(), version));

    // Terminator, shortened when fewer than four bits remain
    let numzerobits = core::cmp::min(4, capacitybits - bb.len());
    bb.append_bits(0, numzerobits as u8);
    let numzerobits = bb.len().wrapping_neg() & 7;
    bb.append_bits(0, numzerobits as u8);
    debug_assert_eq!(bb.len() % 8, 0);

    for &padbyte in PAD_BYTES.iter().cycle() {
        if bb.len() >= capacitybits {
            break;
        }
        bb.append_bits(padbyte, 8);
    }
    debug_assert_eq!(bb.len(), capacitybits);

    Ok(DataCodewords {
        version,
        ecl,
        codewords: bb.into_bytes(),
    })
}

/// Bits taken by mode indicator, count field and payload at the given version.
fn stream_bits(len: usize, version: Version) -> usize {
    4 + usize::from(version.char_count_bits()) + len * 8
}

/// Finds the minimal version for a `len`-byte payload.
///
/// The count field widens from 8 to 16 bits at version 10, so the stream length is
/// recomputed for every candidate instead of being estimated once.
pub fn select_version(len: usize, ecl: QrCodeEcc) -> Result<Version> {
    for version in Version::all() {
        if len >= 1 << version.char_count_bits() {
            continue;
        }
        if stream_bits(len, version) <= version.data_codewords(ecl) * 8 {
            log::debug!(
                "selected version {} for {} bytes at {:?}",
                version.value(),
                len,
                ecl
            );
            return Ok(version);
        }
    }
    Err(EncodeError::CapacityExceeded {
        len,
        max: Version::MAX.byte_capacity(ecl),
    })
}

/// An appendable sequence of bits, most significant bit first within each byte.
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity((bits + 7) / 8),
            length: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the low `len` bits of `val`, high bit first.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            let shift: u8 = 7 - ((self.length as u8) & 7);
            let bit: u8 = ((val >> i) as u8) & 1;
            if shift == 7 {
                self.data.push(bit << shift);
            } else if let Some(last) = self.data.last_mut() {
                *last |= bit << shift;
            }
            self.length += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
