//! Reed–Solomon error correction and block interleaving.

use crate::encoder::DataCodewords;
use crate::error::{EncodeError, Result};
use crate::gf256;
use crate::version::{QrCodeEcc, Version};

/// How a version/level splits its codewords into blocks.
///
/// The standard allows two groups: `short_blocks` blocks carrying
/// `short_data_len` data codewords, followed by blocks carrying one more.
/// Every block gets `ecc_len` error correction codewords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub num_blocks: usize,
    pub short_blocks: usize,
    pub short_data_len: usize,
    pub ecc_len: usize,
}

impl BlockLayout {
    pub fn new(ver: Version, ecl: QrCodeEcc) -> Self {
        let num_blocks = ver.num_blocks(ecl);
        let ecc_len = ver.ecc_codewords_per_block(ecl);
        let rawcodewords = ver.total_codewords();
        Self {
            num_blocks,
            short_blocks: num_blocks - rawcodewords % num_blocks,
            short_data_len: rawcodewords / num_blocks - ecc_len,
            ecc_len,
        }
    }

    /// Data codewords carried by block `i`.
    pub fn data_len(&self, i: usize) -> usize {
        self.short_data_len + usize::from(i >= self.short_blocks)
    }

    pub fn total_data(&self) -> usize {
        (0..self.num_blocks).map(|i| self.data_len(i)).sum()
    }

    pub fn total(&self) -> usize {
        self.total_data() + self.num_blocks * self.ecc_len
    }
}

/// Splits the data codewords into blocks, appends each block's error correction
/// codewords and interleaves the result into the final codeword stream.
pub fn add_ecc_and_interleave(data: &DataCodewords) -> Result<Vec<u8>> {
    let layout = BlockLayout::new(data.version, data.ecl);
    let expected = data.version.total_codewords();
    if data.codewords.len() != layout.total_data() {
        return Err(EncodeError::CodewordMismatch {
            expected: layout.total_data(),
            actual: data.codewords.len(),
        });
    }
    log::debug!(
        "version {} {:?}: {} blocks, {} short of {} data codewords, {} ecc each",
        data.version.value(),
        data.ecl,
        layout.num_blocks,
        layout.short_blocks,
        layout.short_data_len,
        layout.ecc_len
    );

    let rs = ReedSolomonGenerator::new(layout.ecc_len);
    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(layout.num_blocks);
    let mut dat: &[u8] = &data.codewords;
    for i in 0..layout.num_blocks {
        let (block, rest) = dat.split_at(layout.data_len(i));
        blocks.push((block, rs.compute_remainder(block)));
        dat = rest;
    }
    debug_assert!(dat.is_empty());

    let mut result: Vec<u8> = Vec::with_capacity(expected);
    for j in 0..=layout.short_data_len {
        for (block, _) in &blocks {
            if let Some(&b) = block.get(j) {
                result.push(b);
            }
        }
    }
    for j in 0..layout.ecc_len {
        for (_, ecc) in &blocks {
            result.push(ecc[j]);
        }
    }

    if result.len() != expected {
        log::error!("interleaved {} codewords, expected {}", result.len(), expected);
        return Err(EncodeError::CodewordMismatch {
            expected,
            actual: result.len(),
        });
    }
    Ok(result)
}

/// Divisor polynomial for a fixed number of error correction codewords.
pub struct ReedSolomonGenerator {
    divisor: Vec<u8>,
}

impl ReedSolomonGenerator {
    /// Builds the generator `(x - a^0)(x - a^1)...(x - a^(degree-1))`, stored from
    /// the highest power down with the leading 1 omitted.
    pub fn new(degree: usize) -> Self {
        assert!((1..=255).contains(&degree), "Degree out of range");
        let mut divisor = vec![0u8; degree];
        divisor[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                divisor[j] = gf256::multiply(divisor[j], root);
                if j + 1 < degree {
                    divisor[j] ^= divisor[j + 1];
                }
            }
            root = gf256::multiply(root, 0x02);
        }
        Self { divisor }
    }

    pub fn degree(&self) -> usize {
        self.divisor.len()
    }

    /// Returns the remainder of `data(x) * x^degree` divided by the generator.
    pub fn compute_remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree()];
        for b in data {
            let factor: u8 = b ^ result[0];
            result.rotate_left(1);
            if let Some(last) = result.last_mut() {
                *last = 0;
            }
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= gf256::multiply(y, factor);
            }
        }
        result
    }
}
