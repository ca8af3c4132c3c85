//! Mask selection.
//!
//! Each of the eight masks is tried on its own copy of the unmasked matrix, with
//! the format and version bits for that mask written in, and scored. The winner's
//! copy becomes the symbol; the unmasked matrix is consumed, so nothing can mask
//! a finished symbol twice.

use crate::error::{EncodeError, Result};
use crate::matrix::{format_positions, version_positions, Matrix, UnmaskedMatrix};
use crate::version::{QrCodeEcc, Version};

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Mask> {
        (0u8..8).map(Mask)
    }

    /// Whether the data module at column `x`, row `y` is flipped by this mask.
    pub fn inverts(self, x: i32, y: i32) -> bool {
        match self.0 {
            0 => (x + y) % 2 == 0,
            1 => y % 2 == 0,
            2 => x % 3 == 0,
            3 => (x + y) % 3 == 0,
            4 => (x / 3 + y / 2) % 2 == 0,
            5 => ((x * y) % 2) + ((x * y) % 3) == 0,
            6 => (((x * y) % 2) + ((x * y) % 3)) % 2 == 0,
            7 => (((x + y) % 2) + ((x * y) % 3)) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

/// The four penalty rules, kept apart so callers can see what drove a choice.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Penalty {
    /// Rule 1: runs of five or more same-colored modules in a row or column.
    pub runs: u32,
    /// Rule 2: 2x2 blocks of one color.
    pub blocks: u32,
    /// Rule 3: 1:1:3:1:1 finder-like sequences with four light modules on a side.
    pub finder_like: u32,
    /// Rule 4: deviation of the dark share from 50%.
    pub balance: u32,
}

impl Penalty {
    pub fn total(&self) -> u32 {
        self.runs + self.blocks + self.finder_like + self.balance
    }
}

/// The chosen mask, its penalty and the finished grid.
#[derive(Clone, Debug)]
pub struct MaskedMatrix {
    pub mask: Mask,
    pub penalty: Penalty,
    pub matrix: Matrix,
}

/// Returns a masked copy of `base` with format and version information written.
pub fn candidate(base: &UnmaskedMatrix, ecl: QrCodeEcc, mask: Mask) -> Result<Matrix> {
    let mut matrix = base.matrix.clone();
    matrix.xor_data(|x, y| mask.inverts(x, y));
    draw_format_bits(&mut matrix, ecl, mask)?;
    if base.version.value() >= 7 {
        draw_version_bits(&mut matrix, base.version)?;
    }
    Ok(matrix)
}

/// Scores all eight masks and keeps the lowest-penalty candidate.
pub fn apply_best_mask(base: UnmaskedMatrix, ecl: QrCodeEcc) -> Result<MaskedMatrix> {
    let mut candidates = Mask::all()
        .map(|mask| {
            let matrix = candidate(&base, ecl, mask)?;
            let penalty = penalty_score(&matrix);
            log::trace!("mask {} scored {:?} = {}", mask.value(), penalty, penalty.total());
            Ok((matrix, penalty))
        })
        .collect::<Result<Vec<_>>>()?;
    if candidates.len() != 8 {
        return Err(EncodeError::InvalidOperation("expected eight mask candidates"));
    }
    let scores: [Penalty; 8] = core::array::from_fn(|i| candidates[i].1);
    let mask = best_mask(&scores);
    let (matrix, penalty) = candidates.swap_remove(usize::from(mask.value()));
    log::debug!("applied mask {} with penalty {}", mask.value(), penalty.total());
    Ok(MaskedMatrix { mask, penalty, matrix })
}

/// Picks the lowest total, breaking ties toward the lower mask number.
pub fn best_mask(scores: &[Penalty; 8]) -> Mask {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if score.total() < scores[best].total() {
            best = i;
        }
    }
    Mask::new(best as u8)
}

/// Computes the four penalty rules over the whole grid.
pub fn penalty_score(matrix: &Matrix) -> Penalty {
    let size = matrix.side();
    let dark: Vec<bool> = matrix.cells().map(|m| m.is_dark()).collect();
    let get = |x: i32, y: i32| dark[(y * size + x) as usize];
    let mut result = Penalty::default();

    for horizontal in [true, false] {
        for a in 0..size {
            let mut runcolor = false;
            let mut run: i32 = 0;
            let mut runhistory = FinderPenalty::new(size);
            for b in 0..size {
                let color = if horizontal { get(b, a) } else { get(a, b) };
                if color == runcolor {
                    run += 1;
                    if run == 5 {
                        result.runs += PENALTY_N1;
                    } else if run > 5 {
                        result.runs += 1;
                    }
                } else {
                    runhistory.add_history(run);
                    if !runcolor {
                        result.finder_like += runhistory.count_patterns() * PENALTY_N3;
                    }
                    runcolor = color;
                    run = 1;
                }
            }
            result.finder_like += runhistory.terminate_and_count(runcolor, run) * PENALTY_N3;
        }
    }

    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color = get(x, y);
            if color == get(x + 1, y) && color == get(x, y + 1) && color == get(x + 1, y + 1) {
                result.blocks += PENALTY_N2;
            }
        }
    }

    let darkcount = dark.iter().filter(|&&d| d).count() as i32;
    let total = size * size;
    // Smallest k with |dark share - 50%| <= 5k%
    let k: i32 = ((darkcount * 20 - total * 10).abs() + total - 1) / total - 1;
    result.balance = k.max(0) as u32 * PENALTY_N4;
    result
}

/// Tracks the last seven run lengths of a row or column to spot 1:1:3:1:1 patterns.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    fn add_history(&mut self, mut currentrunlength: i32) {
        // The light border outside the symbol counts toward the first run
        if self.run_history[0] == 0 {
            currentrunlength += self.qr_size;
        }
        let len: usize = self.run_history.len();
        self.run_history.copy_within(0..len - 1, 1);
        self.run_history[0] = currentrunlength;
    }

    fn count_patterns(&self) -> u32 {
        let rh = &self.run_history;
        let n = rh[1];
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        u32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + u32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    fn terminate_and_count(mut self, currentruncolor: bool, mut currentrunlength: i32) -> u32 {
        if currentruncolor {
            self.add_history(currentrunlength);
            currentrunlength = 0;
        }
        currentrunlength += self.qr_size;
        self.add_history(currentrunlength);
        self.count_patterns()
    }
}

/// Returns the 15-bit BCH-coded, XOR-masked format word for a level and mask.
pub fn format_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

/// Recovers the level and mask from a format word, correcting up to three bit errors.
pub fn decode_format_bits(bits: u32) -> Option<(QrCodeEcc, Mask)> {
    let mut best: Option<((QrCodeEcc, Mask), u32)> = None;
    for data in 0u8..32 {
        let candidate = (QrCodeEcc::from_format_bits(data >> 3), Mask::new(data & 7));
        let distance = (format_bits(candidate.0, candidate.1) ^ bits).count_ones();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.filter(|&(_, d)| d <= 3).map(|(found, _)| found)
}

/// Returns the 18-bit BCH-coded version word. Only meaningful from version 7.
pub fn version_bits(ver: Version) -> u32 {
    let ver = u32::from(ver.value());
    let mut rem: u32 = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
    }
    (ver << 12) | rem
}

fn draw_format_bits(matrix: &mut Matrix, ecl: QrCodeEcc, mask: Mask) -> Result<()> {
    let bits = format_bits(ecl, mask);
    for copy in format_positions(matrix.side()).iter() {
        for (i, &(x, y)) in copy.iter().enumerate() {
            matrix.fill_reserved(x, y, get_bit(bits, i))?;
        }
    }
    Ok(())
}

fn draw_version_bits(matrix: &mut Matrix, ver: Version) -> Result<()> {
    let bits = version_bits(ver);
    for copy in version_positions(matrix.side()).iter() {
        for (i, &(x, y)) in copy.iter().enumerate() {
            matrix.fill_reserved(x, y, get_bit(bits, i))?;
        }
    }
    Ok(())
}

fn get_bit(x: u32, i: usize) -> bool {
    ((x >> i) & 1) != 0
}
