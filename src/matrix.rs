//! Module grid construction.
//!
//! Cells are a small tagged enum rather than a dark bit plus a side table of flags.
//! Function patterns are written first, the format and version areas are reserved,
//! and the codeword stream fills whatever is still [`Module::Unset`]. The builder has
//! no way to write a data bit anywhere else, and every coordinate is checked against
//! `[0, side)` before the write: a bad coordinate fails the encode instead of being
//! clamped or skipped.

use crate::error::{EncodeError, Result};
use crate::version::Version;

/// Which function pattern a cell belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Role {
    Finder,
    Separator,
    Timing,
    Alignment,
    DarkModule,
    Format,
    VersionInfo,
}

/// One cell of the matrix.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Module {
    /// Not yet written.
    Unset,
    /// Held for format or version bits that are only known after masking.
    Reserved(Role),
    /// Part of a function pattern; never masked.
    Function { role: Role, dark: bool },
    /// Carries a codeword or remainder bit.
    Data(bool),
}

impl Module {
    /// Returns `true` for dark cells. Unset and reserved cells read as light.
    pub fn is_dark(self) -> bool {
        match self {
            Module::Function { dark, .. } | Module::Data(dark) => dark,
            Module::Unset | Module::Reserved(_) => false,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self {
            Module::Reserved(role) | Module::Function { role, .. } => Some(role),
            Module::Unset | Module::Data(_) => None,
        }
    }
}

/// A square grid of modules, indexed by `(x, y)` with the origin at the top left.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Matrix {
    side: i32,
    cells: Vec<Module>,
}

impl Matrix {
    fn new(side: i32) -> Self {
        Self {
            side,
            cells: vec![Module::Unset; (side * side) as usize],
        }
    }

    /// Builds a grid of data cells from rows of `#` (dark) and `.` (light).
    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let side = rows.len() as i32;
        let cells = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| Module::Data(c == '#')))
            .collect::<Vec<_>>();
        assert_eq!(cells.len(), (side * side) as usize);
        Self { side, cells }
    }

    /// Width and height in modules.
    pub fn side(&self) -> i32 {
        self.side
    }

    /// Returns the cell at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Module> {
        self.index(x, y).ok().map(|i| self.cells[i])
    }

    /// Returns `true` if `(x, y)` is inside the grid and dark.
    pub fn is_dark(&self, x: i32, y: i32) -> bool {
        self.get(x, y).map_or(false, Module::is_dark)
    }

    /// Iterates over cells row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Module> {
        self.cells.iter()
    }

    /// Count of cells still [`Module::Unset`].
    pub fn unset_count(&self) -> usize {
        self.cells.iter().filter(|m| **m == Module::Unset).count()
    }

    fn index(&self, x: i32, y: i32) -> Result<usize> {
        let range = 0..self.side;
        if range.contains(&x) && range.contains(&y) {
            Ok((y * self.side + x) as usize)
        } else {
            Err(EncodeError::OutOfBoundsPlacement {
                x,
                y,
                side: self.side,
            })
        }
    }

    fn set_function(&mut self, x: i32, y: i32, role: Role, dark: bool) -> Result<()> {
        let i = self.index(x, y)?;
        self.cells[i] = Module::Function { role, dark };
        Ok(())
    }

    fn reserve(&mut self, x: i32, y: i32, role: Role) -> Result<()> {
        let i = self.index(x, y)?;
        debug_assert_eq!(self.cells[i], Module::Unset, "({}, {}) reserved twice", x, y);
        self.cells[i] = Module::Reserved(role);
        Ok(())
    }

    /// Writes a bit into a reserved cell, turning it into a function module.
    pub(crate) fn fill_reserved(&mut self, x: i32, y: i32, dark: bool) -> Result<()> {
        let i = self.index(x, y)?;
        match self.cells[i] {
            Module::Reserved(role) => {
                self.cells[i] = Module::Function { role, dark };
                Ok(())
            }
            _ => Err(EncodeError::InvalidOperation("write to a cell that was not reserved")),
        }
    }

    /// XORs every data cell for which `invert` holds.
    pub(crate) fn xor_data(&mut self, invert: impl Fn(i32, i32) -> bool) {
        let side = self.side;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            if let Module::Data(dark) = *cell {
                let x = i as i32 % side;
                let y = i as i32 / side;
                *cell = Module::Data(dark ^ invert(x, y));
            }
        }
    }
}

/// Positions of the 15 format bits, first copy then second copy, indexed by bit.
pub(crate) fn format_positions(side: i32) -> [[(i32, i32); 15]; 2] {
    let mut first = [(0, 0); 15];
    let mut second = [(0, 0); 15];
    for i in 0..15 {
        first[i as usize] = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
        second[i as usize] = if i < 8 {
            (side - 1 - i, 8)
        } else {
            (8, side - 15 + i)
        };
    }
    [first, second]
}

/// Positions of the 18 version bits, both copies, indexed by bit. Version 7 and up.
pub(crate) fn version_positions(side: i32) -> [[(i32, i32); 18]; 2] {
    let mut bottom_left = [(0, 0); 18];
    let mut top_right = [(0, 0); 18];
    for i in 0..18 {
        let a = side - 11 + i % 3;
        let b = i / 3;
        bottom_left[i as usize] = (b, a);
        top_right[i as usize] = (a, b);
    }
    [top_right, bottom_left]
}

/// A matrix with every function pattern and codeword bit placed, not yet masked.
/// Format and version cells are still [`Module::Reserved`].
#[derive(Clone, Debug)]
pub struct UnmaskedMatrix {
    pub(crate) version: Version,
    pub(crate) matrix: Matrix,
}

impl UnmaskedMatrix {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

/// Builds the function patterns of one version, then accepts the codeword stream.
pub struct MatrixBuilder {
    version: Version,
    matrix: Matrix,
}

impl MatrixBuilder {
    /// Allocates the grid and places finders, separators, timing, alignment, the
    /// dark module and the reserved format/version areas.
    pub fn new(version: Version) -> Result<Self> {
        let mut builder = Self {
            version,
            matrix: Matrix::new(version.side()),
        };
        builder.place_finders()?;
        builder.place_timing()?;
        builder.place_alignment(&version.alignment_positions())?;
        builder.reserve_format_area()?;
        if version.value() >= 7 {
            builder.reserve_version_area()?;
        }
        Ok(builder)
    }

    /// The grid built so far.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    fn place_finders(&mut self) -> Result<()> {
        let side = self.matrix.side;
        for &(left, top) in &[(0, 0), (side - 7, 0), (0, side - 7)] {
            for dy in 0..7 {
                for dx in 0..7 {
                    let dist = (dx - 3i32).abs().max((dy - 3i32).abs());
                    self.matrix.set_function(left + dx, top + dy, Role::Finder, dist != 2)?;
                }
            }
        }
        // Light separators on the inner edges of each finder
        for i in 0..8 {
            self.matrix.set_function(i, 7, Role::Separator, false)?;
            self.matrix.set_function(7, i, Role::Separator, false)?;
            self.matrix.set_function(side - 8 + i, 7, Role::Separator, false)?;
            self.matrix.set_function(side - 8, i, Role::Separator, false)?;
            self.matrix.set_function(i, side - 8, Role::Separator, false)?;
            self.matrix.set_function(7, side - 8 + i, Role::Separator, false)?;
        }
        Ok(())
    }

    fn place_timing(&mut self) -> Result<()> {
        let side = self.matrix.side;
        for i in 8..side - 8 {
            self.matrix.set_function(i, 6, Role::Timing, i % 2 == 0)?;
            self.matrix.set_function(6, i, Role::Timing, i % 2 == 0)?;
        }
        Ok(())
    }

    fn place_alignment(&mut self, positions: &[i32]) -> Result<()> {
        let last = positions.len().saturating_sub(1);
        for (i, &cx) in positions.iter().enumerate() {
            for (j, &cy) in positions.iter().enumerate() {
                // These three overlap the finders
                if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                    continue;
                }
                for dy in -2..=2i32 {
                    for dx in -2..=2i32 {
                        let dark = dx.abs().max(dy.abs()) != 1;
                        self.matrix.set_function(cx + dx, cy + dy, Role::Alignment, dark)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn reserve_format_area(&mut self) -> Result<()> {
        let side = self.matrix.side;
        for copy in format_positions(side).iter() {
            for &(x, y) in copy.iter() {
                self.matrix.reserve(x, y, Role::Format)?;
            }
        }
        self.matrix.set_function(8, side - 8, Role::DarkModule, true)
    }

    fn reserve_version_area(&mut self) -> Result<()> {
        for copy in version_positions(self.matrix.side).iter() {
            for &(x, y) in copy.iter() {
                self.matrix.reserve(x, y, Role::VersionInfo)?;
            }
        }
        Ok(())
    }

    /// Places the interleaved codewords in the two-column zig-zag, most significant
    /// bit first, starting at the bottom right. Cells left over after the stream
    /// become light remainder bits.
    pub fn place_codewords(mut self, data: &[u8]) -> Result<UnmaskedMatrix> {
        let expected = self.version.total_codewords();
        if data.len() != expected {
            return Err(EncodeError::CodewordMismatch {
                expected,
                actual: data.len(),
            });
        }
        let side = self.matrix.side;
        let mut i: usize = 0;
        let mut right: i32 = side - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            let upward = ((right + 1) & 2) == 0;
            for vert in 0..side {
                let y = if upward { side - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = right - j;
                    let idx = self.matrix.index(x, y)?;
                    if self.matrix.cells[idx] != Module::Unset {
                        continue;
                    }
                    let bit = match data.get(i >> 3) {
                        Some(&b) => (b >> (7 - (i & 7))) & 1 != 0,
                        None => false,
                    };
                    self.matrix.cells[idx] = Module::Data(bit);
                    i += 1;
                }
            }
            right -= 2;
        }
        debug_assert_eq!(i, self.version.raw_data_modules());
        debug_assert_eq!(self.matrix.unset_count(), 0);
        Ok(UnmaskedMatrix {
            version: self.version,
            matrix: self.matrix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(matrix: &Matrix, pred: impl Fn(Module) -> bool) -> usize {
        matrix.cells().filter(|&&m| pred(m)).count()
    }

    #[test]
    fn test_finder_pattern() {
        let builder = MatrixBuilder::new(Version::MIN).unwrap();
        let m = builder.matrix();
        let rows = [
            "#######.", "#.....#.", "#.###.#.", "#.###.#.", "#.###.#.", "#.....#.", "#######.",
            "........",
        ];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let (x, y) = (x as i32, y as i32);
                assert_eq!(m.is_dark(x, y), c == '#', "top-left ({}, {})", x, y);
                assert_eq!(m.is_dark(20 - x, y), c == '#', "top-right ({}, {})", x, y);
                assert_eq!(m.is_dark(x, 20 - y), c == '#', "bottom-left ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_unset_cells_match_raw_capacity() {
        for ver in Version::all() {
            let builder = MatrixBuilder::new(ver).unwrap();
            assert_eq!(
                builder.matrix().unset_count(),
                ver.raw_data_modules(),
                "version {}",
                ver.value()
            );
        }
    }

    #[test]
    fn test_reserved_areas() {
        let small = MatrixBuilder::new(Version::new(6)).unwrap();
        assert_eq!(count(small.matrix(), |m| m == Module::Reserved(Role::Format)), 30);
        assert_eq!(count(small.matrix(), |m| m == Module::Reserved(Role::VersionInfo)), 0);
        let large = MatrixBuilder::new(Version::new(7)).unwrap();
        assert_eq!(count(large.matrix(), |m| m == Module::Reserved(Role::VersionInfo)), 36);
        assert_eq!(
            large.matrix().get(8, 45 - 8),
            Some(Module::Function { role: Role::DarkModule, dark: true })
        );
    }

    #[test]
    fn test_timing_pattern() {
        let builder = MatrixBuilder::new(Version::new(3)).unwrap();
        let m = builder.matrix();
        for i in 8..29 - 8 {
            assert_eq!(m.is_dark(i, 6), i % 2 == 0);
            assert_eq!(m.is_dark(6, i), i % 2 == 0);
        }
    }

    #[test]
    fn test_alignment_pattern_version_2() {
        let builder = MatrixBuilder::new(Version::new(2)).unwrap();
        let m = builder.matrix();
        assert_eq!(m.get(18, 18), Some(Module::Function { role: Role::Alignment, dark: true }));
        assert_eq!(m.get(17, 18), Some(Module::Function { role: Role::Alignment, dark: false }));
        assert_eq!(m.get(16, 16), Some(Module::Function { role: Role::Alignment, dark: true }));
        assert_eq!(m.get(15, 18), Some(Module::Unset));
    }

    #[test]
    fn test_out_of_bounds_alignment_fails_fast() {
        let mut builder = MatrixBuilder {
            version: Version::MIN,
            matrix: Matrix::new(Version::MIN.side()),
        };
        // A centre too close to the edge for a 5x5 pattern
        let err = builder.place_alignment(&[6, 20]).unwrap_err();
        assert!(matches!(err, EncodeError::OutOfBoundsPlacement { side: 21, .. }));
        assert!(err.is_internal());
    }

    #[test]
    fn test_get_outside_grid() {
        let builder = MatrixBuilder::new(Version::MIN).unwrap();
        assert_eq!(builder.matrix().get(-1, 0), None);
        assert_eq!(builder.matrix().get(0, 21), None);
        assert!(!builder.matrix().is_dark(21, 21));
    }

    #[test]
    fn test_place_codewords_fills_every_cell() {
        let ver = Version::new(7);
        let data: Vec<u8> = (0..ver.total_codewords()).map(|i| i as u8).collect();
        let unmasked = MatrixBuilder::new(ver).unwrap().place_codewords(&data).unwrap();
        let m = unmasked.matrix();
        assert_eq!(m.unset_count(), 0);
        assert_eq!(count(m, |c| matches!(c, Module::Data(_))), ver.raw_data_modules());
        // Codeword 0 = 0x00, codeword 1 = 0x01: bottom right corner starts light
        assert_eq!(m.get(44, 44), Some(Module::Data(false)));
    }

    #[test]
    fn test_place_codewords_zigzag_start() {
        let ver = Version::MIN;
        let mut data = vec![0u8; ver.total_codewords()];
        data[0] = 0b1010_0000;
        let unmasked = MatrixBuilder::new(ver).unwrap().place_codewords(&data).unwrap();
        let m = unmasked.matrix();
        // Bits go right-left, bottom-up in the last column pair
        assert_eq!(m.get(20, 20), Some(Module::Data(true)));
        assert_eq!(m.get(19, 20), Some(Module::Data(false)));
        assert_eq!(m.get(20, 19), Some(Module::Data(true)));
        assert_eq!(m.get(19, 19), Some(Module::Data(false)));
    }

    #[test]
    fn test_place_codewords_rejects_short_stream() {
        let builder = MatrixBuilder::new(Version::MIN).unwrap();
        assert!(matches!(
            builder.place_codewords(&[0u8; 25]),
            Err(EncodeError::CodewordMismatch { expected: 26, actual: 25 })
        ));
    }
}
