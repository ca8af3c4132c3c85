//! Arithmetic over GF(2^8) with the QR primitive polynomial x^8 + x^4 + x^3 + x^2 + 1.
//!
//! Addition is XOR. Multiplication and division go through log/antilog tables that
//! are computed at compile time, so they are shared read-only by every encode.

use crate::error::{EncodeError, Result};

/// The reducing polynomial 0x11D.
pub const PRIMITIVE: u16 = 0x11d;

static EXP: [u8; 256] = exp_table();
static LOG: [u8; 256] = log_table();

const fn exp_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        table[i] = x as u8;
        x <<= 1;
        if x >= 0x100 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    table[255] = table[0];
    table
}

const fn log_table() -> [u8; 256] {
    let exp = exp_table();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Returns alpha^power, where alpha = 0x02 generates the multiplicative group.
pub fn exp(power: usize) -> u8 {
    EXP[power % 255]
}

/// Returns the product of `x` and `y`.
pub fn multiply(x: u8, y: u8) -> u8 {
    if x == 0 || y == 0 {
        return 0;
    }
    let sum = usize::from(LOG[usize::from(x)]) + usize::from(LOG[usize::from(y)]);
    EXP[sum % 255]
}

/// Returns `x / y`, or [`EncodeError::InvalidOperation`] when `y` is zero.
pub fn divide(x: u8, y: u8) -> Result<u8> {
    if y == 0 {
        return Err(EncodeError::InvalidOperation("division by zero in GF(256)"));
    }
    if x == 0 {
        return Ok(0);
    }
    let diff = 255 + usize::from(LOG[usize::from(x)]) - usize::from(LOG[usize::from(y)]);
    Ok(EXP[diff % 255])
}
