use crate::error::FieldError;
use byteorder::{BigEndian, ByteOrder};
use serde::{Serialize, Serializer};
use std::fmt;

/// Unsigned fixed-point number: `raw / 2^frac_bits`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedPoint {
    raw: u32,
    frac_bits: u32,
}

/// Decode a big-endian fixed-point value whose slice must be exactly `total_bits` wide.
pub fn decode_fixed(bytes: &[u8], total_bits: u32, frac_bits: u32) -> Result<FixedPoint, FieldError> {
    let width = bytes.len().checked_mul(8);
    if width != Some(total_bits as usize) || total_bits == 0 || total_bits > 32 || frac_bits > total_bits {
        return Err(FieldError::FixedWidth {
            expected_bits: total_bits,
            actual_bits: width.and_then(|w| u32::try_from(w).ok()).unwrap_or(u32::MAX),
        });
    }
    let raw = BigEndian::read_uint(bytes, bytes.len()) as u32;
    Ok(FixedPoint { raw, frac_bits })
}

impl FixedPoint {
    /// 8.8, used for volume.
    pub fn from_8_8(bytes: &[u8]) -> Result<Self, FieldError> {
        decode_fixed(bytes, 16, 8)
    }

    /// 16.16, used for rate, width, height and matrix entries.
    pub fn from_16_16(bytes: &[u8]) -> Result<Self, FieldError> {
        decode_fixed(bytes, 32, 16)
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    pub fn integer_part(&self) -> u32 {
        ((self.raw as u64) >> self.frac_bits) as u32
    }

    /// Fraction numerator over `2^frac_bits`.
    pub fn fractional_part(&self) -> u32 {
        (self.raw as u64 & ((1u64 << self.frac_bits) - 1)) as u32
    }

    pub fn to_f64(&self) -> f64 {
        self.raw as f64 / (1u64 << self.frac_bits) as f64
    }
}

// frac / 2^m == frac * 5^m / 10^m, so the decimal expansion is exact in m digits.
impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.frac_bits;
        if m == 0 {
            return write!(f, "{}.0", self.integer_part());
        }
        let digits = self.fractional_part() as u128 * 5u128.pow(m);
        let padded = format!("{:0width$}", digits, width = m as usize);
        let trimmed = padded.trim_end_matches('0');
        let frac = if trimmed.is_empty() { "0" } else { trimmed };
        write!(f, "{}.{}", self.integer_part(), frac)
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(self.to_f64())
    }
}
