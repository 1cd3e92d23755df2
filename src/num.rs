//! Script numbers.
//!
//! Numeric opcodes operate on little-endian, sign-magnitude byte strings. Inputs are limited to
//! [`Number::DEFAULT_MAX_SIZE`] bytes (or [`Number::LOCK_TIME_MAX_SIZE`] for the lock time
//! opcodes), but results may grow past that and live on the stack as raw bytes. Only reading them
//! back as a number, or doing further arithmetic, is checked.

use alloc::vec::Vec;
use core::cmp::Ordering;

use thiserror::Error;

/// Things that can go wrong when reading or computing a [`Number`].
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("script number overflow: max: {max_size}, actual: {actual}")]
    Overflow { max_size: usize, actual: usize },

    /// The exact result of an addition, subtraction or negation can’t be represented.
    #[error("script number arithmetic overflowed")]
    ArithmeticOverflow,
}

/// A signed integer read from, or destined for, the stack.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Number(i64);

impl Number {
    /// The widest encoding accepted by general arithmetic opcodes.
    pub const DEFAULT_MAX_SIZE: usize = 4;

    /// CHECKLOCKTIMEVERIFY and CHECKSEQUENCEVERIFY accept 5 bytes, which is good until 2**39-1.
    /// With 4 bytes we’d have a year 2038 problem, even though the `lock_time` field itself is a
    /// `u32`.
    pub const LOCK_TIME_MAX_SIZE: usize = 5;

    /// The largest magnitude [`Number::to_i32`] reports.
    const I32_BOUND: i64 = i32::MAX as i64;

    /// Decodes a number, failing if `vch` is longer than `max_size`.
    ///
    /// __NB__: Encodings don’t need to be minimal. Negative zero (`[0x80]`) decodes to zero.
    pub fn from_bytes(vch: &[u8], max_size: usize) -> Result<Self, Error> {
        if vch.len() > max_size {
            return Err(Error::Overflow {
                max_size,
                actual: vch.len(),
            });
        }
        match vch.split_last() {
            None => Ok(Number(0)),
            Some((&vch_back, _)) => {
                // Anything wider than `i64` can’t be held, regardless of `max_size`.
                if vch.len() > 8 {
                    return Err(Error::Overflow {
                        max_size: 8,
                        actual: vch.len(),
                    });
                }

                let mut result: u64 = 0;
                for (i, vch_i) in vch.iter().enumerate() {
                    result |= u64::from(*vch_i) << (8 * i);
                }

                // If the most significant byte has its sign bit set, remove it from the
                // magnitude and return a negative.
                if vch_back & 0x80 != 0 {
                    let magnitude = result & !(0x80 << (8 * (vch.len() - 1)));
                    Ok(Number(-(magnitude as i64)))
                } else {
                    i64::try_from(result)
                        .map(Number)
                        .map_err(|_| Error::ArithmeticOverflow)
                }
            }
        }
    }

    /// The minimal encoding of this number. Zero is the empty string.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }

        let mut result = Vec::new();
        let neg = self.0 < 0;
        let mut absvalue = self.0.unsigned_abs();

        while absvalue != 0 {
            result.push((absvalue & 0xff) as u8);
            absvalue >>= 8;
        }

        // - If the most significant byte is >= 0x80 and the value is positive, push a new
        //   zero-byte to make the significant byte < 0x80 again.
        // - If the most significant byte is >= 0x80 and the value is negative, push a new 0x80
        //   byte that will be popped off when converting to an integral.
        // - If the most significant byte is < 0x80 and the value is negative, add 0x80 to it,
        //   since it will be subtracted and interpreted as a negative when converting to an
        //   integral.
        if result.last().map_or(true, |last| last & 0x80 != 0) {
            result.push(if neg { 0x80 } else { 0 });
        } else if neg {
            if let Some(last) = result.last_mut() {
                *last |= 0x80;
            }
        }

        result
    }

    /// The value, clamped to ±(2**31-1).
    pub fn to_i32(&self) -> i32 {
        // Both bounds fit, so the cast is lossless.
        self.0.clamp(-Self::I32_BOUND, Self::I32_BOUND) as i32
    }

    /// The exact value.
    pub fn to_i64(&self) -> i64 {
        self.0
    }

    /// Is this less than zero?
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Is this zero?
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self + other`, failing rather than wrapping.
    pub fn checked_add(&self, other: &Number) -> Result<Self, Error> {
        self.0
            .checked_add(other.0)
            .map(Number)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// `self - other`, failing rather than wrapping.
    pub fn checked_sub(&self, other: &Number) -> Result<Self, Error> {
        self.0
            .checked_sub(other.0)
            .map(Number)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// `-self`, failing for the one value whose negation doesn’t fit.
    pub fn checked_neg(&self) -> Result<Self, Error> {
        self.0.checked_neg().map(Number).ok_or(Error::ArithmeticOverflow)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value)
    }
}

impl PartialEq<i64> for Number {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i64> for Number {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(self.0.cmp(other))
    }
}
