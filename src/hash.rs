//! Integer mixing functions, one per native word width.
//!
//! Keys are multiplied by a constant integral value equal to 2^N divided by the golden
//! ratio, then folded onto themselves so that the low bits used for masking pick up
//! entropy from the high half of the product.
//!
//! The golden ratio can be calculated with Python 3 using the following statements:
//!
//! ```text
//! from decimal import Decimal
//! golden_ratio = Decimal((Decimal(1.0) + Decimal.sqrt(Decimal(5.0)))/ Decimal(2.0))
//! golden_ratio
//! 1.618033988749894848204586834
//! ```
//!
//! For 64-bit words use 2^64 / golden_ratio = 0x9E3779B97F4A7C15
//! For 32-bit words use 2^32 / golden_ratio = 0x9E3779B9

use std::fmt::Debug;

/// Word width a map hashes its keys with.
///
/// Both implementations honour the same contract and differ only in the mixing constant
/// and the largest capacity they allow.
pub trait WordWidth: Debug + Clone + Copy + Default {
    const BITS: u32;
    const MULTIPLIER: u64;
    /// Largest power of two a table may hold without overflowing the signed word.
    const MAX_CAPACITY: u64;

    fn hash(key: isize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct W32;

#[derive(Debug, Clone, Copy, Default)]
pub struct W64;

impl WordWidth for W32 {
    const BITS: u32 = 32;
    const MULTIPLIER: u64 = 0x9E37_79B9;
    const MAX_CAPACITY: u64 = 0x4000_0000;

    #[inline]
    fn hash(key: isize) -> usize {
        let v: i32 = (key as i32).wrapping_mul(Self::MULTIPLIER as u32 as i32);
        (v ^ (v >> (Self::BITS / 2))) as u32 as usize
    }
}

impl WordWidth for W64 {
    const BITS: u32 = 64;
    const MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;
    const MAX_CAPACITY: u64 = 0x4000_0000_0000_0000;

    #[inline]
    fn hash(key: isize) -> usize {
        let v: i64 = (key as i64).wrapping_mul(Self::MULTIPLIER as i64);
        (v ^ (v >> (Self::BITS / 2))) as u64 as usize
    }
}

#[cfg(target_pointer_width = "64")]
pub type NativeWidth = W64;

#[cfg(not(target_pointer_width = "64"))]
pub type NativeWidth = W32;
