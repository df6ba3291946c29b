//! Capacity rounding and fill-ratio thresholds.

use crate::error::{Error, Result};
use crate::hash::WordWidth;

pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_FILL_RATIO: f32 = 0.875;
pub const MIN_CAPACITY: usize = 2;

/// Rounds `n` up to the next power of two, with a floor of [`MIN_CAPACITY`].
pub fn next_power_of_2<W: WordWidth>(n: usize) -> Result<usize> {
    if n <= MIN_CAPACITY {
        return Ok(MIN_CAPACITY);
    }
    let mut v: u64 = n as u64 - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    checked_capacity::<W>(v.wrapping_add(1), n as u64)
}

/// Capacity after one doubling of `capacity`.
pub fn grow<W: WordWidth>(capacity: usize) -> Result<usize> {
    let doubled: u64 = (capacity as u64).saturating_mul(2);
    checked_capacity::<W>(doubled, doubled)
}

/// Occupancy that triggers growth, clamped to `1..capacity`.
///
/// Ratios outside of `(0, 1)` are rounded to the nearest usable value rather than
/// rejected, so a table of capacity 2 always ends up with a threshold of 1.
pub fn threshold(capacity: usize, fill_ratio: f32) -> usize {
    let t: usize = (capacity as f32 * fill_ratio) as usize;
    t.clamp(1, capacity.saturating_sub(1).max(1))
}

fn checked_capacity<W: WordWidth>(capacity: u64, requested: u64) -> Result<usize> {
    let overflow = Error::CapacityOverflow {
        requested,
        max: W::MAX_CAPACITY,
    };
    // a smear of anything above 2^63 wraps to zero
    if capacity == 0 || capacity > W::MAX_CAPACITY {
        return Err(overflow);
    }
    usize::try_from(capacity).map_err(|_| overflow)
}
