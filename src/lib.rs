//! A fast `isize`-keyed map. Entries are kept densely packed in a single
//! open-addressed array to improve data locality.
//!
//! Lookups start at a Fibonacci hash of the key and probe linearly. Deletion shifts the
//! rest of the probe chain backward, so the array never holds tombstones.
//!
//! The best fit is small maps, regardless of the size of the key space, with few
//! deletions. The map is not thread-safe.

pub mod error;
pub mod growth;
pub mod hash;
pub mod iter;
pub mod map;

pub use error::{Error, Result};
pub use hash::{NativeWidth, WordWidth, W32, W64};
pub use iter::{Cursor, Iter};
pub use map::IntMap;
