//! The open-addressed table.
//!
//! Entries live inline in a power-of-two array and collide into neighbouring slots by
//! linear probing. Deletion slides the rest of the probe chain backward instead of
//! leaving tombstones, so lookups never walk over dead slots.
//!
//! Key 0 lives in its own optional field next to the array. Keeping it out of the array
//! bounds the array's occupancy by the threshold, which is always below the capacity,
//! so every probe chain ends at an empty slot.
//!
//! Growth is a single synchronous pass: the `set` that crosses the threshold pays for
//! rehashing every live entry. There is no incremental resizing.

use std::fmt::{self, Debug};
use std::iter;
use std::marker::PhantomData;
use std::mem;
use std::time::Instant;

use log::{debug, log_enabled, trace, Level};

use crate::error::Result;
use crate::growth::{self, DEFAULT_CAPACITY, DEFAULT_FILL_RATIO};
use crate::hash::{NativeWidth, WordWidth};
use crate::iter::{Cursor, Iter};

#[derive(Debug, Clone)]
pub(crate) struct Slot<V> {
    pub(crate) key: isize,
    pub(crate) value: V,
}

/// A map from `isize` keys to `V`, kept densely packed for data locality.
///
/// The primary use case is small to medium key sets with few deletions. An
/// unallocated map (see [`Default`]) allocates 8 slots with an 87.5% fill ratio on the
/// first insert. When the number of entries reaches the threshold the capacity is
/// doubled. Maps never shrink.
///
/// The map is not synchronized; share it across threads only behind a lock.
#[derive(Clone)]
pub struct IntMap<V, W: WordWidth = NativeWidth> {
    slots: Vec<Option<Slot<V>>>,
    // entries in `slots`; key 0 is not counted
    size: usize,
    threshold: usize,
    zero: Option<V>,
    width: PhantomData<W>,
}

impl<V> IntMap<V, NativeWidth> {
    /// Creates a map with room for `capacity` slots, rounded up to a power of two.
    ///
    /// See [`IntMap::init`] for how `capacity` and `fill_ratio` are rounded.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows the native word.
    ///
    /// ```
    /// use rusty_intmap::IntMap;
    ///
    /// let mut map = IntMap::new(8, 0.875);
    /// map.set(0, "zero");
    /// map.set(-7, "minus seven");
    /// assert_eq!(map.get(0), Some(&"zero"));
    /// assert_eq!(map.size(), 2);
    /// ```
    pub fn new(capacity: usize, fill_ratio: f32) -> Self {
        Self::with_capacity(capacity, fill_ratio)
    }

    pub fn try_new(capacity: usize, fill_ratio: f32) -> Result<Self> {
        Self::try_with_capacity(capacity, fill_ratio)
    }
}

impl<V, W: WordWidth> IntMap<V, W> {
    /// Same as [`IntMap::new`] for an explicit word width.
    pub fn with_capacity(capacity: usize, fill_ratio: f32) -> Self {
        let mut map: Self = Self::default();
        map.init(capacity, fill_ratio);
        map
    }

    pub fn try_with_capacity(capacity: usize, fill_ratio: f32) -> Result<Self> {
        let mut map: Self = Self::default();
        map.try_init(capacity, fill_ratio)?;
        Ok(map)
    }

    /// Resets the map to an empty table of the given capacity and fill ratio.
    ///
    /// The capacity is rounded up to the next power of two; values below 2 become 2.
    /// It may not exceed `W::MAX_CAPACITY` (2^30 for 32-bit words, 2^62 for 64-bit).
    ///
    /// The fill ratio should lie in `(0, 1)`. Other values are silently clamped so that
    /// the growth threshold stays within `1..capacity`; a capacity of 2 therefore always
    /// yields an effective ratio of 0.5.
    ///
    /// # Panics
    ///
    /// Panics if the rounded capacity overflows.
    pub fn init(&mut self, capacity: usize, fill_ratio: f32) {
        if let Err(e) = self.try_init(capacity, fill_ratio) {
            panic!("{e}");
        }
    }

    pub fn try_init(&mut self, capacity: usize, fill_ratio: f32) -> Result<()> {
        let capacity: usize = growth::next_power_of_2::<W>(capacity)?;
        self.slots = empty_slots(capacity);
        self.size = 0;
        self.threshold = growth::threshold(capacity, fill_ratio);
        self.zero = None;
        Ok(())
    }

    /// Sets the value for `key`, returning the value it replaces.
    ///
    /// The growth check runs before probing on every call for a nonzero key, so an
    /// overwrite made while the map sits at its threshold still doubles the table.
    /// Key 0 never triggers growth and never allocates.
    ///
    /// # Panics
    ///
    /// Panics if doubling the table would overflow the word width.
    pub fn set(&mut self, key: isize, value: V) -> Option<V> {
        match self.try_set(key, value) {
            Ok(previous) => previous,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_set(&mut self, key: isize, value: V) -> Result<Option<V>> {
        if key == 0 {
            return Ok(self.zero.replace(value));
        }
        if self.size >= self.threshold {
            self.grow()?;
        }
        Ok(self.place(key, value))
    }

    pub fn get(&self, key: isize) -> Option<&V> {
        if key == 0 {
            return self.zero.as_ref();
        }
        let idx: usize = self.find(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, key: isize) -> Option<&mut V> {
        if key == 0 {
            return self.zero.as_mut();
        }
        let idx: usize = self.find(key)?;
        self.slots[idx].as_mut().map(|slot| &mut slot.value)
    }

    pub fn contains_key(&self, key: isize) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key` and reports whether it was present.
    pub fn delete(&mut self, key: isize) -> bool {
        self.remove(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: isize) -> Option<V> {
        if key == 0 {
            return self.zero.take();
        }
        let idx: usize = self.find(key)?;
        self.remove_at(idx).map(|(slot, _)| slot.value)
    }

    /// Number of live keys.
    pub fn size(&self) -> usize {
        self.size + usize::from(self.zero.is_some())
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupancy at which the next `set` doubles the table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// All live keys, in no particular order.
    pub fn keys(&self) -> Vec<isize> {
        self.iter().map(|(key, _)| key).collect()
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self.zero.as_ref(), &self.slots, self.size())
    }

    /// Returns a cursor over the entries.
    ///
    /// ```
    /// use rusty_intmap::IntMap;
    ///
    /// let mut map = IntMap::new(8, 0.875);
    /// map.set(42, 21);
    /// map.set(22, 11);
    ///
    /// let mut cursor = map.cursor();
    /// while cursor.has_next() {
    ///     let (key, _) = cursor.next();
    ///     if key == 42 {
    ///         cursor.remove();
    ///     }
    /// }
    /// assert_eq!(map.keys(), vec![22]);
    /// ```
    pub fn cursor(&mut self) -> Cursor<'_, V, W> {
        Cursor::new(self)
    }

    pub(crate) fn zero(&self) -> Option<&V> {
        self.zero.as_ref()
    }

    pub(crate) fn zero_mut(&mut self) -> Option<&mut V> {
        self.zero.as_mut()
    }

    pub(crate) fn take_zero(&mut self) -> Option<V> {
        self.zero.take()
    }

    pub(crate) fn slot(&self, idx: usize) -> Option<&Slot<V>> {
        self.slots.get(idx)?.as_ref()
    }

    pub(crate) fn slot_mut(&mut self, idx: usize) -> Option<&mut Slot<V>> {
        self.slots.get_mut(idx)?.as_mut()
    }

    /// Empties slot `idx` and closes the gap.
    ///
    /// Also returns the key of the entry, if any, that the backward shift carried from
    /// the start of the array around to its end.
    pub(crate) fn remove_at(&mut self, idx: usize) -> Option<(Slot<V>, Option<isize>)> {
        let removed: Slot<V> = self.slots.get_mut(idx)?.take()?;
        self.size -= 1;
        let carried: Option<isize> = self.shift_back(idx);
        Some((removed, carried))
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    fn home(&self, key: isize) -> usize {
        W::hash(key) & self.mask()
    }

    fn find(&self, key: isize) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let mask: usize = self.mask();
        let start: usize = self.home(key);
        let mut idx: usize = start;
        loop {
            match &self.slots[idx] {
                None => return None,
                Some(slot) if slot.key == key => return Some(idx),
                Some(_) => {}
            }
            idx = (idx + 1) & mask;
            if idx == start {
                return None;
            }
        }
    }

    /// Probes for `key` and stores `value` without checking the threshold.
    fn place(&mut self, key: isize, value: V) -> Option<V> {
        let mask: usize = self.mask();
        let mut idx: usize = self.home(key);
        loop {
            match &mut self.slots[idx] {
                Some(slot) if slot.key == key => {
                    return Some(mem::replace(&mut slot.value, value));
                }
                Some(_) => idx = (idx + 1) & mask,
                None => break,
            }
        }
        self.slots[idx] = Some(Slot { key, value });
        self.size += 1;
        None
    }

    /// Stores an entry known to be absent into the first free slot of its probe chain.
    fn reinsert(&mut self, slot: Slot<V>) {
        let mask: usize = self.mask();
        let mut idx: usize = self.home(slot.key);
        while self.slots[idx].is_some() {
            idx = (idx + 1) & mask;
        }
        self.slots[idx] = Some(slot);
    }

    fn grow(&mut self) -> Result<()> {
        if self.slots.is_empty() {
            self.slots = empty_slots(DEFAULT_CAPACITY);
            self.threshold = growth::threshold(DEFAULT_CAPACITY, DEFAULT_FILL_RATIO);
            return Ok(());
        }
        let old_capacity: usize = self.capacity();
        let new_capacity: usize = growth::grow::<W>(old_capacity)?;
        let started: Option<Instant> = log_enabled!(Level::Trace).then(Instant::now);
        let old: Vec<Option<Slot<V>>> = mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.threshold <<= 1;
        for slot in old.into_iter().flatten() {
            self.reinsert(slot);
        }
        debug!(
            "grew table from {} to {} slots, {} entries",
            old_capacity, new_capacity, self.size
        );
        if let Some(now) = started {
            trace!(
                "avg time to rehash an entry {} ns",
                now.elapsed().as_nanos() as f64 / self.size.max(1) as f64
            );
        }
        Ok(())
    }

    /// Slides the entries following `gap` backward until the chain ends.
    ///
    /// An entry may only move into the gap if the gap lies on its probe path, i.e.
    /// cyclically between its home slot and its current slot.
    fn shift_back(&mut self, mut gap: usize) -> Option<isize> {
        let mask: usize = self.mask();
        let mut carried: Option<isize> = None;
        let mut idx: usize = gap;
        loop {
            idx = (idx + 1) & mask;
            let home: usize = match &self.slots[idx] {
                None => return carried,
                Some(slot) => self.home(slot.key),
            };
            if (gap.wrapping_sub(home) & mask) < (idx.wrapping_sub(home) & mask) {
                if idx < gap {
                    carried = self.slots[idx].as_ref().map(|slot| slot.key);
                }
                self.slots[gap] = self.slots[idx].take();
                gap = idx;
            }
        }
    }
}

fn empty_slots<V>(capacity: usize) -> Vec<Option<Slot<V>>> {
    iter::repeat_with(|| None).take(capacity).collect()
}

impl<V, W: WordWidth> Default for IntMap<V, W> {
    /// An unallocated map; the first `set` allocates the default capacity.
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            size: 0,
            threshold: 0,
            zero: None,
            width: PhantomData,
        }
    }
}

impl<V: Debug, W: WordWidth> Debug for IntMap<V, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, W: WordWidth> FromIterator<(isize, V)> for IntMap<V, W> {
    fn from_iter<T: IntoIterator<Item = (isize, V)>>(iter: T) -> Self {
        let mut map: Self = Self::default();
        map.extend(iter);
        map
    }
}

impl<V, W: WordWidth> Extend<(isize, V)> for IntMap<V, W> {
    fn extend<T: IntoIterator<Item = (isize, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'a, V, W: WordWidth> IntoIterator for &'a IntMap<V, W> {
    type Item = (isize, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{W32, W64};
    use crate::Error;

    #[test]
    fn test_default_is_unallocated() {
        let map: IntMap<u32> = IntMap::default();
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.threshold(), 0);
        assert_eq!(map.get(5), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_first_set_allocates_default_capacity() {
        let mut map: IntMap<u32> = IntMap::default();
        map.set(5, 50);
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.threshold(), 7);
        assert_eq!(map.get(5), Some(&50));
    }

    #[test]
    fn test_delete_on_unallocated_map() {
        let mut map: IntMap<u32> = IntMap::default();
        assert!(!map.delete(1));
        assert!(!map.delete(0));
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn test_new_rounds_capacity() {
        let map: IntMap<()> = IntMap::new(5, 0.5);
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.threshold(), 4);
        let map: IntMap<()> = IntMap::new(0, 0.5);
        assert_eq!(map.capacity(), 2);
        assert_eq!(map.threshold(), 1);
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut map: IntMap<String> = IntMap::new(8, 0.875);
        for k in [-5isize, -1, 0, 1, 2, 1000, isize::MAX, isize::MIN] {
            assert_eq!(map.set(k, k.to_string()), None);
        }
        for k in [-5isize, -1, 0, 1, 2, 1000, isize::MAX, isize::MIN] {
            assert_eq!(map.get(k), Some(&k.to_string()));
        }
        assert_eq!(map.size(), 8);
    }

    #[test]
    fn test_overwrite_keeps_size() {
        let mut map: IntMap<&str> = IntMap::new(8, 0.875);
        assert_eq!(map.set(3, "a"), None);
        assert_eq!(map.set(3, "b"), Some("a"));
        assert_eq!(map.size(), 1);
        assert_eq!(map.get(3), Some(&"b"));
    }

    #[test]
    fn test_zero_key() {
        let mut map: IntMap<&str> = IntMap::new(8, 0.875);
        map.set(0, "zero");
        assert_eq!(map.get(0), Some(&"zero"));
        assert_eq!(map.size(), 1);
        assert!(map.delete(0));
        assert_eq!(map.get(0), None);
        assert!(!map.delete(0));
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn test_zero_key_does_not_count_toward_growth() {
        let mut map: IntMap<isize> = IntMap::new(8, 0.875);
        map.set(0, 0);
        for k in 1..=7 {
            map.set(k, k);
        }
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.size(), 8);
        // the array sits at its threshold; misses still terminate
        for k in [8isize, -1, 1 << 40, isize::MIN] {
            assert_eq!(map.get(k), None);
            assert!(!map.delete(k));
        }
        map.set(0, 100);
        assert_eq!(map.capacity(), 8);
        map.set(8, 8);
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.size(), 9);
        assert_eq!(map.get(0), Some(&100));
        for k in 1..=8 {
            assert_eq!(map.get(k), Some(&k));
        }
    }

    #[test]
    fn test_zero_key_on_unallocated_map() {
        let mut map: IntMap<&str> = IntMap::default();
        assert_eq!(map.set(0, "zero"), None);
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.get(0), Some(&"zero"));
        assert_eq!(map.keys(), vec![0]);
        assert_eq!(map.remove(0), Some("zero"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_delete_absent_key() {
        let mut map: IntMap<u8> = IntMap::new(8, 0.875);
        map.set(1, 1);
        assert!(!map.delete(2));
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn test_growth_trigger() {
        let mut map: IntMap<isize> = IntMap::new(8, 0.875);
        assert_eq!((map.capacity(), map.threshold()), (8, 7));
        for k in 1..=7 {
            map.set(k, k * 10);
        }
        assert_eq!(map.capacity(), 8);
        map.set(8, 80);
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.threshold(), 14);
        for k in 1..=8 {
            assert_eq!(map.get(k), Some(&(k * 10)));
        }
    }

    #[test]
    fn test_overwrite_at_threshold_grows() {
        let mut map: IntMap<isize> = IntMap::new(8, 0.875);
        for k in 1..=7 {
            map.set(k, k);
        }
        map.set(3, 33);
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.size(), 7);
        assert_eq!(map.get(3), Some(&33));
    }

    #[test]
    fn test_init_resets_contents() {
        let mut map: IntMap<u8> = IntMap::new(8, 0.875);
        map.set(1, 1);
        map.set(0, 0);
        map.init(32, 0.5);
        assert_eq!(map.size(), 0);
        assert_eq!(map.capacity(), 32);
        assert_eq!(map.threshold(), 16);
        assert_eq!(map.get(1), None);
        assert_eq!(map.get(0), None);
    }

    #[test]
    fn test_try_init_overflow() {
        let mut map: IntMap<u8, W32> = IntMap::default();
        assert_eq!(
            map.try_init(0x8000_0000, 0.5),
            Err(Error::CapacityOverflow {
                requested: 0x8000_0000,
                max: 0x4000_0000
            })
        );
        let mut map: IntMap<u8, W64> = IntMap::default();
        assert!(map.try_init(usize::MAX, 0.5).is_err());
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn test_init_overflow_panics() {
        let _map: IntMap<u8, W32> = IntMap::with_capacity(usize::MAX, 0.5);
    }

    #[test]
    fn test_backward_shift_keeps_chain_reachable() {
        // keys sharing a home slot form one chain; removing from its middle must not
        // strand the tail
        let mut map: IntMap<usize> = IntMap::new(64, 0.5);
        let home: usize = map.home(1);
        let colliding: Vec<isize> = (1..100_000isize)
            .filter(|&k| map.home(k) == home)
            .take(6)
            .collect();
        assert_eq!(colliding.len(), 6);
        for (i, &k) in colliding.iter().enumerate() {
            map.set(k, i);
        }
        assert!(map.delete(colliding[2]));
        for (i, &k) in colliding.iter().enumerate() {
            if i == 2 {
                assert_eq!(map.get(k), None);
            } else {
                assert_eq!(map.get(k), Some(&i));
            }
        }
        assert_eq!(map.size(), 5);
    }

    #[test]
    fn test_wraparound_chain() {
        let mut map: IntMap<isize> = IntMap::new(16, 0.875);
        let mask: usize = map.capacity() - 1;
        let tail: Vec<isize> = (1..100_000isize)
            .filter(|&k| map.home(k) == mask)
            .take(4)
            .collect();
        for &k in &tail {
            map.set(k, -k);
        }
        // chain occupies the last slot and wraps to the front
        assert!(map.slot(0).is_some());
        assert!(map.delete(tail[0]));
        for &k in &tail[1..] {
            assert_eq!(map.get(k), Some(&-k));
        }
        assert!(map.slot(mask).is_some());
    }

    #[test]
    fn test_keys_match_size() {
        let mut map: IntMap<()> = IntMap::new(4, 0.875);
        for k in -10..10 {
            map.set(k, ());
        }
        map.delete(3);
        let mut keys: Vec<isize> = map.keys();
        keys.sort_unstable();
        let expected: Vec<isize> = (-10..10).filter(|&k| k != 3).collect();
        assert_eq!(keys, expected);
        assert_eq!(keys.len(), map.size());
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut map: IntMap<Vec<u8>> = IntMap::new(8, 0.875);
        map.set(9, vec![1]);
        if let Some(v) = map.get_mut(9) {
            v.push(2);
        }
        assert_eq!(map.remove(9), Some(vec![1, 2]));
        assert!(!map.contains_key(9));
    }

    #[test]
    fn test_from_iterator_extend_and_debug() {
        let mut map: IntMap<u8> = vec![(1, 10), (2, 20)].into_iter().collect();
        map.extend([(3, 30)]);
        assert_eq!(map.size(), 3);
        assert_eq!(format!("{:?}", IntMap::<u8>::from_iter([(7, 1)])), "{7: 1}");
    }

    #[test]
    fn test_w32_map_on_any_host() {
        let mut map: IntMap<isize, W32> = IntMap::with_capacity(2, 0.875);
        for k in -500..500 {
            map.set(k, k * 2);
        }
        for k in -500..500 {
            assert_eq!(map.get(k), Some(&(k * 2)));
        }
        assert_eq!(map.size(), 1000);
    }
}
