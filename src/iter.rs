//! Traversal over an [`IntMap`].

use std::iter::FusedIterator;
use std::slice;

use crate::hash::{NativeWidth, WordWidth};
use crate::map::{IntMap, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    /// Key 0 is positioned and not yet handed out.
    ZeroPending,
    ZeroReturned,
    /// The next scan starts at this slot, inclusive.
    Before(usize),
    /// The slot holds an entry `next` has not handed out yet.
    Pending(usize),
    /// The slot holds the entry `next` handed out last.
    Returned(usize),
    Exhausted,
}

/// A cursor over the entries of a map that tolerates removing the entry it just
/// returned.
///
/// ```
/// use rusty_intmap::IntMap;
///
/// let mut map: IntMap<i32> = (1..=4).map(|k| (k, k as i32)).collect();
/// let mut cursor = map.cursor();
/// while cursor.has_next() {
///     let (_, &value) = cursor.next();
///     if value % 2 == 0 {
///         cursor.remove();
///     }
/// }
/// assert_eq!(map.size(), 2);
/// ```
///
/// The cursor holds the map's only mutable borrow, so the one mutation allowed during
/// traversal is [`Cursor::remove`] (and editing values through [`Cursor::value_mut`]).
#[derive(Debug)]
pub struct Cursor<'a, V, W: WordWidth = NativeWidth> {
    map: &'a mut IntMap<V, W>,
    position: Position,
    // keys that a backward shift moved from visited slots into unvisited ones
    visited: Vec<isize>,
}

impl<'a, V, W: WordWidth> Cursor<'a, V, W> {
    pub(crate) fn new(map: &'a mut IntMap<V, W>) -> Self {
        Self {
            map,
            position: Position::Start,
            visited: Vec::new(),
        }
    }

    /// Returns true if there are entries left to read.
    ///
    /// Calling it again before [`Cursor::next`] does not advance the cursor.
    pub fn has_next(&mut self) -> bool {
        match self.position {
            Position::Start if self.map.zero().is_some() => {
                self.position = Position::ZeroPending;
                true
            }
            Position::Start | Position::ZeroReturned => self.seek(0),
            Position::ZeroPending => true,
            Position::Before(from) => self.seek(from),
            Position::Pending(_) => true,
            Position::Returned(at) => self.seek(at + 1),
            Position::Exhausted => false,
        }
    }

    /// Returns the current entry. Calling `next` several times in a row without
    /// `has_next` in between yields the same entry.
    ///
    /// # Panics
    ///
    /// Panics if no entry is positioned, i.e. `has_next` returned false or the entry
    /// was just removed. Before the first `has_next` only key 0 can be positioned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> (isize, &V) {
        let idx: usize = match self.position {
            Position::Pending(idx) | Position::Returned(idx) => idx,
            Position::Start | Position::ZeroPending | Position::ZeroReturned => {
                self.position = Position::ZeroReturned;
                match self.map.zero() {
                    Some(value) => return (0, value),
                    None => panic!("Cursor::next called without a successful has_next"),
                }
            }
            Position::Before(_) | Position::Exhausted => {
                panic!("Cursor::next called without a successful has_next")
            }
        };
        self.position = Position::Returned(idx);
        match self.map.slot(idx) {
            Some(slot) => (slot.key, &slot.value),
            None => panic!("Cursor::next called on an empty slot"),
        }
    }

    /// Mutable access to the value last returned by [`Cursor::next`].
    pub fn value_mut(&mut self) -> Option<&mut V> {
        match self.position {
            Position::ZeroReturned => self.map.zero_mut(),
            Position::Returned(idx) => self.map.slot_mut(idx).map(|slot| &mut slot.value),
            _ => None,
        }
    }

    /// Removes the entry last returned by [`Cursor::next`] and returns its value.
    ///
    /// Entries that slide into the freed slot are still visited exactly once.
    pub fn remove(&mut self) -> Option<V> {
        let idx: usize = match self.position {
            Position::ZeroReturned => {
                self.position = Position::Before(0);
                return self.map.take_zero();
            }
            Position::Returned(idx) => idx,
            _ => return None,
        };
        let (slot, carried) = self.map.remove_at(idx)?;
        if let Some(key) = carried {
            self.visited.push(key);
        }
        self.position = Position::Before(idx);
        Some(slot.value)
    }

    fn seek(&mut self, from: usize) -> bool {
        for idx in from..self.map.capacity() {
            let key: isize = match self.map.slot(idx) {
                Some(slot) => slot.key,
                None => continue,
            };
            if let Some(i) = self.visited.iter().position(|&k| k == key) {
                self.visited.swap_remove(i);
                continue;
            }
            self.position = Position::Pending(idx);
            return true;
        }
        self.position = Position::Exhausted;
        false
    }
}

/// Borrowing iterator over `(key, &value)` pairs, key 0 first, then in slot order.
#[derive(Debug)]
pub struct Iter<'a, V> {
    zero: Option<&'a V>,
    slots: slice::Iter<'a, Option<Slot<V>>>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(zero: Option<&'a V>, slots: &'a [Option<Slot<V>>], len: usize) -> Self {
        Self {
            zero,
            slots: slots.iter(),
            remaining: len,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (isize, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(value) = self.zero.take() {
            self.remaining -= 1;
            return Some((0, value));
        }
        let slot: &'a Slot<V> = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((slot.key, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}
