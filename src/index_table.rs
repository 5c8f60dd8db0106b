use alloc::vec::Vec;

use crate::Slot;

/// Sparse ordered map from slot to metadata.
///
/// Group headers and footers are sparse relative to rows, so a sorted vector
/// with binary search is the right shape here: predecessor/successor and
/// range-count queries are one partition point away and storage stays
/// contiguous. All slot arithmetic in the grid (row ↔ slot conversion,
/// "next keyed slot") is expressed through this table.
#[derive(Clone, Debug, Default)]
pub struct SlotTable<T> {
    entries: Vec<(Slot, T)>,
}

impl<T> SlotTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, slot: Slot) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&slot, |(s, _)| *s)
    }

    /// Inserts or replaces the value at `slot`, returning the previous value.
    pub fn add_value(&mut self, slot: Slot, value: T) -> Option<T> {
        match self.position(slot) {
            Ok(i) => Some(core::mem::replace(&mut self.entries[i].1, value)),
            Err(i) => {
                self.entries.insert(i, (slot, value));
                None
            }
        }
    }

    pub fn remove_value(&mut self, slot: Slot) -> Option<T> {
        match self.position(slot) {
            Ok(i) => Some(self.entries.remove(i).1),
            Err(_) => None,
        }
    }

    pub fn value_at(&self, slot: Slot) -> Option<&T> {
        match self.position(slot) {
            Ok(i) => Some(&self.entries[i].1),
            Err(_) => None,
        }
    }

    pub fn value_at_mut(&mut self, slot: Slot) -> Option<&mut T> {
        match self.position(slot) {
            Ok(i) => Some(&mut self.entries[i].1),
            Err(_) => None,
        }
    }

    pub fn contains_index(&self, slot: Slot) -> bool {
        self.position(slot).is_ok()
    }

    /// Smallest keyed slot strictly greater than `slot`.
    pub fn next_index(&self, slot: Slot) -> Option<Slot> {
        let i = match self.position(slot) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        self.entries.get(i).map(|(s, _)| *s)
    }

    /// Largest keyed slot strictly less than `slot`.
    pub fn previous_index(&self, slot: Slot) -> Option<Slot> {
        let i = match self.position(slot) {
            Ok(i) | Err(i) => i,
        };
        i.checked_sub(1).map(|i| self.entries[i].0)
    }

    /// Lazy ascending iteration over keyed slots `>= start`.
    pub fn indexes_from(&self, start: Slot) -> impl Iterator<Item = Slot> + '_ {
        let i = match self.position(start) {
            Ok(i) | Err(i) => i,
        };
        self.entries[i..].iter().map(|(s, _)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries.iter().map(|(s, v)| (*s, v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn index_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keyed slots within `start..=end`.
    pub fn range_count(&self, start: Slot, end: Slot) -> usize {
        if start > end {
            return 0;
        }
        let lo = self.entries.partition_point(|(s, _)| *s < start);
        let hi = self.entries.partition_point(|(s, _)| *s <= end);
        hi - lo
    }

    /// Shifts every keyed slot `>= slot` by `delta`.
    ///
    /// Used by dataset change notifications: inserting or removing rows moves
    /// all later keyed slots without touching their values. Callers must
    /// remove any keys inside a removed span before shifting down.
    pub fn shift_from(&mut self, slot: Slot, delta: isize) {
        let i = self.entries.partition_point(|(s, _)| *s < slot);
        for (s, _) in &mut self.entries[i..] {
            *s = s.saturating_add_signed(delta);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
