use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::collapsed::RangeSet;
use crate::{Error, Result, Slot, SlotKind, SlotRange};

#[derive(Clone, Debug)]
struct WindowEntry<E> {
    kind: SlotKind,
    element: E,
}

/// Per-kind LIFO pools of recycled elements.
///
/// Pools are trimmed by the owner (`trim`), which bounds the memory retained
/// after a large scroll-away event.
#[derive(Clone, Debug)]
pub struct RecyclePools<E> {
    rows: Vec<E>,
    headers: Vec<E>,
    footers: Vec<E>,
}

impl<E> RecyclePools<E> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            headers: Vec::new(),
            footers: Vec::new(),
        }
    }

    fn pool(&self, kind: SlotKind) -> &Vec<E> {
        match kind {
            SlotKind::Row => &self.rows,
            SlotKind::GroupHeader => &self.headers,
            SlotKind::GroupFooter => &self.footers,
        }
    }

    fn pool_mut(&mut self, kind: SlotKind) -> &mut Vec<E> {
        match kind {
            SlotKind::Row => &mut self.rows,
            SlotKind::GroupHeader => &mut self.headers,
            SlotKind::GroupFooter => &mut self.footers,
        }
    }

    pub fn push(&mut self, kind: SlotKind, element: E) {
        self.pool_mut(kind).push(element);
    }

    pub fn pop(&mut self, kind: SlotKind) -> Option<E> {
        self.pool_mut(kind).pop()
    }

    pub fn len(&self, kind: SlotKind) -> usize {
        self.pool(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.headers.is_empty() && self.footers.is_empty()
    }

    /// Drops elements beyond `max_per_kind` from each pool.
    pub fn trim(&mut self, max_per_kind: usize) {
        self.rows.truncate(max_per_kind);
        self.headers.truncate(max_per_kind);
        self.footers.truncate(max_per_kind);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.headers.clear();
        self.footers.clear();
    }
}

impl<E> Default for RecyclePools<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The bounded, recycled set of realized elements covering the currently
/// visible slot range.
///
/// Elements are held in a deque so growth and shrink at either end are O(1)
/// amortized; the deque's own ring arithmetic replaces explicit head-offset
/// bookkeeping. Collapsed slots inside the realized range hold no element:
/// `element_at` subtracts their count rather than shifting the slot space.
///
/// The element type `E` is opaque; the window never inspects it.
#[derive(Clone, Debug)]
pub struct ElementWindow<E> {
    range: Option<SlotRange>,
    elements: VecDeque<WindowEntry<E>>,
    pools: RecyclePools<E>,
}

impl<E> ElementWindow<E> {
    pub fn new() -> Self {
        Self {
            range: None,
            elements: VecDeque::new(),
            pools: RecyclePools::new(),
        }
    }

    pub fn first_slot(&self) -> Option<Slot> {
        self.range.map(|r| r.start)
    }

    pub fn last_slot(&self) -> Option<Slot> {
        self.range.map(|r| r.end)
    }

    pub fn slot_range(&self) -> Option<SlotRange> {
        self.range
    }

    /// Number of realized elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn index_of(&self, slot: Slot, collapsed: &RangeSet) -> Option<usize> {
        let range = self.range?;
        if !range.contains(slot) || collapsed.contains(slot) {
            return None;
        }
        Some(slot - range.start - collapsed.range_count(range.start, slot))
    }

    /// Realizes `element` at `slot`.
    ///
    /// An empty window is seeded at `slot`. Otherwise `slot` must be adjacent
    /// to the realized range: the previous visible slot before `first_slot`,
    /// or the next visible slot after `last_slot`. With `update_range` unset
    /// the element is placed but the range is left for the caller to adjust.
    pub fn load(
        &mut self,
        slot: Slot,
        kind: SlotKind,
        element: E,
        update_range: bool,
        collapsed: &RangeSet,
    ) -> Result<()> {
        let entry = WindowEntry { kind, element };
        let Some(range) = self.range else {
            vtrace!(slot, "window seed");
            self.elements.push_back(entry);
            if update_range {
                self.range = Some(SlotRange::new(slot, slot));
            }
            return Ok(());
        };

        let before = range
            .start
            .checked_sub(1)
            .and_then(|s| collapsed.skip_backward(s));
        let after = collapsed.skip_forward(range.end + 1);

        if before == Some(slot) {
            self.elements.push_front(entry);
            if update_range {
                self.range = Some(SlotRange::new(slot, range.end));
            }
            Ok(())
        } else if slot == after {
            self.elements.push_back(entry);
            if update_range {
                self.range = Some(SlotRange::new(range.start, slot));
            }
            Ok(())
        } else {
            Err(Error::NonAdjacentSlot { slot })
        }
    }

    /// Removes and returns the element realized at `slot`.
    ///
    /// With `update_range`, a boundary removal shrinks the range toward the
    /// nearest remaining visible slot, resetting to the empty state when the
    /// range inverts. A mid-range removal leaves the range alone; the caller
    /// is about to mark the slot collapsed (or fix the range itself).
    pub fn unload(
        &mut self,
        slot: Slot,
        update_range: bool,
        collapsed: &RangeSet,
    ) -> Option<(SlotKind, E)> {
        let index = self.index_of(slot, collapsed)?;
        let entry = self.elements.remove(index)?;
        if update_range {
            let range = self.range?;
            if range.start == range.end {
                self.range = None;
            } else if slot == range.start {
                let next = collapsed.skip_forward(slot + 1);
                self.range = (next <= range.end).then(|| SlotRange::new(next, range.end));
            } else if slot == range.end {
                let prev = collapsed
                    .skip_backward(slot - 1)
                    .filter(|&p| p >= range.start);
                self.range = prev.map(|p| SlotRange::new(range.start, p));
            }
            if self.range.is_none() {
                self.elements.clear();
            }
        }
        Some((entry.kind, entry.element))
    }

    /// The element realized at `slot`, or `None` outside the realized range
    /// (or on a collapsed slot).
    pub fn element_at(&self, slot: Slot, collapsed: &RangeSet) -> Option<&E> {
        let index = self.index_of(slot, collapsed)?;
        self.elements.get(index).map(|e| &e.element)
    }

    pub fn element_at_mut(&mut self, slot: Slot, collapsed: &RangeSet) -> Option<&mut E> {
        let index = self.index_of(slot, collapsed)?;
        self.elements.get_mut(index).map(|e| &mut e.element)
    }

    /// Detaches `element` from its logical slot and pushes it onto the pool
    /// for `kind`.
    pub fn recycle(&mut self, kind: SlotKind, element: E) {
        self.pools.push(kind, element);
    }

    /// Pops a previously recycled element of `kind`, most recently recycled
    /// first.
    pub fn acquire_recycled(&mut self, kind: SlotKind) -> Option<E> {
        self.pools.pop(kind)
    }

    pub fn pooled(&self, kind: SlotKind) -> usize {
        self.pools.len(kind)
    }

    pub fn trim_pools(&mut self, max_per_kind: usize) {
        self.pools.trim(max_per_kind);
    }

    /// Empties the window. With `recycle_all`, every realized element is
    /// pushed to its pool first; otherwise the pools are discarded too (full
    /// dataset reset).
    pub fn clear(&mut self, recycle_all: bool) {
        if recycle_all {
            while let Some(entry) = self.elements.pop_front() {
                self.pools.push(entry.kind, entry.element);
            }
        } else {
            self.elements.clear();
            self.pools.clear();
        }
        self.range = None;
    }

    pub(crate) fn set_range(&mut self, range: Option<SlotRange>) {
        self.range = range;
    }

    pub(crate) fn shift_range(&mut self, delta: isize) {
        if let Some(r) = self.range {
            self.range = Some(SlotRange::new(
                r.start.saturating_add_signed(delta),
                r.end.saturating_add_signed(delta),
            ));
        }
    }
}

impl<E> Default for ElementWindow<E> {
    fn default() -> Self {
        Self::new()
    }
}
