use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{Slot, SlotRange};

/// Tracks which slot ranges are currently hidden because an ancestor group is
/// collapsed.
///
/// Ranges are kept sorted, coalesced, and non-overlapping, so membership and
/// range-count queries are a binary search plus a short scan. Every "step to
/// next/previous visible slot" operation and every height aggregation over a
/// slot span consults this set.
#[derive(Clone, Debug, Default)]
pub struct RangeSet {
    ranges: Vec<SlotRange>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of tracked slots.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(SlotRange::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = SlotRange> + '_ {
        self.ranges.iter().copied()
    }

    fn find(&self, slot: Slot) -> Result<usize, usize> {
        self.ranges.binary_search_by(|r| {
            if r.end < slot {
                Ordering::Less
            } else if r.start > slot {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.find(slot).is_ok()
    }

    /// Number of tracked slots within `start..=end`.
    pub fn range_count(&self, start: Slot, end: Slot) -> usize {
        if start > end {
            return 0;
        }
        let i = self.ranges.partition_point(|r| r.end < start);
        let mut count = 0;
        for r in &self.ranges[i..] {
            if r.start > end {
                break;
            }
            count += r.end.min(end) - r.start.max(start) + 1;
        }
        count
    }

    /// Adds `range`, merging with any overlapping or adjacent tracked ranges.
    pub fn add_range(&mut self, range: SlotRange) {
        let mut start = range.start;
        let mut end = range.end;
        let lo = self.ranges.partition_point(|r| r.end + 1 < start);
        let mut hi = lo;
        while hi < self.ranges.len() && self.ranges[hi].start <= end.saturating_add(1) {
            start = start.min(self.ranges[hi].start);
            end = end.max(self.ranges[hi].end);
            hi += 1;
        }
        self.ranges
            .splice(lo..hi, core::iter::once(SlotRange::new(start, end)));
    }

    /// Removes `range`, splitting partially covered tracked ranges.
    pub fn remove_range(&mut self, range: SlotRange) {
        let lo = self.ranges.partition_point(|r| r.end < range.start);
        let mut hi = lo;
        let mut pieces: Vec<SlotRange> = Vec::new();
        while hi < self.ranges.len() && self.ranges[hi].start <= range.end {
            let r = self.ranges[hi];
            if r.start < range.start {
                pieces.push(SlotRange::new(r.start, range.start - 1));
            }
            if r.end > range.end {
                pieces.push(SlotRange::new(range.end + 1, r.end));
            }
            hi += 1;
        }
        self.ranges.splice(lo..hi, pieces);
    }

    /// Smallest slot `>= slot` that is not tracked.
    pub fn skip_forward(&self, mut slot: Slot) -> Slot {
        while let Ok(i) = self.find(slot) {
            slot = self.ranges[i].end + 1;
        }
        slot
    }

    /// Largest slot `<= slot` that is not tracked, if any.
    pub fn skip_backward(&self, mut slot: Slot) -> Option<Slot> {
        while let Ok(i) = self.find(slot) {
            slot = self.ranges[i].start.checked_sub(1)?;
        }
        Some(slot)
    }

    /// Shifts every tracked slot `>= slot` by `delta`.
    ///
    /// A range surrounding the shift point stretches (insertions into a
    /// collapsed region stay hidden). Removal callers are expected to
    /// `remove_range` the removed span first, so shrinking never crosses a
    /// range boundary.
    pub fn shift_from(&mut self, slot: Slot, delta: isize) {
        for r in &mut self.ranges {
            if r.end < slot {
                continue;
            }
            if r.start >= slot {
                r.start = r.start.saturating_add_signed(delta);
            }
            r.end = r.end.saturating_add_signed(delta);
        }
    }
}
