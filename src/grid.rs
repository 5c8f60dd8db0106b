use alloc::vec::Vec;

use crate::collapsed::RangeSet;
use crate::index_table::SlotTable;
use crate::options::GridOptions;
use crate::resolver::{ExtentSource, ResolveInput, ResolvedWindow, resolve_window};
use crate::window::ElementWindow;
use crate::{Error, GroupInfo, Result, Slot, SlotKind, SlotRange};

/// The virtualization coordinator for one grid axis worth of rows.
///
/// Owns the slot address space (rows interleaved with group headers and
/// footers), the collapsed-range bookkeeping, and the window of realized
/// elements. Scrolling, dataset edits, and group collapse/expand all funnel
/// through here so the three structures stay consistent.
///
/// `E` is the opaque element type produced by the configured factory hook.
#[derive(Clone, Debug)]
pub struct GridVirtualizer<E> {
    options: GridOptions<E>,
    slot_count: usize,
    groups: SlotTable<GroupInfo>,
    /// Footer slot to owning header slot.
    footers: SlotTable<Slot>,
    collapsed: RangeSet,
    window: ElementWindow<E>,
    scroll_offset: f64,
    negative_offset: f64,
    first_scrolling_slot: Option<Slot>,
    last_resolved: ResolvedWindow,
}

impl<E> GridVirtualizer<E> {
    pub fn new(options: GridOptions<E>) -> Self {
        Self {
            options,
            slot_count: 0,
            groups: SlotTable::new(),
            footers: SlotTable::new(),
            collapsed: RangeSet::new(),
            window: ElementWindow::new(),
            scroll_offset: 0.0,
            negative_offset: 0.0,
            first_scrolling_slot: None,
            last_resolved: ResolvedWindow::default(),
        }
    }

    pub fn options(&self) -> &GridOptions<E> {
        &self.options
    }

    pub fn set_options(&mut self, options: GridOptions<E>) {
        self.options = options;
    }

    /// Replaces the whole address space from a dataset snapshot.
    ///
    /// `groups` carries the header metadata in any order; geometry
    /// (`slot`/`last_sub_item_slot`) must describe the final address space.
    /// Realized elements and recycle pools are discarded.
    pub fn rebuild(&mut self, slot_count: usize, groups: impl IntoIterator<Item = GroupInfo>) {
        self.groups.clear();
        self.footers.clear();
        self.collapsed.clear();
        self.window.clear(false);
        self.slot_count = slot_count;
        self.scroll_offset = 0.0;
        self.negative_offset = 0.0;
        self.first_scrolling_slot = None;
        self.last_resolved = ResolvedWindow::default();
        for info in groups {
            if let Some(footer) = info.footer_slot() {
                self.footers.add_value(footer, info.slot);
            }
            self.groups.add_value(info.slot, info);
        }
        vdebug!(slot_count, groups = self.groups.index_count(), "rebuild");
    }

    pub fn reset(&mut self) {
        self.rebuild(0, core::iter::empty());
    }

    // Address space queries.

    /// Total slots, hidden ones included.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Slots not hidden inside a collapsed group.
    pub fn visible_slot_count(&self) -> usize {
        self.slot_count - self.collapsed.len()
    }

    /// Data rows only (headers and footers excluded).
    pub fn row_count(&self) -> usize {
        self.slot_count - self.groups.index_count() - self.footers.index_count()
    }

    pub fn slot_kind(&self, slot: Slot) -> SlotKind {
        if self.groups.contains_index(slot) {
            SlotKind::GroupHeader
        } else if self.footers.contains_index(slot) {
            SlotKind::GroupFooter
        } else {
            SlotKind::Row
        }
    }

    pub fn group_info(&self, header_slot: Slot) -> Option<&GroupInfo> {
        self.groups.value_at(header_slot)
    }

    /// Header metadata for the footer at `footer_slot`.
    pub fn group_of_footer(&self, footer_slot: Slot) -> Option<&GroupInfo> {
        let header = *self.footers.value_at(footer_slot)?;
        self.groups.value_at(header)
    }

    pub fn is_slot_visible(&self, slot: Slot) -> bool {
        slot < self.slot_count && !self.collapsed.contains(slot)
    }

    pub fn first_visible_slot(&self) -> Option<Slot> {
        let slot = self.collapsed.skip_forward(0);
        (slot < self.slot_count).then_some(slot)
    }

    pub fn last_visible_slot(&self) -> Option<Slot> {
        self.collapsed.skip_backward(self.slot_count.checked_sub(1)?)
    }

    pub fn next_visible_slot(&self, slot: Slot) -> Option<Slot> {
        let next = self.collapsed.skip_forward(slot + 1);
        (next < self.slot_count).then_some(next)
    }

    pub fn previous_visible_slot(&self, slot: Slot) -> Option<Slot> {
        self.collapsed.skip_backward(slot.checked_sub(1)?)
    }

    /// Row ordinal of a row slot, ignoring headers/footers. `None` for
    /// header/footer slots and out-of-range slots.
    pub fn row_index_of_slot(&self, slot: Slot) -> Option<usize> {
        if slot >= self.slot_count || self.slot_kind(slot) != SlotKind::Row {
            return None;
        }
        Some(slot - self.groups.range_count(0, slot) - self.footers.range_count(0, slot))
    }

    /// Slot of the `row_index`-th data row.
    pub fn slot_of_row_index(&self, row_index: usize) -> Option<Slot> {
        // Fixpoint: keep pushing the candidate past the headers/footers that
        // precede it until the non-row count stabilizes.
        let mut slot = row_index;
        loop {
            if slot >= self.slot_count {
                return None;
            }
            let next = row_index
                + self.groups.range_count(0, slot)
                + self.footers.range_count(0, slot);
            if next == slot {
                return Some(slot);
            }
            slot = next;
        }
    }

    /// Sum of the extents of the visible slots in `start..=end`.
    pub fn visible_extent_between(&self, start: Slot, end: Slot) -> f64 {
        let mut total = 0.0;
        let mut slot = self.collapsed.skip_forward(start);
        while slot <= end && slot < self.slot_count {
            total += (self.options.slot_extent)(slot, self.slot_kind(slot));
            slot = self.collapsed.skip_forward(slot + 1);
        }
        total
    }

    // Dataset change notifications.

    /// Makes room for `count` new row slots starting at `slot`.
    ///
    /// Groups whose range contains the insertion point grow; everything at or
    /// after the point shifts up. Inserting into a collapsed region keeps the
    /// new slots hidden. The window survives unless the edit lands inside it.
    pub fn insert_rows(&mut self, slot: Slot, count: usize) {
        if count == 0 {
            return;
        }
        self.insert_span(slot, count);
        vdebug!(slot, count, "insert_rows");
    }

    /// Removes the `count` row slots starting at `slot`.
    ///
    /// The span must contain data rows only; headers and footers leave the
    /// address space through [`remove_group`](Self::remove_group). A span
    /// covering a keyed slot is rejected with [`Error::NotARow`] before
    /// anything is mutated.
    pub fn remove_rows(&mut self, slot: Slot, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let end = slot + count - 1;
        let keyed = self
            .groups
            .indexes_from(slot)
            .next()
            .filter(|&s| s <= end)
            .or_else(|| self.footers.indexes_from(slot).next().filter(|&s| s <= end));
        if let Some(keyed) = keyed {
            return Err(Error::NotARow { slot: keyed });
        }
        self.remove_span(slot, count);
        vdebug!(slot, count, "remove_rows");
        Ok(())
    }

    /// Inserts a group's header slot (and footer slot, when present) into the
    /// address space and registers its metadata.
    ///
    /// `info` describes the final geometry: `slot` is where the header lands
    /// and `last_sub_item_slot` is the group's last slot after both
    /// insertions. Enclosing groups whose range contains the header grow
    /// automatically; appending at the very end of a parent's range requires
    /// the caller to extend the parent.
    pub fn add_group(&mut self, info: GroupInfo) {
        self.insert_span(info.slot, 1);
        if let Some(footer) = info.footer_slot() {
            self.insert_span(footer, 1);
            self.footers.add_value(footer, info.slot);
        }
        self.groups.add_value(info.slot, info);
        vdebug!(slot = info.slot, key = info.key, "add_group");
    }

    /// Removes a group's header and footer slots, leaving its rows in place
    /// (ungrouping). A collapsed group is expanded first so the hidden-range
    /// bookkeeping stays consistent.
    pub fn remove_group(&mut self, header_slot: Slot) -> Result<GroupInfo> {
        if !self.groups.contains_index(header_slot) {
            return Err(Error::NotAGroup { slot: header_slot });
        }
        self.expand_group(header_slot)?;
        let info = self
            .groups
            .remove_value(header_slot)
            .ok_or(Error::NotAGroup { slot: header_slot })?;
        if let Some(footer) = info.footer_slot() {
            self.footers.remove_value(footer);
            self.remove_span(footer, 1);
        }
        self.remove_span(header_slot, 1);
        vdebug!(slot = header_slot, key = info.key, "remove_group");
        Ok(info)
    }

    fn insert_span(&mut self, slot: Slot, count: usize) {
        let delta = count as isize;
        for info in self.groups.values_mut() {
            if info.slot >= slot {
                info.slot += count;
                info.last_sub_item_slot += count;
            } else if info.last_sub_item_slot >= slot {
                info.last_sub_item_slot += count;
            }
        }
        self.groups.shift_from(slot, delta);
        for header in self.footers.values_mut() {
            if *header >= slot {
                *header += count;
            }
        }
        self.footers.shift_from(slot, delta);
        self.collapsed.shift_from(slot, delta);
        if let Some(range) = self.window.slot_range() {
            if slot <= range.start {
                self.window.shift_range(delta);
            } else if slot <= range.end {
                vwarn!(slot, "insert inside realized window, clearing");
                self.window.clear(true);
            }
        }
        if let Some(first) = self.first_scrolling_slot {
            if slot <= first {
                self.first_scrolling_slot = Some(first + count);
            }
        }
        self.slot_count += count;
    }

    fn remove_span(&mut self, slot: Slot, count: usize) {
        let end = slot + count - 1;
        let span = SlotRange::new(slot, end);
        let delta = -(count as isize);

        if let Some(range) = self.window.slot_range() {
            if range.intersects(span) {
                vwarn!(slot, count, "removal inside realized window, clearing");
                self.window.clear(true);
            } else if range.start > end {
                self.window.shift_range(delta);
            }
        }

        for info in self.groups.values_mut() {
            if info.slot > end {
                info.slot -= count;
                info.last_sub_item_slot -= count;
            } else if info.last_sub_item_slot >= slot {
                let overlap = info.last_sub_item_slot.min(end) - slot + 1;
                info.last_sub_item_slot -= overlap;
            }
        }
        self.groups.shift_from(slot, delta);
        for header in self.footers.values_mut() {
            if *header > end {
                *header -= count;
            }
        }
        self.footers.shift_from(slot, delta);

        self.collapsed.remove_range(span);
        self.collapsed.shift_from(slot, delta);

        if let Some(first) = self.first_scrolling_slot {
            if first > end {
                self.first_scrolling_slot = Some(first - count);
            } else if first >= slot {
                self.first_scrolling_slot = Some(slot);
            }
        }
        self.slot_count -= count;
    }

    // Group collapse/expand.

    /// Hides the group's descendant slots, returning how many were newly
    /// hidden. Collapsing an already collapsed group is a no-op.
    ///
    /// Realized elements inside the hidden span are unloaded into the recycle
    /// pools; the window range contracts past the span when it overlapped an
    /// edge. Descendant slot identity is untouched, so a later expand reveals
    /// the identical set.
    pub fn collapse_group(&mut self, header_slot: Slot) -> Result<usize> {
        let info = *self
            .groups
            .value_at(header_slot)
            .ok_or(Error::NotAGroup { slot: header_slot })?;
        if !info.is_visible {
            return Ok(0);
        }
        if let Some(info) = self.groups.value_at_mut(header_slot) {
            info.is_visible = false;
        }
        let Some(span) = info.sub_item_range() else {
            return Ok(0);
        };
        let newly_hidden = span.len() - self.collapsed.range_count(span.start, span.end);

        if let Some(range) = self.window.slot_range() {
            if range.intersects(span) {
                let lo = span.start.max(range.start);
                let hi = span.end.min(range.end);
                for slot in (lo..=hi).rev() {
                    if let Some((kind, element)) = self.window.unload(slot, false, &self.collapsed)
                    {
                        self.window.recycle(kind, element);
                    }
                }
            }
        }
        self.collapsed.add_range(span);
        if let Some(range) = self.window.slot_range() {
            if self.window.is_empty() {
                self.window.set_range(None);
            } else {
                let start = self.collapsed.skip_forward(range.start);
                match self.collapsed.skip_backward(range.end).filter(|&e| e >= start) {
                    Some(end) => self.window.set_range(Some(SlotRange::new(start, end))),
                    None => {
                        self.window.clear(true);
                    }
                }
            }
        }
        if let Some(first) = self.first_scrolling_slot {
            if span.contains(first) {
                self.first_scrolling_slot = Some(self.collapsed.skip_forward(first));
            }
        }
        vdebug!(slot = header_slot, newly_hidden, "collapse_group");
        Ok(newly_hidden)
    }

    /// Reveals the group's descendant slots, returning how many became
    /// visible. Nested groups that were collapsed in their own right stay
    /// hidden. Expanding an already expanded group is a no-op.
    pub fn expand_group(&mut self, header_slot: Slot) -> Result<usize> {
        let info = *self
            .groups
            .value_at(header_slot)
            .ok_or(Error::NotAGroup { slot: header_slot })?;
        if info.is_visible {
            return Ok(0);
        }
        if let Some(info) = self.groups.value_at_mut(header_slot) {
            info.is_visible = true;
        }
        // Inside a collapsed ancestor nothing becomes visible yet; the state
        // flip takes effect when the ancestor expands.
        if self.collapsed.contains(header_slot) {
            return Ok(0);
        }
        let Some(span) = info.sub_item_range() else {
            return Ok(0);
        };
        let hidden_before = self.collapsed.range_count(span.start, span.end);
        self.collapsed.remove_range(span);
        // Nested collapsed subgroups keep their own slots hidden.
        let nested: Vec<Slot> = self
            .groups
            .indexes_from(span.start)
            .take_while(|&s| s <= span.end)
            .collect();
        for nested_header in nested {
            if let Some(sub) = self.groups.value_at(nested_header) {
                if !sub.is_visible {
                    if let Some(sub_span) = sub.sub_item_range() {
                        self.collapsed.add_range(sub_span);
                    }
                }
            }
        }
        let revealed = hidden_before - self.collapsed.range_count(span.start, span.end);

        if let Some(range) = self.window.slot_range() {
            // Newly revealed slots may appear mid-window; rebuilding on the
            // next update is simpler than splicing them in.
            if range.intersects(span) {
                self.window.clear(true);
            }
        }
        vdebug!(slot = header_slot, revealed, "expand_group");
        Ok(revealed)
    }

    // Scrolling.

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn negative_offset(&self) -> f64 {
        self.negative_offset
    }

    /// Positions the viewport so `slot` (or the first visible slot after it)
    /// is flush with the viewport start.
    pub fn scroll_to_slot(&mut self, slot: Slot) {
        let target = self.collapsed.skip_forward(slot.min(self.slot_count));
        if target >= self.slot_count {
            self.first_scrolling_slot = self.last_visible_slot();
        } else {
            self.first_scrolling_slot = Some(target);
        }
        self.negative_offset = 0.0;
        self.scroll_offset = match self.first_scrolling_slot {
            Some(first) if first > 0 => self.visible_extent_between(0, first - 1),
            _ => 0.0,
        };
    }

    /// Repositions the viewport at an absolute pixel offset from the top of
    /// the visible content.
    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset.max(0.0);
        let mut remaining = self.scroll_offset;
        let Some(mut slot) = self.first_visible_slot() else {
            self.first_scrolling_slot = None;
            self.negative_offset = 0.0;
            return;
        };
        loop {
            let extent = (self.options.slot_extent)(slot, self.slot_kind(slot));
            if remaining < extent {
                break;
            }
            match self.next_visible_slot(slot) {
                Some(next) => {
                    remaining -= extent;
                    slot = next;
                }
                None => {
                    remaining = 0.0;
                    break;
                }
            }
        }
        self.first_scrolling_slot = Some(slot);
        self.negative_offset = remaining;
    }

    // Realization.

    /// Resolves the visible window for `available` extent and reconciles the
    /// realized elements to it, recycling what scrolled out and acquiring
    /// (pooled first, factory second) what scrolled in.
    pub fn update_window(&mut self, available: f64) -> Result<ResolvedWindow> {
        let prev_first = self
            .first_scrolling_slot
            .map(|slot| self.collapsed.skip_forward(slot))
            .filter(|&slot| slot < self.slot_count);
        let resolved = resolve_window(
            &SlotExtentsView { grid: self },
            ResolveInput {
                available,
                frozen_leading: &[],
                frozen_trailing: 0.0,
                prev_first,
                negative_offset: self.negative_offset,
            },
        );
        if resolved.first.is_some() {
            // A zero-extent viewport resolves to nothing; keep the anchor so
            // the scroll position survives a transient collapse.
            self.first_scrolling_slot = resolved.first;
        }
        self.negative_offset = resolved.negative_offset;
        self.scroll_offset = (self.scroll_offset + resolved.origin_shift).max(0.0);
        self.last_resolved = resolved;

        let target = match (resolved.first, resolved.last) {
            (Some(first), Some(last)) => Some(SlotRange::new(first, last)),
            _ => None,
        };
        self.apply_window_range(target)?;
        self.window.trim_pools(self.options.max_pooled_per_kind);
        Ok(resolved)
    }

    fn apply_window_range(&mut self, target: Option<SlotRange>) -> Result<()> {
        let Some(target) = target else {
            self.window.clear(true);
            return Ok(());
        };
        if let Some(current) = self.window.slot_range() {
            if !current.intersects(target) {
                self.window.clear(true);
            }
        }
        if self.window.slot_range().is_none() {
            let mut slot = target.start;
            loop {
                self.realize(slot)?;
                match self.next_visible_slot(slot) {
                    Some(next) if next <= target.end => slot = next,
                    _ => break,
                }
            }
            return Ok(());
        }

        // Shrink away the slots that scrolled out, then grow toward the new
        // edges one adjacent slot at a time.
        while let Some(first) = self.window.first_slot() {
            if first >= target.start {
                break;
            }
            match self.window.unload(first, true, &self.collapsed) {
                Some((kind, element)) => self.window.recycle(kind, element),
                None => break,
            }
        }
        while let Some(last) = self.window.last_slot() {
            if last <= target.end {
                break;
            }
            match self.window.unload(last, true, &self.collapsed) {
                Some((kind, element)) => self.window.recycle(kind, element),
                None => break,
            }
        }
        while let Some(first) = self.window.first_slot() {
            if first <= target.start {
                break;
            }
            match self.previous_visible_slot(first) {
                Some(prev) if prev >= target.start => self.realize(prev)?,
                _ => break,
            }
        }
        while let Some(last) = self.window.last_slot() {
            if last >= target.end {
                break;
            }
            match self.next_visible_slot(last) {
                Some(next) if next <= target.end => self.realize(next)?,
                _ => break,
            }
        }
        Ok(())
    }

    fn realize(&mut self, slot: Slot) -> Result<()> {
        let kind = self.slot_kind(slot);
        let element = match self.window.acquire_recycled(kind) {
            Some(element) => element,
            None => (self.options.create_element)(slot, kind),
        };
        self.window.load(slot, kind, element, true, &self.collapsed)
    }

    /// The element realized at `slot`, when inside the window.
    pub fn element_at(&self, slot: Slot) -> Option<&E> {
        self.window.element_at(slot, &self.collapsed)
    }

    pub fn element_at_mut(&mut self, slot: Slot) -> Option<&mut E> {
        self.window.element_at_mut(slot, &self.collapsed)
    }

    /// Number of realized elements.
    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    pub fn window_slot_range(&self) -> Option<SlotRange> {
        self.window.slot_range()
    }

    pub fn first_slot(&self) -> Option<Slot> {
        self.window.first_slot()
    }

    pub fn last_slot(&self) -> Option<Slot> {
        self.window.last_slot()
    }

    /// Last slot wholly visible in the most recent resolution. `last_slot`
    /// may be clipped by the viewport edge.
    pub fn last_full_slot(&self) -> Option<Slot> {
        self.last_resolved.last_full
    }

    pub fn last_resolved(&self) -> &ResolvedWindow {
        &self.last_resolved
    }

    pub fn pooled(&self, kind: SlotKind) -> usize {
        self.window.pooled(kind)
    }
}

/// [`ExtentSource`] over the visible slots of a grid.
struct SlotExtentsView<'a, E> {
    grid: &'a GridVirtualizer<E>,
}

impl<E> ExtentSource for SlotExtentsView<'_, E> {
    fn first(&self) -> Option<usize> {
        self.grid.first_visible_slot()
    }

    fn next(&self, index: usize) -> Option<usize> {
        self.grid.next_visible_slot(index)
    }

    fn prev(&self, index: usize) -> Option<usize> {
        self.grid.previous_visible_slot(index)
    }

    fn extent(&self, index: usize) -> f64 {
        (self.grid.options.slot_extent)(index, self.grid.slot_kind(index))
    }
}
