use crate::*;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// SlotTable

#[test]
fn slot_table_basics() {
    let mut table: SlotTable<u32> = SlotTable::new();
    assert!(table.is_empty());
    assert_eq!(table.add_value(10, 1), None);
    assert_eq!(table.add_value(4, 2), None);
    assert_eq!(table.add_value(10, 3), Some(1));
    assert_eq!(table.index_count(), 2);
    assert_eq!(table.value_at(10), Some(&3));
    assert_eq!(table.value_at(5), None);
    assert_eq!(table.next_index(4), Some(10));
    assert_eq!(table.next_index(10), None);
    assert_eq!(table.previous_index(10), Some(4));
    assert_eq!(table.previous_index(4), None);
    assert_eq!(table.indexes_from(5).collect::<Vec<_>>(), vec![10]);
    assert_eq!(table.range_count(0, 20), 2);
    assert_eq!(table.range_count(5, 9), 0);
    assert_eq!(table.remove_value(4), Some(2));
    assert_eq!(table.remove_value(4), None);
}

#[test]
fn slot_table_shift_from() {
    let mut table: SlotTable<u32> = SlotTable::new();
    table.add_value(2, 0);
    table.add_value(5, 1);
    table.add_value(9, 2);
    table.shift_from(5, 3);
    assert_eq!(table.iter().map(|(s, _)| s).collect::<Vec<_>>(), vec![2, 8, 12]);
    table.shift_from(8, -3);
    assert_eq!(table.iter().map(|(s, _)| s).collect::<Vec<_>>(), vec![2, 5, 9]);
}

#[test]
fn slot_table_matches_model() {
    let mut rng = Lcg::new(0x5eed);
    let mut table: SlotTable<u64> = SlotTable::new();
    let mut model: BTreeMap<usize, u64> = BTreeMap::new();
    for _ in 0..2000 {
        let slot = rng.gen_range_usize(0, 64);
        match rng.gen_range_u64(0, 4) {
            0 | 1 => {
                let value = rng.next_u64();
                assert_eq!(table.add_value(slot, value), model.insert(slot, value));
            }
            2 => assert_eq!(table.remove_value(slot), model.remove(&slot)),
            _ => {
                assert_eq!(table.value_at(slot), model.get(&slot));
                assert_eq!(table.contains_index(slot), model.contains_key(&slot));
                assert_eq!(
                    table.next_index(slot),
                    model.range(slot + 1..).next().map(|(s, _)| *s)
                );
                assert_eq!(
                    table.previous_index(slot),
                    model.range(..slot).next_back().map(|(s, _)| *s)
                );
                let end = rng.gen_range_usize(slot, 64);
                assert_eq!(table.range_count(slot, end), model.range(slot..=end).count());
            }
        }
        assert_eq!(table.index_count(), model.len());
    }
}

// ---------------------------------------------------------------------------
// RangeSet

#[test]
fn range_set_coalesces_overlapping_and_adjacent() {
    let mut set = RangeSet::new();
    set.add_range(SlotRange::new(5, 7));
    set.add_range(SlotRange::new(1, 2));
    set.add_range(SlotRange::new(3, 4));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![SlotRange::new(1, 7)]);
    assert_eq!(set.len(), 7);
    assert!(set.contains(1));
    assert!(set.contains(7));
    assert!(!set.contains(0));
    assert!(!set.contains(8));
    assert_eq!(set.range_count(0, 10), 7);
    assert_eq!(set.range_count(3, 5), 3);
}

#[test]
fn range_set_remove_splits() {
    let mut set = RangeSet::new();
    set.add_range(SlotRange::new(1, 7));
    set.remove_range(SlotRange::new(4, 5));
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![SlotRange::new(1, 3), SlotRange::new(6, 7)]
    );
    assert_eq!(set.skip_forward(1), 4);
    assert_eq!(set.skip_forward(4), 4);
    assert_eq!(set.skip_forward(6), 8);
    assert_eq!(set.skip_backward(7), Some(5));
    assert_eq!(set.skip_backward(3), Some(0));
    set.add_range(SlotRange::new(0, 0));
    assert_eq!(set.skip_backward(3), None);
}

#[test]
fn range_set_shift_stretches_surrounding_range() {
    let mut set = RangeSet::new();
    set.add_range(SlotRange::new(2, 4));
    set.add_range(SlotRange::new(8, 9));
    set.shift_from(3, 2);
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![SlotRange::new(2, 6), SlotRange::new(10, 11)]
    );
    set.shift_from(0, -2);
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![SlotRange::new(0, 4), SlotRange::new(8, 9)]
    );
}

// ---------------------------------------------------------------------------
// ElementWindow

#[test]
fn window_load_identity() {
    let collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    for slot in 0..10 {
        window
            .load(slot, SlotKind::Row, slot, true, &collapsed)
            .unwrap();
    }
    assert_eq!(window.slot_range(), Some(SlotRange::new(0, 9)));
    assert_eq!(window.len(), 10);
    for slot in 0..10 {
        assert_eq!(window.element_at(slot, &collapsed), Some(&slot));
    }
    assert_eq!(window.element_at(10, &collapsed), None);
}

#[test]
fn window_grows_backward() {
    let collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    window.load(5, SlotKind::Row, 5, true, &collapsed).unwrap();
    window.load(4, SlotKind::Row, 4, true, &collapsed).unwrap();
    window.load(3, SlotKind::Row, 3, true, &collapsed).unwrap();
    assert_eq!(window.slot_range(), Some(SlotRange::new(3, 5)));
    assert_eq!(window.element_at(3, &collapsed), Some(&3));
    assert_eq!(window.element_at(5, &collapsed), Some(&5));
}

#[test]
fn window_rejects_non_adjacent_load() {
    let collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    window.load(0, SlotKind::Row, 0, true, &collapsed).unwrap();
    assert_eq!(
        window.load(2, SlotKind::Row, 2, true, &collapsed),
        Err(Error::NonAdjacentSlot { slot: 2 })
    );
}

#[test]
fn window_adjacency_skips_collapsed_slots() {
    let mut collapsed = RangeSet::new();
    collapsed.add_range(SlotRange::new(2, 3));
    let mut window: ElementWindow<usize> = ElementWindow::new();
    window.load(1, SlotKind::Row, 1, true, &collapsed).unwrap();
    // Slot 4 is the next visible slot after 1.
    window.load(4, SlotKind::Row, 4, true, &collapsed).unwrap();
    assert_eq!(window.slot_range(), Some(SlotRange::new(1, 4)));
    assert_eq!(window.len(), 2);
    assert_eq!(window.element_at(4, &collapsed), Some(&4));
    assert_eq!(window.element_at(2, &collapsed), None);
}

#[test]
fn window_unload_shrinks_at_boundaries() {
    let collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    for slot in 0..5 {
        window
            .load(slot, SlotKind::Row, slot, true, &collapsed)
            .unwrap();
    }
    assert_eq!(window.unload(0, true, &collapsed), Some((SlotKind::Row, 0)));
    assert_eq!(window.slot_range(), Some(SlotRange::new(1, 4)));
    assert_eq!(window.unload(4, true, &collapsed), Some((SlotKind::Row, 4)));
    assert_eq!(window.slot_range(), Some(SlotRange::new(1, 3)));
    assert_eq!(window.unload(4, true, &collapsed), None);
}

#[test]
fn window_mid_unload_pairs_with_collapse() {
    let mut collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    for slot in 0..5 {
        window
            .load(slot, SlotKind::Row, slot, true, &collapsed)
            .unwrap();
    }
    // The mid-range unload leaves the range; hiding the slot right after
    // restores the index arithmetic.
    assert_eq!(window.unload(2, false, &collapsed), Some((SlotKind::Row, 2)));
    collapsed.add_range(SlotRange::new(2, 2));
    assert_eq!(window.slot_range(), Some(SlotRange::new(0, 4)));
    assert_eq!(window.len(), 4);
    assert_eq!(window.element_at(1, &collapsed), Some(&1));
    assert_eq!(window.element_at(2, &collapsed), None);
    assert_eq!(window.element_at(3, &collapsed), Some(&3));
    assert_eq!(window.element_at(4, &collapsed), Some(&4));
}

#[test]
fn recycle_pools_are_lifo_and_trimmable() {
    let mut window: ElementWindow<u32> = ElementWindow::new();
    window.recycle(SlotKind::Row, 1);
    window.recycle(SlotKind::Row, 2);
    window.recycle(SlotKind::GroupHeader, 7);
    assert_eq!(window.pooled(SlotKind::Row), 2);
    assert_eq!(window.acquire_recycled(SlotKind::Row), Some(2));
    assert_eq!(window.acquire_recycled(SlotKind::Row), Some(1));
    assert_eq!(window.acquire_recycled(SlotKind::Row), None);
    assert_eq!(window.acquire_recycled(SlotKind::GroupFooter), None);
    assert_eq!(window.acquire_recycled(SlotKind::GroupHeader), Some(7));

    for value in 0..5 {
        window.recycle(SlotKind::Row, value);
    }
    window.trim_pools(2);
    assert_eq!(window.pooled(SlotKind::Row), 2);
}

#[test]
fn window_clear_recycles_or_discards() {
    let collapsed = RangeSet::new();
    let mut window: ElementWindow<usize> = ElementWindow::new();
    for slot in 0..3 {
        window
            .load(slot, SlotKind::Row, slot, true, &collapsed)
            .unwrap();
    }
    window.clear(true);
    assert!(window.is_empty());
    assert_eq!(window.slot_range(), None);
    assert_eq!(window.pooled(SlotKind::Row), 3);
    window.clear(false);
    assert_eq!(window.pooled(SlotKind::Row), 0);
}

// ---------------------------------------------------------------------------
// Resolver

struct Extents(Vec<f64>);

impl ExtentSource for Extents {
    fn first(&self) -> Option<usize> {
        (!self.0.is_empty()).then_some(0)
    }

    fn next(&self, index: usize) -> Option<usize> {
        (index + 1 < self.0.len()).then_some(index + 1)
    }

    fn prev(&self, index: usize) -> Option<usize> {
        index.checked_sub(1)
    }

    fn extent(&self, index: usize) -> f64 {
        self.0[index]
    }
}

fn resolve(source: &Extents, available: f64, prev_first: Option<usize>, neg: f64) -> ResolvedWindow {
    resolve_window(
        source,
        ResolveInput {
            available,
            frozen_leading: &[],
            frozen_trailing: 0.0,
            prev_first,
            negative_offset: neg,
        },
    )
}

#[test]
fn resolver_fills_forward() {
    let source = Extents(vec![20.0; 5]);
    let out = resolve(&source, 100.0, None, 0.0);
    assert_eq!(out.first, Some(0));
    assert_eq!(out.last, Some(4));
    assert_eq!(out.last_full, Some(4));
    assert_eq!(out.visible_count, 5);
    assert_close(out.negative_offset, 0.0);
    assert_close(out.origin_shift, 0.0);
}

#[test]
fn resolver_distinguishes_partial_last() {
    let source = Extents(vec![20.0; 5]);
    let out = resolve(&source, 90.0, None, 0.0);
    assert_eq!(out.last, Some(4));
    assert_eq!(out.last_full, Some(3));
    assert_eq!(out.visible_count, 5);
}

#[test]
fn resolver_empty_source() {
    let source = Extents(Vec::new());
    let out = resolve(&source, 100.0, None, 0.0);
    assert_eq!(out, ResolvedWindow::default());
}

#[test]
fn resolver_underfill_recovery_ladder() {
    // Scrolled to the last entry with part of it hidden; the viewport wants
    // more than remains below, so extent is recovered from above in order:
    // negative offset first, whole entries next, then one partial pull.
    let source = Extents(vec![20.0; 5]);
    let out = resolve(&source, 50.0, Some(4), 10.0);
    assert_eq!(out.first, Some(2));
    assert_eq!(out.last, Some(4));
    assert_eq!(out.last_full, Some(4));
    assert_eq!(out.visible_count, 3);
    assert_close(out.negative_offset, 10.0);
    assert_close(out.origin_shift, -40.0);
}

#[test]
fn resolver_underfill_stops_at_first_entry() {
    let source = Extents(vec![20.0; 3]);
    let out = resolve(&source, 100.0, Some(1), 0.0);
    assert_eq!(out.first, Some(0));
    assert_eq!(out.last, Some(2));
    assert_close(out.origin_shift, -20.0);
    assert_close(out.negative_offset, 0.0);
}

#[test]
fn resolver_frozen_regions_consume_budget_first() {
    let source = Extents(vec![10.0; 4]);
    let out = resolve_window(
        &source,
        ResolveInput {
            available: 100.0,
            frozen_leading: &[30.0, 30.0],
            frozen_trailing: 20.0,
            prev_first: None,
            negative_offset: 0.0,
        },
    );
    assert_eq!(out.frozen_visible, 2);
    assert_eq!(out.first, Some(0));
    assert_eq!(out.last, Some(1));
    assert_eq!(out.last_full, Some(1));
}

// ---------------------------------------------------------------------------
// Columns & star sizing

fn star(weight: f64, display: f64, min: f64) -> Column {
    Column::new(ColumnWidth::star(weight))
        .with_display_value(display)
        .with_min_width(min)
}

#[test]
fn star_shrink_preserves_weight_ratios() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 100.0, 50.0));
    cols.push(star(1.0, 100.0, 50.0));
    cols.push(star(2.0, 200.0, 50.0));
    let residual = cols.adjust_widths(0, -100.0, false);
    assert_close(residual, 0.0);
    assert_close(cols.column(0).unwrap().display_value(), 75.0);
    assert_close(cols.column(1).unwrap().display_value(), 75.0);
    assert_close(cols.column(2).unwrap().display_value(), 150.0);
}

#[test]
fn star_shrink_reports_residual_past_min_bounds() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 70.0, 50.0));
    cols.push(star(1.0, 60.0, 50.0));
    cols.push(star(1.0, 60.0, 50.0));
    // Combined slack is 40; the other 60 cannot be satisfied.
    let residual = cols.adjust_widths(0, -100.0, false);
    assert_close(residual, -60.0);
    for i in 0..3 {
        assert_close(cols.column(i).unwrap().display_value(), 50.0);
    }
}

#[test]
fn star_adjust_round_trips_within_epsilon() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 100.0, 0.0));
    cols.push(star(2.0, 200.0, 0.0));
    cols.push(Column::new(ColumnWidth::fixed(80.0)));
    let before: Vec<f64> = cols.iter().map(|c| c.display_value()).collect();
    assert_close(cols.adjust_widths(0, 50.0, false), 0.0);
    assert_close(cols.adjust_widths(0, -50.0, false), 0.0);
    for (i, expected) in before.iter().enumerate() {
        assert_close(cols.column(i).unwrap().display_value(), *expected);
    }
}

#[test]
fn star_shrink_respects_per_column_min_when_off_ratio() {
    // Display widths are far off the 1:1 weight ratio, so the proportional
    // target for column 0 lands below its own min. It must stop at 60 and
    // the unsatisfied remainder shows up in the residual.
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 90.0, 60.0));
    cols.push(star(1.0, 10.0, 0.0));
    let residual = cols.adjust_widths(0, -60.0, false);
    assert_close(cols.column(0).unwrap().display_value(), 60.0);
    assert_close(
        cols.column(1).unwrap().display_value(),
        crate::column::MIN_STAR_WIDTH,
    );
    assert_close(residual, -20.001);
    assert!(cols
        .iter()
        .all(|c| c.display_value() >= c.actual_min_width() - 1e-9));
}

#[test]
fn star_grow_respects_per_column_max_when_off_ratio() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 10.0, 0.0).with_max_width(30.0));
    cols.push(star(1.0, 90.0, 0.0));
    let residual = cols.adjust_widths(0, 60.0, false);
    assert_close(cols.column(0).unwrap().display_value(), 30.0);
    assert_close(cols.column(1).unwrap().display_value(), 130.0);
    assert_close(residual, 0.0);
}

#[test]
fn zero_and_nan_amounts_are_no_ops() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 100.0, 0.0));
    assert_close(cols.adjust_widths(0, 0.0, false), 0.0);
    assert!(cols.adjust_widths(0, f64::NAN, false).is_nan());
    assert_close(cols.column(0).unwrap().display_value(), 100.0);
}

#[test]
fn decrease_cascade_phase_order() {
    let mut cols = ColumnSet::new();
    cols.push(
        Column::new(ColumnWidth::auto())
            .with_display_value(120.0)
            .with_min_width(40.0),
    );
    cols.push(
        Column::new(ColumnWidth::auto())
            .with_display_value(80.0)
            .with_min_width(40.0),
    );
    cols.set_desired_value(0, 100.0).unwrap();

    // Phase 1 trims the measured column to its desired width, phase 3 takes
    // the rest down toward its min. The unmeasured column is untouched.
    let residual = cols.adjust_widths(0, -60.0, false);
    assert_close(residual, 0.0);
    assert_close(cols.column(0).unwrap().display_value(), 60.0);
    assert_close(cols.column(1).unwrap().display_value(), 80.0);

    // Only phase 4 may touch the unmeasured column.
    let residual = cols.adjust_widths(0, -60.0, false);
    assert_close(residual, 0.0);
    assert_close(cols.column(0).unwrap().display_value(), 40.0);
    assert_close(cols.column(1).unwrap().display_value(), 40.0);
}

#[test]
fn increase_cascade_stops_at_max_width() {
    let mut cols = ColumnSet::new();
    cols.push(
        Column::new(ColumnWidth::auto())
            .with_display_value(100.0)
            .with_max_width(120.0),
    );
    cols.set_desired_value(0, 150.0).unwrap();
    let residual = cols.adjust_widths(0, 100.0, false);
    assert_close(cols.column(0).unwrap().display_value(), 120.0);
    assert_close(residual, 80.0);
}

#[test]
fn user_initiated_adjustment_skips_non_resizable() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 100.0, 0.0));
    cols.push(star(1.0, 100.0, 0.0).with_resizable(false));
    let residual = cols.adjust_widths(0, -50.0, true);
    assert_close(residual, 0.0);
    assert_close(cols.column(0).unwrap().display_value(), 50.0);
    assert_close(cols.column(1).unwrap().display_value(), 100.0);
}

#[test]
fn zero_weight_star_is_floored_but_takes_no_share() {
    let mut cols = ColumnSet::new();
    cols.push(star(0.0, 0.0, 0.0));
    cols.push(star(1.0, 100.0, 0.0));
    let residual = cols.adjust_widths(0, -20.0, false);
    assert_close(residual, 0.0);
    assert_close(
        cols.column(0).unwrap().display_value(),
        crate::column::MIN_STAR_WIDTH,
    );
    assert_close(cols.column(1).unwrap().display_value(), 80.0);
}

#[test]
fn star_weights_rescale_when_family_extends_before_start() {
    let mut cols = ColumnSet::new();
    cols.push(star(1.0, 100.0, 0.0));
    cols.push(star(1.0, 100.0, 0.0));
    let residual = cols.adjust_widths(1, -50.0, false);
    assert_close(residual, 0.0);
    assert_close(cols.column(1).unwrap().display_value(), 50.0);
    // The adjusted column absorbed the loss, so its weight shrinks to keep
    // the family ratio consistent with the untouched column.
    assert_close(cols.column(1).unwrap().width().value, 0.5);
    assert_close(cols.column(0).unwrap().display_value(), 100.0);
    assert_close(cols.column(0).unwrap().width().value, 1.0);
}

#[test]
fn display_index_reorder_and_reentrancy_guard() {
    let mut cols = ColumnSet::new();
    let a = cols.push(Column::new(ColumnWidth::fixed(10.0)));
    let b = cols.push(Column::new(ColumnWidth::fixed(20.0)));
    let c = cols.push(Column::new(ColumnWidth::fixed(30.0)));

    cols.set_display_index(a, 2).unwrap();
    assert_eq!(cols.column(0).unwrap().stable_index(), b);
    assert_eq!(cols.column(1).unwrap().stable_index(), c);
    assert_eq!(cols.column(2).unwrap().stable_index(), a);
    for (i, col) in cols.iter().enumerate() {
        assert_eq!(col.display_index(), i);
    }
    assert_eq!(
        cols.set_display_index(a, 3),
        Err(Error::DisplayIndexOutOfBounds { display_index: 3 })
    );
    assert_eq!(
        cols.set_display_index(99, 0),
        Err(Error::UnknownStableIndex { stable_index: 99 })
    );

    cols.adjust_state = AdjustState::AdjustingDisplayIndexes;
    assert_eq!(cols.set_display_index(b, 0), Err(Error::ReentrantAdjustment));
    cols.adjust_state = AdjustState::Idle;
    assert!(cols.set_display_index(b, 0).is_ok());
}

#[test]
fn column_set_resolves_visible_scrolling_window() {
    let mut cols = ColumnSet::new();
    cols.push(Column::new(ColumnWidth::fixed(30.0)).with_frozen(FrozenPosition::Left));
    for _ in 0..4 {
        cols.push(Column::new(ColumnWidth::fixed(40.0)));
    }
    cols.push(Column::new(ColumnWidth::fixed(40.0)).with_visible(false));
    let out = cols.resolve_visible(100.0, None, 0.0);
    assert_eq!(out.frozen_visible, 1);
    // 70 of scrolling budget: one full column, one clipped.
    assert_eq!(out.first, Some(1));
    assert_eq!(out.last, Some(2));
    assert_eq!(out.last_full, Some(1));
}

// ---------------------------------------------------------------------------
// GridVirtualizer

fn plain_grid(slots: usize) -> (GridVirtualizer<usize>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let options = GridOptions::new(
        |_, _| 10.0,
        move |slot, _| {
            counter.fetch_add(1, Ordering::Relaxed);
            slot
        },
    );
    let mut grid = GridVirtualizer::new(options);
    grid.rebuild(slots, core::iter::empty());
    (grid, created)
}

fn grouped_grid() -> GridVirtualizer<usize> {
    let options = GridOptions::new(|_, _| 10.0, |slot, _| slot);
    let mut grid = GridVirtualizer::new(options);
    grid.rebuild(
        12,
        [
            GroupInfo::new(0, 0, 5, 1).with_footer(),
            GroupInfo::new(0, 6, 11, 2).with_footer(),
        ],
    );
    grid
}

#[test]
fn grid_slot_kinds_and_counts() {
    let grid = grouped_grid();
    assert_eq!(grid.slot_count(), 12);
    assert_eq!(grid.visible_slot_count(), 12);
    assert_eq!(grid.row_count(), 8);
    assert_eq!(grid.slot_kind(0), SlotKind::GroupHeader);
    assert_eq!(grid.slot_kind(1), SlotKind::Row);
    assert_eq!(grid.slot_kind(5), SlotKind::GroupFooter);
    assert_eq!(grid.slot_kind(6), SlotKind::GroupHeader);
    assert_eq!(grid.slot_kind(11), SlotKind::GroupFooter);
    assert_eq!(grid.group_of_footer(11).unwrap().slot, 6);
    assert_eq!(grid.group_info(6).unwrap().key, 2);
}

#[test]
fn grid_row_slot_conversion_round_trips() {
    let grid = grouped_grid();
    assert_eq!(grid.row_index_of_slot(1), Some(0));
    assert_eq!(grid.row_index_of_slot(4), Some(3));
    assert_eq!(grid.row_index_of_slot(7), Some(4));
    assert_eq!(grid.row_index_of_slot(0), None);
    assert_eq!(grid.row_index_of_slot(5), None);
    assert_eq!(grid.row_index_of_slot(12), None);
    for row in 0..grid.row_count() {
        let slot = grid.slot_of_row_index(row).unwrap();
        assert_eq!(grid.row_index_of_slot(slot), Some(row));
    }
    assert_eq!(grid.slot_of_row_index(8), None);
}

#[test]
fn grid_collapse_and_expand_round_trip() {
    let mut grid = grouped_grid();
    assert_eq!(grid.collapse_group(0), Ok(5));
    assert_eq!(grid.collapse_group(0), Ok(0));
    assert_eq!(grid.visible_slot_count(), 7);
    assert!(grid.is_slot_visible(0));
    assert!(!grid.is_slot_visible(3));
    assert_eq!(grid.next_visible_slot(0), Some(6));
    assert_eq!(grid.previous_visible_slot(6), Some(0));
    assert_close(grid.visible_extent_between(0, 11), 70.0);

    assert_eq!(grid.expand_group(0), Ok(5));
    assert_eq!(grid.expand_group(0), Ok(0));
    assert_eq!(grid.visible_slot_count(), 12);
    assert!((0..12).all(|slot| grid.is_slot_visible(slot)));
    assert_eq!(grid.collapse_group(3), Err(Error::NotAGroup { slot: 3 }));
}

#[test]
fn nested_collapsed_group_stays_hidden_across_outer_expand() {
    let options = GridOptions::new(|_, _| 10.0, |slot: Slot, _| slot);
    let mut grid = GridVirtualizer::new(options);
    grid.rebuild(
        8,
        [GroupInfo::new(0, 0, 7, 10), GroupInfo::new(1, 2, 5, 11)],
    );
    assert_eq!(grid.collapse_group(2), Ok(3));
    assert_eq!(grid.collapse_group(0), Ok(4));
    assert_eq!(grid.expand_group(0), Ok(4));
    assert!(grid.is_slot_visible(1));
    assert!(grid.is_slot_visible(2));
    assert!(!grid.is_slot_visible(4));
    assert!(grid.is_slot_visible(6));
    assert_eq!(grid.expand_group(2), Ok(3));
    assert_eq!(grid.visible_slot_count(), 8);
}

#[test]
fn grid_insert_rows_extends_containing_group() {
    let mut grid = grouped_grid();
    grid.insert_rows(3, 2);
    assert_eq!(grid.slot_count(), 14);
    let a = *grid.group_info(0).unwrap();
    assert_eq!(a.last_sub_item_slot, 7);
    assert_eq!(grid.slot_kind(7), SlotKind::GroupFooter);
    let b = *grid.group_info(8).unwrap();
    assert_eq!(b.last_sub_item_slot, 13);
    assert_eq!(grid.group_of_footer(13).unwrap().slot, 8);
    assert_eq!(grid.slot_kind(3), SlotKind::Row);
    assert_eq!(grid.row_count(), 10);
}

#[test]
fn grid_remove_rows_shrinks_containing_group() {
    let mut grid = grouped_grid();
    grid.remove_rows(1, 2).unwrap();
    assert_eq!(grid.slot_count(), 10);
    let a = *grid.group_info(0).unwrap();
    assert_eq!(a.last_sub_item_slot, 3);
    assert_eq!(grid.slot_kind(3), SlotKind::GroupFooter);
    let b = *grid.group_info(4).unwrap();
    assert_eq!(b.last_sub_item_slot, 9);
    assert_eq!(grid.row_count(), 6);
}

#[test]
fn grid_remove_rows_rejects_spans_with_keyed_slots() {
    let mut grid = grouped_grid();
    // 4..=6 covers a row, the first group's footer, and the second header.
    assert_eq!(grid.remove_rows(4, 3), Err(Error::NotARow { slot: 6 }));
    assert_eq!(grid.remove_rows(5, 1), Err(Error::NotARow { slot: 5 }));
    // Rejection happens before any mutation.
    assert_eq!(grid.slot_count(), 12);
    assert_eq!(grid.group_info(0).unwrap().last_sub_item_slot, 5);
    assert!(grid.remove_rows(1, 2).is_ok());
}

#[test]
fn grid_insert_into_collapsed_region_stays_hidden() {
    let mut grid = grouped_grid();
    grid.collapse_group(0).unwrap();
    grid.insert_rows(3, 2);
    assert_eq!(grid.slot_count(), 14);
    assert!(!grid.is_slot_visible(3));
    assert!(!grid.is_slot_visible(4));
    assert_eq!(grid.visible_slot_count(), 7);
    assert_eq!(grid.expand_group(0), Ok(7));
    assert_eq!(grid.visible_slot_count(), 14);
}

#[test]
fn grid_remove_group_ungroups_rows() {
    let mut grid = grouped_grid();
    let info = grid.remove_group(6).unwrap();
    assert_eq!(info.key, 2);
    assert_eq!(grid.slot_count(), 10);
    assert_eq!(grid.row_count(), 8);
    assert_eq!(grid.slot_kind(6), SlotKind::Row);
    assert_eq!(grid.group_info(0).unwrap().last_sub_item_slot, 5);
    assert_eq!(grid.remove_group(6), Err(Error::NotAGroup { slot: 6 }));
}

#[test]
fn grid_realizes_resolved_window() {
    let (mut grid, created) = plain_grid(20);
    grid.update_window(35.0).unwrap();
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(0, 3)));
    assert_eq!(grid.window_size(), 4);
    assert_eq!(grid.last_full_slot(), Some(2));
    assert_eq!(created.load(Ordering::Relaxed), 4);
    assert_eq!(grid.element_at(2), Some(&2));
    assert_eq!(grid.element_at(4), None);
}

#[test]
fn grid_scroll_recycles_instead_of_recreating() {
    let (mut grid, created) = plain_grid(20);
    grid.update_window(35.0).unwrap();
    assert_eq!(created.load(Ordering::Relaxed), 4);

    // Jump far enough that the windows do not overlap: everything recycles.
    grid.set_scroll_offset(100.0);
    grid.update_window(35.0).unwrap();
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(10, 13)));
    assert_eq!(created.load(Ordering::Relaxed), 4);

    // A small overlap shifts the window edge by edge through the pools.
    grid.scroll_to_slot(8);
    assert_close(grid.scroll_offset(), 80.0);
    grid.update_window(35.0).unwrap();
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(8, 11)));
    assert_eq!(created.load(Ordering::Relaxed), 4);
}

#[test]
fn grid_collapse_recycles_realized_descendants() {
    let options = GridOptions::new(|_, _| 10.0, |slot: Slot, _| slot);
    let mut grid = GridVirtualizer::new(options);
    grid.rebuild(12, [GroupInfo::new(0, 0, 5, 1)]);
    grid.update_window(200.0).unwrap();
    assert_eq!(grid.window_size(), 12);

    assert_eq!(grid.collapse_group(0), Ok(5));
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(0, 11)));
    assert_eq!(grid.window_size(), 7);
    assert_eq!(grid.element_at(0), Some(&0));
    assert_eq!(grid.element_at(3), None);
    assert_eq!(grid.element_at(6), Some(&6));
    assert_eq!(grid.pooled(SlotKind::Row), 5);

    assert_eq!(grid.expand_group(0), Ok(5));
    grid.update_window(200.0).unwrap();
    assert_eq!(grid.window_size(), 12);
    // Recycled elements come back with their old payloads; only presence is
    // guaranteed here.
    assert!(grid.element_at(3).is_some());
}

#[test]
fn grid_set_scroll_offset_positions_first_slot() {
    let (mut grid, _) = plain_grid(20);
    grid.set_scroll_offset(45.0);
    grid.update_window(35.0).unwrap();
    assert_eq!(grid.first_slot(), Some(4));
    assert_close(grid.negative_offset(), 5.0);
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(4, 7)));
}

#[test]
fn grid_underfill_walks_window_back() {
    let (mut grid, _) = plain_grid(10);
    grid.scroll_to_slot(9);
    grid.update_window(35.0).unwrap();
    // Only one slot remains below the origin; the resolver pulls the window
    // back and the scroll offset follows.
    assert_eq!(grid.window_slot_range(), Some(SlotRange::new(6, 9)));
    assert_close(grid.negative_offset(), 5.0);
    assert_close(grid.scroll_offset(), 65.0);
}

#[test]
fn grid_rebuild_discards_everything() {
    let (mut grid, _) = plain_grid(20);
    grid.update_window(35.0).unwrap();
    grid.rebuild(5, core::iter::empty());
    assert_eq!(grid.window_size(), 0);
    assert_eq!(grid.pooled(SlotKind::Row), 0);
    assert_eq!(grid.slot_count(), 5);
    assert_close(grid.scroll_offset(), 0.0);
}
