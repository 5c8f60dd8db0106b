use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::column::{ColumnSet, MIN_STAR_WIDTH, WidthKind};
use crate::float;

/// Target a non-star cascade phase moves columns toward.
#[derive(Clone, Copy, Debug)]
enum NonStarTarget {
    /// The measured content width, kept inside the column's min/max bounds.
    Desired,
    Min,
    Max,
}

impl NonStarTarget {
    fn value(self, col: &crate::column::Column) -> f64 {
        match self {
            NonStarTarget::Desired => col
                .desired_value
                .max(col.actual_min_width())
                .min(col.actual_max_width()),
            NonStarTarget::Min => col.actual_min_width(),
            NonStarTarget::Max => col.actual_max_width(),
        }
    }
}

/// Working copy of one star column during redistribution. Results are written
/// back to the set in one pass after settlement.
struct StarItem {
    index: usize,
    weight: f64,
    display: f64,
    desired: f64,
    limit: f64,
}

impl ColumnSet {
    /// Applies a signed width delta `amount` to the columns at or after
    /// `start_display_index`, returning the residual that could not be
    /// satisfied.
    ///
    /// The delta cascades through four phases, each consuming as much of the
    /// residual as it can:
    ///
    /// 1. fixed/auto columns between their display and measured width,
    ///    left to right;
    /// 2. star columns, proportionally by weight (see
    ///    [`adjust_star_widths`](Self::adjust_star_widths));
    /// 3. measured fixed/auto columns up to their hard bound, right to left;
    /// 4. all fixed/auto columns, unmeasured ones included, right to left.
    ///
    /// Shrinking phases 3 and 4 move toward `min_width`; growing phases 3 and
    /// 4 both move toward `max_width`. With `user_initiated`, non-resizable
    /// columns are left untouched.
    ///
    /// A zero or `NaN` amount is a no-op and is returned unchanged. The
    /// residual is uninterpreted; callers decide whether to clamp, scroll,
    /// or ignore it.
    pub fn adjust_widths(
        &mut self,
        start_display_index: usize,
        amount: f64,
        user_initiated: bool,
    ) -> f64 {
        if amount.is_nan() || float::is_zero(amount) {
            return amount;
        }
        let start = start_display_index;
        let mut residual = amount;

        residual = self.adjust_nonstar(start, residual, NonStarTarget::Desired, false, true, user_initiated);
        residual = self.adjust_star_widths(start, residual, user_initiated);
        let bound = if amount < 0.0 {
            NonStarTarget::Min
        } else {
            NonStarTarget::Max
        };
        residual = self.adjust_nonstar(start, residual, bound, true, true, user_initiated);
        residual = self.adjust_nonstar(start, residual, bound, true, false, user_initiated);

        vdebug!(start_display_index, amount, residual, "adjust_widths");
        residual
    }

    /// One non-star cascade phase. Walks the fixed/auto columns at or after
    /// `start` (reversed when `reverse`) and moves each toward `target` until
    /// `amount` is exhausted.
    fn adjust_nonstar(
        &mut self,
        start: usize,
        amount: f64,
        target: NonStarTarget,
        reverse: bool,
        require_measured: bool,
        user_initiated: bool,
    ) -> f64 {
        if float::is_zero(amount) {
            return amount;
        }
        let mut remaining = amount;
        let len = self.len();
        let mut walk = |index: usize, remaining: &mut f64| {
            let Some(col) = self.column_mut(index) else {
                return;
            };
            if !col.is_visible || col.width.kind == WidthKind::Star {
                return;
            }
            if user_initiated && !col.is_resizable {
                return;
            }
            if require_measured && !col.is_measured() {
                return;
            }
            let target = target.value(col);
            let take = if *remaining > 0.0 {
                (target - col.display_value).clamp(0.0, *remaining)
            } else {
                -((col.display_value - target).clamp(0.0, -*remaining))
            };
            col.display_value += take;
            *remaining -= take;
        };
        if reverse {
            for index in (start..len).rev() {
                if float::is_zero(remaining) {
                    break;
                }
                walk(index, &mut remaining);
            }
        } else {
            for index in start..len {
                if float::is_zero(remaining) {
                    break;
                }
                walk(index, &mut remaining);
            }
        }
        remaining
    }

    /// Redistributes `amount` across the eligible star columns at or after
    /// `start`, preserving their weight ratios as far as min/max bounds allow.
    ///
    /// Eligible means visible, star-sized, and resizable when the call is
    /// user-initiated. Zero-weight star columns take no share of the delta
    /// but are still held at the star floor. When an eligible star column
    /// exists before `start`, the weights of the adjusted columns are
    /// rescaled afterwards so the whole star family keeps consistent ratios.
    fn adjust_star_widths(&mut self, start: usize, amount: f64, user_initiated: bool) -> f64 {
        if float::is_zero(amount) {
            return amount;
        }
        let growing = amount > 0.0;

        let mut items: Vec<StarItem> = Vec::new();
        let mut floored: Vec<usize> = Vec::new();
        let mut scale_star_weights = false;
        for col in self.iter() {
            if !col.is_visible || !col.width.is_star() {
                continue;
            }
            if user_initiated && !col.is_resizable {
                continue;
            }
            if col.display_index < start {
                scale_star_weights = true;
                continue;
            }
            let weight = col.width.value;
            if weight > 0.0 {
                items.push(StarItem {
                    index: col.display_index,
                    weight,
                    display: col.display_value,
                    desired: 0.0,
                    limit: if growing {
                        col.actual_max_width()
                    } else {
                        col.actual_min_width()
                    },
                });
            } else {
                floored.push(col.display_index);
            }
        }
        for &index in &floored {
            if let Some(col) = self.column_mut(index) {
                col.display_value = col.display_value.max(MIN_STAR_WIDTH);
            }
        }
        if items.is_empty() {
            return amount;
        }

        let total_width: f64 = items.iter().map(|i| i.display).sum();
        let total_weight: f64 = items.iter().map(|i| i.weight).sum();

        // How far the group total can move before the first column pins
        // against its own bound, capped by the requested amount.
        let mut limit_move = if growing {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        for item in &items {
            let movement = (item.limit - item.display) * total_weight / item.weight;
            limit_move = if growing {
                limit_move.min(movement)
            } else {
                limit_move.max(movement)
            };
        }
        let adjustment_limit = if growing {
            limit_move.min(amount)
        } else {
            limit_move.max(amount)
        };
        for item in &mut items {
            item.desired = (total_width + adjustment_limit) * item.weight / total_weight;
        }

        // Stage one settles toward the proportional targets, stage two toward
        // the hard bounds with whatever is left.
        let mut consumed = settle_star_columns(&mut items, amount, false);
        let leftover = amount - consumed;
        if !float::is_zero(leftover) {
            consumed += settle_star_columns(&mut items, leftover, true);
        }

        for item in &items {
            if let Some(col) = self.column_mut(item.index) {
                col.display_value = item.display;
                col.desired_value = item.desired;
            }
        }
        if scale_star_weights {
            let new_total: f64 = items.iter().map(|i| i.display).sum();
            if total_width > 0.0 && !float::approx_eq(new_total, total_width) {
                let factor = new_total / total_width;
                for item in &items {
                    if let Some(col) = self.column_mut(item.index) {
                        col.width.value *= factor;
                    }
                }
            }
        }

        amount - consumed
    }
}

/// One settlement pass: distributes `amount` across `items` toward either the
/// proportional targets (`toward_limit` unset) or the hard bounds.
///
/// The proportional target is clamped to the column's own bound: when display
/// widths are off-ratio to the weights, the group-level movement cap alone
/// does not keep every per-column target inside `[min, max]`.
///
/// Columns settle in order of remaining slack per unit weight, so the ones
/// closest to pinning go first and the rest keep their ratios. The sort is
/// stable; ties resolve in display order. Each column consumes the smaller of
/// its distance to target and its weighted share of what is left, floored at
/// the minimum star width.
fn settle_star_columns(items: &mut [StarItem], amount: f64, toward_limit: bool) -> f64 {
    let growing = amount > 0.0;
    let target_of = |item: &StarItem| {
        if toward_limit {
            item.limit
        } else if growing {
            item.desired.min(item.limit)
        } else {
            item.desired.max(item.limit)
        }
    };

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let ka = (target_of(&items[a]) - items[a].display) / items[a].weight;
        let kb = (target_of(&items[b]) - items[b].display) / items[b].weight;
        let ord = ka.partial_cmp(&kb).unwrap_or(Ordering::Equal);
        if growing { ord } else { ord.reverse() }
    });

    let mut remaining = amount;
    let mut remaining_weight: f64 = items.iter().map(|i| i.weight).sum();
    for &i in &order {
        if float::is_zero(remaining) || remaining_weight <= 0.0 {
            break;
        }
        let item = &mut items[i];
        let dist = target_of(item) - item.display;
        let share = item.weight * remaining / remaining_weight;
        let take = if growing {
            dist.max(0.0).min(share.max(0.0))
        } else {
            dist.min(0.0).max(share.min(0.0))
        };
        let settled = (item.display + take).max(MIN_STAR_WIDTH);
        remaining -= settled - item.display;
        item.display = settled;
        remaining_weight -= item.weight;
    }
    amount - remaining
}
