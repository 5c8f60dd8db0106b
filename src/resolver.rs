use crate::float;

/// Source of per-entry extents for [`resolve_window`].
///
/// Implementors enumerate *visible* entries only: `next`/`prev` must skip
/// hidden positions (collapsed slots, hidden columns), and `first` yields the
/// first visible entry. The same trait serves rows (slots) and columns
/// (display indexes).
pub trait ExtentSource {
    fn first(&self) -> Option<usize>;
    fn next(&self, index: usize) -> Option<usize>;
    fn prev(&self, index: usize) -> Option<usize>;
    /// Extent (height or width) of the entry, in pixels.
    fn extent(&self, index: usize) -> f64;
}

/// Inputs to [`resolve_window`].
#[derive(Clone, Copy, Debug)]
pub struct ResolveInput<'a> {
    /// Total available extent, frozen regions included.
    pub available: f64,
    /// Extents of the frozen leading entries, in display order.
    pub frozen_leading: &'a [f64],
    /// Total extent reserved for the frozen trailing region.
    pub frozen_trailing: f64,
    /// First scrolling entry from the previous resolution. Must reference a
    /// currently visible entry (callers normalize before resolving); when
    /// `None`, resolution starts from the first visible entry.
    pub prev_first: Option<usize>,
    /// How much of the first entry is scrolled past the viewport start.
    pub negative_offset: f64,
}

/// Result of one window resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedWindow {
    /// How many frozen leading entries fit (the last may be clipped).
    pub frozen_visible: usize,
    /// First scrolling entry intersecting the viewport.
    pub first: Option<usize>,
    /// Last scrolling entry intersecting the viewport.
    pub last: Option<usize>,
    /// Last entry wholly inside the budget. `last` may be only partially
    /// visible; paging and select-visible-range operations need the
    /// distinction.
    pub last_full: Option<usize>,
    /// How much of `first` is scrolled past the viewport start.
    pub negative_offset: f64,
    /// Signed change the caller must apply to its scroll origin: negative
    /// when under-fill recovery pulled the window backwards.
    pub origin_shift: f64,
    /// Number of scrolling entries intersecting the viewport.
    pub visible_count: usize,
}

/// Determines which entries are visible in `available` extent.
///
/// The walk fills the budget in a fixed order: frozen leading entries, then
/// scrolling entries forward from `prev_first` minus the negative offset.
/// If the viewport is under-filled afterwards (resize, scroll near the end of
/// data), entries are pulled from before the window in a strict order: first
/// the negative offset itself is shrunk, then whole entries are pulled, then
/// one final entry is pulled partially and the negative offset is set to the
/// remainder.
///
/// Deterministic: each entry is visited at most once per directional walk, so
/// the loop bound is the entry count.
pub fn resolve_window(source: &impl ExtentSource, input: ResolveInput<'_>) -> ResolvedWindow {
    let mut out = ResolvedWindow::default();
    let mut budget = input.available.max(0.0);

    // Frozen leading entries consume budget first.
    for &extent in input.frozen_leading {
        if float::le(budget, 0.0) {
            break;
        }
        out.frozen_visible += 1;
        budget -= extent;
    }
    budget = (budget - input.frozen_trailing).max(0.0);

    let Some(start) = input.prev_first.or_else(|| source.first()) else {
        return out;
    };
    if float::le(budget, 0.0) {
        out.negative_offset = input.negative_offset.max(0.0);
        return out;
    }

    let mut first = start;
    let mut neg = input.negative_offset.clamp(0.0, source.extent(start));

    // Forward walk from the scroll origin.
    let mut acc = -neg;
    let mut cursor = Some(start);
    while let Some(index) = cursor {
        acc += source.extent(index);
        out.visible_count += 1;
        out.last = Some(index);
        if float::le(acc, budget) {
            out.last_full = Some(index);
        }
        if float::ge(acc, budget) {
            break;
        }
        cursor = source.next(index);
    }

    // Under-filled viewport: recover extent from before the window.
    let mut deficit = budget - acc;
    if float::gt(deficit, 0.0) && neg > 0.0 {
        let take = neg.min(deficit);
        neg -= take;
        acc += take;
        deficit -= take;
        out.origin_shift -= take;
    }
    while float::gt(deficit, 0.0) {
        let Some(prev) = source.prev(first) else {
            break;
        };
        let extent = source.extent(prev);
        first = prev;
        out.visible_count += 1;
        if float::le(extent, deficit) {
            acc += extent;
            deficit -= extent;
            out.origin_shift -= extent;
        } else {
            // Partially pull the last entry; the hidden remainder becomes the
            // new negative offset.
            neg = extent - deficit;
            out.origin_shift -= deficit;
            break;
        }
    }

    out.first = Some(first);
    out.negative_offset = neg;
    vtrace!(
        first,
        last = ?out.last,
        last_full = ?out.last_full,
        visible = out.visible_count,
        "resolve_window"
    );
    out
}
