use alloc::vec::Vec;

use crate::resolver::{ExtentSource, ResolveInput, ResolvedWindow, resolve_window};
use crate::{Error, Result};

/// Width floor applied to star columns during settlement, keeping them
/// hit-testable and the weight division well-defined.
pub(crate) const MIN_STAR_WIDTH: f64 = 0.001;

/// How a column's width is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WidthKind {
    /// A fixed pixel width.
    Fixed,
    /// Sized to content; the measured width arrives via `desired_value`.
    Auto,
    /// A proportional share of the remaining space, weighted by `value`.
    Star,
}

/// Whether a column is excluded from horizontal scrolling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrozenPosition {
    #[default]
    None,
    Left,
    Right,
}

/// Declared width: a kind plus a pixel value (`Fixed`) or star weight
/// (`Star`). The value is unused for `Auto`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnWidth {
    pub kind: WidthKind,
    pub value: f64,
}

impl ColumnWidth {
    pub fn fixed(pixels: f64) -> Self {
        Self {
            kind: WidthKind::Fixed,
            value: pixels,
        }
    }

    pub fn auto() -> Self {
        Self {
            kind: WidthKind::Auto,
            value: 0.0,
        }
    }

    pub fn star(weight: f64) -> Self {
        Self {
            kind: WidthKind::Star,
            value: weight,
        }
    }

    pub fn is_star(&self) -> bool {
        self.kind == WidthKind::Star
    }
}

/// One column of the grid.
///
/// `display_index` is the column's mutable position in rendering order;
/// `stable_index` is its identity and never changes after creation.
/// `desired_value` is `NaN` until the column is measured; the sentinel means
/// "unconstrained", never zero.
#[derive(Clone, Debug)]
pub struct Column {
    pub(crate) display_index: usize,
    pub(crate) stable_index: usize,
    pub(crate) width: ColumnWidth,
    pub(crate) desired_value: f64,
    pub(crate) display_value: f64,
    pub(crate) min_width: f64,
    pub(crate) max_width: f64,
    pub(crate) is_visible: bool,
    pub(crate) is_resizable: bool,
    pub(crate) frozen: FrozenPosition,
}

impl Column {
    pub fn new(width: ColumnWidth) -> Self {
        let display_value = match width.kind {
            WidthKind::Fixed => width.value,
            WidthKind::Auto | WidthKind::Star => 0.0,
        };
        Self {
            display_index: 0,
            stable_index: 0,
            width,
            desired_value: f64::NAN,
            display_value,
            min_width: 0.0,
            max_width: f64::INFINITY,
            is_visible: true,
            is_resizable: true,
            frozen: FrozenPosition::None,
        }
    }

    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_display_value(mut self, display_value: f64) -> Self {
        self.display_value = display_value;
        self
    }

    pub fn with_visible(mut self, is_visible: bool) -> Self {
        self.is_visible = is_visible;
        self
    }

    pub fn with_resizable(mut self, is_resizable: bool) -> Self {
        self.is_resizable = is_resizable;
        self
    }

    pub fn with_frozen(mut self, frozen: FrozenPosition) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn display_index(&self) -> usize {
        self.display_index
    }

    pub fn stable_index(&self) -> usize {
        self.stable_index
    }

    pub fn width(&self) -> ColumnWidth {
        self.width
    }

    /// Current rendered width.
    pub fn display_value(&self) -> f64 {
        self.display_value
    }

    /// Measured width, or `NaN` when not yet measured.
    pub fn desired_value(&self) -> f64 {
        self.desired_value
    }

    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn is_resizable(&self) -> bool {
        self.is_resizable
    }

    pub fn frozen(&self) -> FrozenPosition {
        self.frozen
    }

    pub(crate) fn is_measured(&self) -> bool {
        !self.desired_value.is_nan()
    }

    /// Effective lower bound: star columns never shrink below the star floor.
    pub(crate) fn actual_min_width(&self) -> f64 {
        let min = if self.min_width.is_nan() {
            0.0
        } else {
            self.min_width
        };
        if self.width.is_star() {
            min.max(MIN_STAR_WIDTH)
        } else {
            min
        }
    }

    /// Effective upper bound; `NaN` means unconstrained.
    pub(crate) fn actual_max_width(&self) -> f64 {
        if self.max_width.is_nan() {
            f64::INFINITY
        } else {
            self.max_width
        }
    }
}

/// Guard state for display-index mutation (one explicit enum instead of
/// scattered booleans).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdjustState {
    #[default]
    Idle,
    AdjustingDisplayIndexes,
}

/// The ordered column collection plus the star-sizing layout engine.
///
/// Columns are stored in display order (position == `display_index`);
/// `stable_index` is assigned at insertion and survives reordering.
#[derive(Clone, Debug, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
    next_stable_index: usize,
    pub(crate) adjust_state: AdjustState,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            next_stable_index: 0,
            adjust_state: AdjustState::Idle,
        }
    }

    /// Appends a column, returning its stable index.
    pub fn push(&mut self, mut column: Column) -> usize {
        let stable = self.next_stable_index;
        self.next_stable_index += 1;
        column.stable_index = stable;
        column.display_index = self.columns.len();
        self.columns.push(column);
        stable
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn column(&self, display_index: usize) -> Option<&Column> {
        self.columns.get(display_index)
    }

    pub(crate) fn column_mut(&mut self, display_index: usize) -> Option<&mut Column> {
        self.columns.get_mut(display_index)
    }

    pub fn by_stable_index(&self, stable_index: usize) -> Option<&Column> {
        self.columns.iter().find(|c| c.stable_index == stable_index)
    }

    pub fn display_index_adjustment_in_progress(&self) -> bool {
        self.adjust_state == AdjustState::AdjustingDisplayIndexes
    }

    /// Moves the column identified by `stable_index` to `new_display_index`,
    /// shifting the columns in between.
    ///
    /// Fails fast with [`Error::ReentrantAdjustment`] when a display-index
    /// adjustment is already in progress; nothing is committed in that case.
    pub fn set_display_index(&mut self, stable_index: usize, new_display_index: usize) -> Result<()> {
        if self.adjust_state == AdjustState::AdjustingDisplayIndexes {
            return Err(Error::ReentrantAdjustment);
        }
        if new_display_index >= self.columns.len() {
            return Err(Error::DisplayIndexOutOfBounds {
                display_index: new_display_index,
            });
        }
        let Some(from) = self.columns.iter().position(|c| c.stable_index == stable_index) else {
            return Err(Error::UnknownStableIndex { stable_index });
        };
        if from == new_display_index {
            return Ok(());
        }

        self.adjust_state = AdjustState::AdjustingDisplayIndexes;
        let column = self.columns.remove(from);
        self.columns.insert(new_display_index, column);
        for (i, c) in self.columns.iter_mut().enumerate() {
            c.display_index = i;
        }
        self.adjust_state = AdjustState::Idle;
        vdebug!(stable_index, new_display_index, "set_display_index");
        Ok(())
    }

    pub fn set_visible(&mut self, display_index: usize, is_visible: bool) -> Result<()> {
        let column = self
            .columns
            .get_mut(display_index)
            .ok_or(Error::DisplayIndexOutOfBounds { display_index })?;
        column.is_visible = is_visible;
        Ok(())
    }

    /// Records a content measurement for a column (auto-fit input).
    pub fn set_desired_value(&mut self, display_index: usize, desired_value: f64) -> Result<()> {
        let column = self
            .columns
            .get_mut(display_index)
            .ok_or(Error::DisplayIndexOutOfBounds { display_index })?;
        column.desired_value = desired_value;
        Ok(())
    }

    pub fn set_display_value(&mut self, display_index: usize, display_value: f64) -> Result<()> {
        let column = self
            .columns
            .get_mut(display_index)
            .ok_or(Error::DisplayIndexOutOfBounds { display_index })?;
        column.display_value = display_value;
        Ok(())
    }

    /// Total rendered width of visible columns.
    pub fn visible_width(&self) -> f64 {
        self.columns
            .iter()
            .filter(|c| c.is_visible)
            .map(|c| c.display_value)
            .sum()
    }

    /// Display values of visible left-frozen columns, in display order.
    pub fn frozen_leading_widths(&self) -> Vec<f64> {
        self.columns
            .iter()
            .filter(|c| c.is_visible && c.frozen == FrozenPosition::Left)
            .map(|c| c.display_value)
            .collect()
    }

    /// Total width of visible right-frozen columns.
    pub fn frozen_trailing_width(&self) -> f64 {
        self.columns
            .iter()
            .filter(|c| c.is_visible && c.frozen == FrozenPosition::Right)
            .map(|c| c.display_value)
            .sum()
    }

    /// Resolves the first/last visible scrolling column for `available`
    /// width, excluding frozen regions from scrolling.
    pub fn resolve_visible(
        &self,
        available: f64,
        prev_first: Option<usize>,
        negative_offset: f64,
    ) -> ResolvedWindow {
        let leading = self.frozen_leading_widths();
        resolve_window(
            &ScrollingColumns { set: self },
            ResolveInput {
                available,
                frozen_leading: &leading,
                frozen_trailing: self.frozen_trailing_width(),
                prev_first,
                negative_offset,
            },
        )
    }

    fn is_scrolling(&self, display_index: usize) -> bool {
        self.columns
            .get(display_index)
            .is_some_and(|c| c.is_visible && c.frozen == FrozenPosition::None)
    }
}

/// [`ExtentSource`] over the visible, non-frozen columns of a set, keyed by
/// display index.
struct ScrollingColumns<'a> {
    set: &'a ColumnSet,
}

impl ExtentSource for ScrollingColumns<'_> {
    fn first(&self) -> Option<usize> {
        (0..self.set.len()).find(|&i| self.set.is_scrolling(i))
    }

    fn next(&self, index: usize) -> Option<usize> {
        (index + 1..self.set.len()).find(|&i| self.set.is_scrolling(i))
    }

    fn prev(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| self.set.is_scrolling(i))
    }

    fn extent(&self, index: usize) -> f64 {
        self.set
            .column(index)
            .map(|c| c.display_value)
            .unwrap_or(0.0)
    }
}
