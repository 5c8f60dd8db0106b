//! The virtualization and layout core of a tabular grid control.
//!
//! Two engines live here:
//! - row virtualization over a *slot* address space (data rows interleaved
//!   with group headers/footers, groups collapsible), realizing only the
//!   elements intersecting the viewport and recycling the rest;
//! - star-sizing column layout, distributing width deltas across fixed,
//!   auto, and proportional columns under per-column min/max bounds.
//!
//! It is UI-agnostic. A rendering layer is expected to provide:
//! - available viewport extents
//! - per-slot extent estimates (row/header/footer heights)
//! - an element factory (and whatever an "element" is)
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod collapsed;
mod column;
mod error;
mod float;
mod grid;
mod index_table;
mod layout;
mod options;
mod resolver;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use collapsed::RangeSet;
pub use column::{AdjustState, Column, ColumnSet, ColumnWidth, FrozenPosition, WidthKind};
pub use error::{Error, Result};
pub use grid::GridVirtualizer;
pub use index_table::SlotTable;
pub use options::{CreateElementFn, GridOptions, SlotExtentFn};
pub use resolver::{ExtentSource, ResolveInput, ResolvedWindow, resolve_window};
pub use types::{GroupInfo, GroupKey, Slot, SlotKind, SlotRange};
pub use window::{ElementWindow, RecyclePools};
