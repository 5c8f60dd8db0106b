use crate::Slot;

/// Errors reported by the grid core.
///
/// All operations are synchronous and local; every variant is a contract
/// violation by the caller, rejected before any state is mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A display-index mutation was requested while another display-index
    /// adjustment was already in progress.
    #[error("invalid concurrent display-index adjustment")]
    ReentrantAdjustment,

    /// `ElementWindow::load` was called with a slot that is neither adjacent
    /// to the realized range nor a seed for an empty window.
    #[error("slot {slot} is not adjacent to the realized window")]
    NonAdjacentSlot { slot: Slot },

    /// A group operation was invoked on a slot that holds no group header.
    #[error("slot {slot} is not a group header")]
    NotAGroup { slot: Slot },

    /// A row-only operation was invoked on a span containing a group header
    /// or footer slot.
    #[error("slot {slot} is not a data row")]
    NotARow { slot: Slot },

    /// A column operation referenced a display index past the end of the set.
    #[error("display index {display_index} is out of bounds")]
    DisplayIndexOutOfBounds { display_index: usize },

    /// A column operation referenced a stable index no column carries.
    #[error("no column with stable index {stable_index}")]
    UnknownStableIndex { stable_index: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
