/// A position in the unified display-order address space.
///
/// Slots cover data rows interleaved with group headers and footers. They are
/// dense: every slot in `0..slot_count` is a row, a header, or a footer, even
/// while some of them are hidden inside collapsed groups.
pub type Slot = usize;

/// Stable identity of a group, assigned by the dataset provider.
///
/// The core never interprets this value; it only hands it back so adapters can
/// map slots to their own group objects.
pub type GroupKey = u64;

/// What kind of element occupies a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotKind {
    Row,
    GroupHeader,
    GroupFooter,
}

/// An inclusive range of slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotRange {
    pub start: Slot,
    /// Inclusive.
    pub end: Slot,
}

impl SlotRange {
    pub fn new(start: Slot, end: Slot) -> Self {
        debug_assert!(start <= end, "inverted slot range ({start}..={end})");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // inclusive ranges always hold at least one slot
    }

    pub fn contains(&self, slot: Slot) -> bool {
        slot >= self.start && slot <= self.end
    }

    pub fn intersects(&self, other: SlotRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Metadata for one group header in the slot address space.
///
/// Owned by the grid's ordered index table and mutated in place as
/// insertions/removals shift descendant counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupInfo {
    /// Nesting depth, 0 for top-level groups.
    pub level: usize,
    /// The header's own slot.
    pub slot: Slot,
    /// The last slot belonging to this group (descendants included).
    /// Always `>= slot`.
    pub last_sub_item_slot: Slot,
    /// Whether the group occupies a trailing footer slot.
    ///
    /// When set, the footer is the group's `last_sub_item_slot` and is hidden
    /// together with the rest of the sub items on collapse.
    pub has_footer: bool,
    /// Whether the group's sub items are currently shown (i.e. not collapsed).
    pub is_visible: bool,
    /// Opaque handle into the dataset provider's group object.
    pub key: GroupKey,
}

impl GroupInfo {
    pub fn new(level: usize, slot: Slot, last_sub_item_slot: Slot, key: GroupKey) -> Self {
        debug_assert!(last_sub_item_slot >= slot);
        Self {
            level,
            slot,
            last_sub_item_slot,
            has_footer: false,
            is_visible: true,
            key,
        }
    }

    pub fn with_footer(mut self) -> Self {
        self.has_footer = true;
        self
    }

    /// Slot of the footer, when the group has one.
    pub fn footer_slot(&self) -> Option<Slot> {
        self.has_footer.then_some(self.last_sub_item_slot)
    }

    /// Number of descendant slots (everything after the header, footer included).
    pub fn sub_item_count(&self) -> usize {
        self.last_sub_item_slot - self.slot
    }

    /// The descendant slot range, or `None` for an empty group.
    pub fn sub_item_range(&self) -> Option<SlotRange> {
        (self.last_sub_item_slot > self.slot)
            .then(|| SlotRange::new(self.slot + 1, self.last_sub_item_slot))
    }
}
