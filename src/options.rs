use alloc::sync::Arc;

use crate::{Slot, SlotKind};

/// Hook returning the pixel extent (height) of the element at a slot.
///
/// Called for visible slots only; collapsed slots are never queried.
pub type SlotExtentFn = Arc<dyn Fn(Slot, SlotKind) -> f64 + Send + Sync>;

/// Factory invoked when the window needs a new element and the recycle pool
/// for the slot's kind is empty.
pub type CreateElementFn<E> = Arc<dyn Fn(Slot, SlotKind) -> E + Send + Sync>;

/// Configuration for [`crate::GridVirtualizer`].
///
/// Cheap to clone: the collaborator hooks are stored in `Arc`s so callers can
/// tweak a field and reapply without reallocating closures.
pub struct GridOptions<E> {
    /// Extent estimation hook, consulted by window resolution.
    pub slot_extent: SlotExtentFn,
    /// Element factory, consulted when the recycle pools miss.
    pub create_element: CreateElementFn<E>,
    /// Upper bound on recycled elements retained per slot kind. Pools are
    /// trimmed to this after every window update.
    pub max_pooled_per_kind: usize,
}

impl<E> GridOptions<E> {
    pub fn new(
        slot_extent: impl Fn(Slot, SlotKind) -> f64 + Send + Sync + 'static,
        create_element: impl Fn(Slot, SlotKind) -> E + Send + Sync + 'static,
    ) -> Self {
        Self {
            slot_extent: Arc::new(slot_extent),
            create_element: Arc::new(create_element),
            max_pooled_per_kind: 32,
        }
    }

    pub fn with_slot_extent(
        mut self,
        slot_extent: impl Fn(Slot, SlotKind) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.slot_extent = Arc::new(slot_extent);
        self
    }

    pub fn with_create_element(
        mut self,
        create_element: impl Fn(Slot, SlotKind) -> E + Send + Sync + 'static,
    ) -> Self {
        self.create_element = Arc::new(create_element);
        self
    }

    pub fn with_max_pooled_per_kind(mut self, max_pooled_per_kind: usize) -> Self {
        self.max_pooled_per_kind = max_pooled_per_kind;
        self
    }
}

impl<E> Clone for GridOptions<E> {
    fn clone(&self) -> Self {
        Self {
            slot_extent: Arc::clone(&self.slot_extent),
            create_element: Arc::clone(&self.create_element),
            max_pooled_per_kind: self.max_pooled_per_kind,
        }
    }
}

impl<E> core::fmt::Debug for GridOptions<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GridOptions")
            .field("slot_extent", &"Fn(..)")
            .field("create_element", &"Fn(..)")
            .field("max_pooled_per_kind", &self.max_pooled_per_kind)
            .finish()
    }
}
