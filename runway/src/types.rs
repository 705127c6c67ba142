/// Rendered size of a node, or the size of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The item that should stay visually stable, plus how far past the viewport top it is
/// scrolled.
///
/// `index` never exceeds the item count. `offset` is measured from the item's top edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Anchor {
    pub index: usize,
    pub offset: u64,
}

impl Anchor {
    pub const TOP: Self = Self {
        index: 0,
        offset: 0,
    };

    pub fn new(index: usize, offset: u64) -> Self {
        Self { index, offset }
    }
}

/// The attached window `[first, last)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachedRange {
    pub first: usize,
    pub last: usize, // exclusive
}

impl AttachedRange {
    pub const EMPTY: Self = Self { first: 0, last: 0 };

    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first)
    }

    pub fn is_empty(&self) -> bool {
        self.first >= self.last
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index < self.last
    }
}

/// Stable identity of an item, assigned when the item enters the table.
///
/// Ids survive moves and identity-preserving updates, and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

/// What kind of node is attached to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A node bound to the item's data.
    Item,
    /// A placeholder standing in for a slot without data.
    Tombstone,
}

/// Outcome of a layout, measurement, or tick pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// The attached window after the pass.
    pub range: AttachedRange,
    /// Number of nodes attached after the pass (tombstones included, fading ones excluded).
    pub attached: usize,
    /// Number of `set_position` calls issued.
    pub positions_written: usize,
    /// Number of nodes measured.
    pub measured: usize,
    /// New absolute scroll offset the host must apply to keep the anchor in place.
    pub scroll_correction: Option<u64>,
    /// `true` when the request was coalesced into a deferred retry instead of running.
    pub deferred: bool,
}
