use crate::{Anchor, Size};

/// A lightweight, serializable snapshot of the scroll position and viewport.
///
/// The anchor is index-based: restore it against the same data set. For snapshots that survive
/// reordering, capture an identity anchor in the adapter crate instead.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunwaySnapshot {
    pub anchor: Anchor,
    pub scroll_offset: u64,
    pub viewport: Size,
}
