use runway::{Anchor, ItemId, PassReport, Runway, ViewFactory};

/// A scroll position expressed against an item's identity instead of its index.
///
/// Survives reorders, moves, and inserts/removals elsewhere in the list: capture before
/// changing data, apply after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollAnchor {
    pub item: ItemId,
    /// Distance from the item's top edge to the top of the viewport.
    pub offset: u64,
}

/// Captures the engine's current anchor by identity.
///
/// Returns `None` for an empty list, or when the anchor sits past the last item.
pub fn capture_anchor<F: ViewFactory>(rw: &Runway<F>) -> Option<ScrollAnchor> {
    let anchor = rw.anchor();
    let item = rw.item_id(anchor.index)?;
    Some(ScrollAnchor {
        item,
        offset: anchor.offset,
    })
}

/// Re-anchors the engine on a previously captured item.
///
/// Returns `None` (and leaves the engine untouched) if the item no longer exists. The
/// report's `scroll_correction` carries the new scroll offset.
pub fn apply_anchor<F: ViewFactory>(
    rw: &mut Runway<F>,
    anchor: &ScrollAnchor,
    now_ms: u64,
) -> Option<PassReport> {
    let index = rw.index_of(anchor.item)?;
    Some(rw.scroll_to_anchor(Anchor::new(index, anchor.offset), now_ms))
}
