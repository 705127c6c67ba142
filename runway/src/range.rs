use crate::anchor::{AnchorTracker, Heights};
use crate::{Anchor, AttachedRange, ItemId};

/// Derives the attached window from an anchor.
///
/// `first = anchor.index - overscan`; `last` is the index the anchor walk reaches after one
/// viewport height, plus `overscan`. Both are clamped to the item count, and the window always
/// contains the anchor while the anchor points at an item.
pub fn compute_range<H: Heights + ?Sized>(
    tracker: &AnchorTracker,
    heights: &H,
    anchor: Anchor,
    viewport_height: u32,
    overscan: usize,
) -> AttachedRange {
    let count = heights.len();
    if count == 0 {
        return AttachedRange::EMPTY;
    }

    let bottom = tracker.advance(heights, anchor, viewport_height as i64);
    let mut last = bottom.index.saturating_add(overscan).min(count);
    if anchor.index < count {
        last = last.max(anchor.index + 1);
    }
    let first = anchor.index.saturating_sub(overscan).min(last);

    AttachedRange { first, last }
}

/// Window for lists whose items all share `item_height`, laid out `columns` per row.
///
/// Overscan is counted in rows.
pub fn compute_fixed_range(
    scroll_offset: u64,
    viewport_height: u32,
    count: usize,
    item_height: u32,
    columns: usize,
    overscan: usize,
) -> AttachedRange {
    if count == 0 {
        return AttachedRange::EMPTY;
    }
    let h = item_height.max(1) as u64;
    let columns = columns.max(1);
    let rows = count.div_ceil(columns);

    let first_row = (scroll_offset / h) as usize;
    let last_row = scroll_offset
        .saturating_add(viewport_height as u64)
        .div_ceil(h) as usize;

    let first_row = first_row.saturating_sub(overscan).min(rows.saturating_sub(1));
    let last_row = last_row.saturating_add(overscan).min(rows).max(first_row + 1);

    AttachedRange {
        first: first_row * columns,
        last: (last_row * columns).min(count),
    }
}

/// A pending request for more data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRequest {
    /// Pass this back to `Runway::complete_load`.
    pub ticket: u64,
    /// The last known item when the request was raised. Removing it cancels the request.
    pub horizon: ItemId,
    /// Item count when the request was raised.
    pub count: usize,
}

/// Edge trigger for "scrolled to the data horizon".
///
/// At most one request is in flight; it stays in flight until cleared by new data, an explicit
/// reset, or cancellation.
#[derive(Clone, Debug, Default)]
pub(crate) struct LoadGate {
    in_flight: Option<LoadRequest>,
    next_ticket: u64,
}

impl LoadGate {
    pub(crate) fn check(
        &mut self,
        range: AttachedRange,
        count: usize,
        horizon: Option<ItemId>,
        has_more: bool,
    ) -> Option<LoadRequest> {
        if !has_more || self.in_flight.is_some() || count == 0 || range.last != count {
            return None;
        }
        let horizon = horizon?;
        let request = LoadRequest {
            ticket: self.next_ticket,
            horizon,
            count,
        };
        self.next_ticket += 1;
        self.in_flight = Some(request);
        rdebug!(ticket = request.ticket, count, "load more");
        Some(request)
    }

    pub(crate) fn in_flight(&self) -> Option<LoadRequest> {
        self.in_flight
    }

    pub(crate) fn clear(&mut self) -> Option<LoadRequest> {
        self.in_flight.take()
    }

    /// Clears the request if it was raised against `removed`.
    pub(crate) fn cancel_for(&mut self, removed: ItemId) -> bool {
        match self.in_flight {
            Some(req) if req.horizon == removed => {
                rdebug!(ticket = req.ticket, "load request cancelled");
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Clears the request if `ticket` is the one in flight.
    pub(crate) fn settle(&mut self, ticket: u64) -> bool {
        match self.in_flight {
            Some(req) if req.ticket == ticket => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}
