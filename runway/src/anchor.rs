use crate::Anchor;

/// Read access to item heights, as needed by the anchor walk.
///
/// `measured_height` returns 0 for items whose height is not known yet.
pub trait Heights {
    fn len(&self) -> usize;

    fn measured_height(&self, index: usize) -> u32;

    /// Start offset of `index`, counting unmeasured items as `fallback` pixels.
    ///
    /// The default walks every preceding item. Implementations backed by prefix sums should
    /// override it.
    fn start_of(&self, index: usize, fallback: u32) -> u64 {
        let end = index.min(self.len());
        let mut start = 0u64;
        for i in 0..end {
            let h = self.measured_height(i);
            start = start.saturating_add(if h > 0 { h } else { fallback } as u64);
        }
        start
    }
}

impl Heights for [u32] {
    fn len(&self) -> usize {
        <[u32]>::len(self)
    }

    fn measured_height(&self, index: usize) -> u32 {
        self.get(index).copied().unwrap_or(0)
    }
}

/// Converts scroll deltas into anchor moves.
///
/// Measured items are crossed one by one. Runs of unmeasured items are crossed in whole
/// tombstone-height units: a forward remainder skips `floor(rest / tombstone)` of them, a
/// backward remainder steps back `ceil(rest / tombstone)`. The walk never goes below index 0
/// or past the item count.
///
/// After a move, `offset` is smaller than the effective height of the anchored item (unless
/// the anchor sits at the item count), so moving by `d` and then by `-d` returns to the same
/// anchor as long as neither move hit the top of the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorTracker {
    tombstone_height: u32,
}

impl AnchorTracker {
    pub fn new(tombstone_height: u32) -> Self {
        Self {
            tombstone_height: tombstone_height.max(1),
        }
    }

    pub fn tombstone_height(&self) -> u32 {
        self.tombstone_height
    }

    /// Moves `anchor` by `delta` pixels (positive = towards the end of the list).
    pub fn advance<H: Heights + ?Sized>(&self, heights: &H, anchor: Anchor, delta: i64) -> Anchor {
        if delta == 0 {
            return anchor;
        }

        let count = heights.len();
        let tomb = self.tombstone_height as i128;
        let mut index = anchor.index.min(count);
        let mut rest = anchor.offset as i128 + delta as i128;

        while rest < 0 && index > 0 {
            let h = heights.measured_height(index - 1);
            if h > 0 {
                rest += h as i128;
                index -= 1;
                continue;
            }
            let wanted = ((-rest + tomb - 1) / tomb).min(index as i128) as usize;
            let run = unmeasured_run(heights, (index - wanted..index).rev());
            index -= run;
            rest += run as i128 * tomb;
        }
        // Only reachable at index 0: the list has no content above.
        rest = rest.max(0);

        while index < count {
            let h = heights.measured_height(index);
            if h > 0 {
                if h as i128 > rest {
                    break;
                }
                rest -= h as i128;
                index += 1;
                continue;
            }
            let wanted = (rest / tomb).min((count - index) as i128) as usize;
            if wanted == 0 {
                break;
            }
            let run = unmeasured_run(heights, index..index + wanted);
            index += run;
            rest -= run as i128 * tomb;
        }

        Anchor {
            index,
            offset: rest.clamp(0, u64::MAX as i128) as u64,
        }
    }

    /// Converts `anchor` back into an absolute scroll offset.
    pub fn offset_of<H: Heights + ?Sized>(&self, heights: &H, anchor: Anchor) -> u64 {
        heights
            .start_of(anchor.index.min(heights.len()), self.tombstone_height)
            .saturating_add(anchor.offset)
    }
}

/// Number of leading indices in `indices` whose height is unknown.
fn unmeasured_run<H: Heights + ?Sized>(heights: &H, indices: impl Iterator<Item = usize>) -> usize {
    indices
        .take_while(|&i| heights.measured_height(i) == 0)
        .count()
}
