use alloc::vec::Vec;

/// Binary indexed tree over effective item heights.
///
/// Keeps a copy of each height so callers set values instead of passing deltas.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fenwick {
    heights: Vec<u32>,
    // nodes[i - 1] covers heights[i - lowbit(i)..i]
    nodes: Vec<u64>,
    total: u64,
}

impl Fenwick {
    pub(crate) fn from_heights(heights: impl IntoIterator<Item = u32>) -> Self {
        let heights: Vec<u32> = heights.into_iter().collect();
        let n = heights.len();
        let mut nodes: Vec<u64> = heights.iter().map(|&h| h as u64).collect();
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                nodes[parent - 1] = nodes[parent - 1].saturating_add(nodes[i - 1]);
            }
        }
        let total = heights.iter().map(|&h| h as u64).sum();
        Self {
            heights,
            nodes,
            total,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.heights.len()
    }

    /// Appends one height without rebuilding.
    pub(crate) fn push(&mut self, height: u32) {
        let i = self.heights.len() + 1;
        let covered = self
            .sum_before(i - 1)
            .saturating_sub(self.sum_before(i - lowbit(i)));
        self.heights.push(height);
        self.nodes.push(covered.saturating_add(height as u64));
        self.total = self.total.saturating_add(height as u64);
    }

    pub(crate) fn set(&mut self, index: usize, height: u32) {
        let Some(slot) = self.heights.get_mut(index) else {
            return;
        };
        let old = core::mem::replace(slot, height) as u64;
        let new = height as u64;
        if old == new {
            return;
        }
        self.total = self.total - old + new;
        let mut i = index + 1;
        while i <= self.nodes.len() {
            let node = &mut self.nodes[i - 1];
            *node = *node - old + new;
            i += lowbit(i);
        }
    }

    /// Sum of the first `count` heights.
    pub(crate) fn sum_before(&self, count: usize) -> u64 {
        let mut i = count.min(self.nodes.len());
        let mut sum = 0u64;
        while i > 0 {
            sum = sum.saturating_add(self.nodes[i - 1]);
            i -= lowbit(i);
        }
        sum
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// How many leading heights fit entirely within `offset`.
    pub(crate) fn count_within(&self, offset: u64) -> usize {
        let n = self.nodes.len();
        let mut pos = 0usize;
        let mut rest = offset;
        let mut step = if n == 0 { 0 } else { 1usize << n.ilog2() };
        while step > 0 {
            let next = pos + step;
            if next <= n && self.nodes[next - 1] <= rest {
                rest -= self.nodes[next - 1];
                pos = next;
            }
            step >>= 1;
        }
        pos
    }
}

fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}
