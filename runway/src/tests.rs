use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_u64(start as u64, end_exclusive as u64) as u32
    }
}

#[derive(Debug)]
struct Node(usize);

#[derive(Clone, Debug)]
struct NodeState {
    tombstone: bool,
    value: Option<u32>,
    index: Option<usize>,
    attached: bool,
    top: Option<u64>,
    visible: bool,
    frame: FadeFrame,
    destroyed: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct Counts {
    created: usize,
    tombstones_created: usize,
    rebinds: usize,
    positions: usize,
    measures: usize,
    destroyed: usize,
}

/// Records every call and keeps the state a real renderer would.
struct MockFactory {
    nodes: Vec<NodeState>,
    counts: Counts,
    height_of: fn(u32) -> u32,
}

impl MockFactory {
    fn new(height_of: fn(u32) -> u32) -> Self {
        Self {
            nodes: Vec::new(),
            counts: Counts::default(),
            height_of,
        }
    }

    fn spawn(&mut self, tombstone: bool, value: Option<u32>) -> Node {
        self.nodes.push(NodeState {
            tombstone,
            value,
            index: None,
            attached: false,
            top: None,
            visible: true,
            frame: FadeFrame::IDENTITY,
            destroyed: false,
        });
        Node(self.nodes.len() - 1)
    }

    fn attached(&self) -> impl Iterator<Item = &NodeState> {
        self.nodes.iter().filter(|n| n.attached && !n.destroyed)
    }

    fn live(&self) -> usize {
        self.nodes.iter().filter(|n| !n.destroyed).count()
    }
}

impl ViewFactory for MockFactory {
    type Item = u32;
    type Node = Node;

    fn create(&mut self, item: &u32, _index: usize, _count: usize) -> Node {
        self.counts.created += 1;
        self.spawn(false, Some(*item))
    }

    fn create_tombstone(&mut self) -> Node {
        self.counts.tombstones_created += 1;
        self.spawn(true, None)
    }

    fn rebind(&mut self, node: &mut Node, item: &u32, _index: usize, _count: usize) {
        self.counts.rebinds += 1;
        self.nodes[node.0].value = Some(*item);
    }

    fn attach(&mut self, node: &mut Node, index: usize) {
        let state = &mut self.nodes[node.0];
        assert!(!state.attached, "node attached twice");
        state.attached = true;
        state.index = Some(index);
    }

    fn detach(&mut self, node: &mut Node) {
        let state = &mut self.nodes[node.0];
        state.attached = false;
        state.index = None;
    }

    fn measure(&mut self, node: &Node) -> Size {
        self.counts.measures += 1;
        let state = &self.nodes[node.0];
        assert!(state.attached, "measured a detached node");
        Size::new(320, state.value.map_or(0, self.height_of))
    }

    fn set_position(&mut self, node: &mut Node, top: u64) {
        self.counts.positions += 1;
        self.nodes[node.0].top = Some(top);
    }

    fn set_visible(&mut self, node: &mut Node, visible: bool) {
        self.nodes[node.0].visible = visible;
    }

    fn set_fade(&mut self, node: &mut Node, frame: FadeFrame) {
        self.nodes[node.0].frame = frame;
    }

    fn destroy(&mut self, node: Node) {
        self.counts.destroyed += 1;
        let state = &mut self.nodes[node.0];
        assert!(!state.destroyed, "node destroyed twice");
        assert!(!state.attached, "destroyed an attached node");
        state.destroyed = true;
    }
}

fn runway(options: RunwayOptions, height_of: fn(u32) -> u32) -> Runway<MockFactory> {
    Runway::new(options, MockFactory::new(height_of))
}

fn settle(rw: &mut Runway<MockFactory>, now_ms: u64) {
    for _ in 0..32 {
        if !rw.is_awaiting_commit() {
            return;
        }
        rw.commit(now_ms);
    }
    panic!("layout never settled");
}

/// Anchors every item once so the whole list ends up measured.
fn measure_everything(rw: &mut Runway<MockFactory>) {
    for i in 0..rw.item_count() {
        rw.scroll_to_index(i, 0);
        settle(rw, 0);
    }
}

fn prefix(heights: &[u32], index: usize) -> u64 {
    heights[..index].iter().map(|&h| h as u64).sum()
}

#[test]
fn anchor_walk_crosses_measured_items() {
    let heights = [100u32; 100];
    let tracker = AnchorTracker::new(80);

    let a = tracker.advance(&heights[..], Anchor::TOP, 1000);
    assert_eq!(a, Anchor::new(10, 0));
    let a = tracker.advance(&heights[..], a, 250);
    assert_eq!(a, Anchor::new(12, 50));
    let a = tracker.advance(&heights[..], a, -1250);
    assert_eq!(a, Anchor::TOP);
}

#[test]
fn anchor_walk_skips_unmeasured_runs_in_tombstone_units() {
    // 3 measured, 4 unknown, then measured again.
    let heights = [50u32, 50, 50, 0, 0, 0, 0, 30, 30];
    let tracker = AnchorTracker::new(80);

    // 150 across the measured prefix, then 170 = 2 tombstones + 10.
    let a = tracker.advance(&heights[..], Anchor::TOP, 320);
    assert_eq!(a, Anchor::new(5, 10));

    // The run ends at index 7, so the walk resumes on measured heights.
    let a = tracker.advance(&heights[..], Anchor::TOP, 150 + 4 * 80 + 40);
    assert_eq!(a, Anchor::new(8, 10));

    // Backwards: a partial tombstone rounds up to a whole item.
    let a = tracker.advance(&heights[..], Anchor::new(5, 10), -20);
    assert_eq!(a, Anchor::new(4, 70));
}

#[test]
fn anchor_walk_clamps_at_list_bounds() {
    let heights = [100u32; 5];
    let tracker = AnchorTracker::new(80);

    assert_eq!(tracker.advance(&heights[..], Anchor::new(2, 30), -10_000), Anchor::TOP);

    let end = tracker.advance(&heights[..], Anchor::TOP, 600);
    assert_eq!(end, Anchor::new(5, 100));
    assert_eq!(tracker.offset_of(&heights[..], end), 600);
}

#[test]
fn anchor_round_trips_over_random_delta_sequences() {
    let mut rng = Lcg::new(7);
    for _case in 0..200 {
        let len = rng.gen_range_usize(1, 80);
        let heights: Vec<u32> = (0..len)
            .map(|_| {
                if rng.gen_range_u32(0, 3) == 0 {
                    0
                } else {
                    rng.gen_range_u32(1, 200)
                }
            })
            .collect();
        let tomb = rng.gen_range_u32(1, 120);
        let tracker = AnchorTracker::new(tomb);
        let total = heights.as_slice().start_of(len, tomb);
        if total < 2 {
            continue;
        }

        let start_offset = rng.gen_range_u64(0, total);
        let start = tracker.advance(&heights[..], Anchor::TOP, start_offset as i64);
        assert_eq!(tracker.offset_of(&heights[..], start), start_offset);

        // Deltas that stay inside [0, total] and sum to zero.
        let mut offset = start_offset as i64;
        let mut deltas = Vec::new();
        for _ in 0..rng.gen_range_usize(1, 12) {
            let target = rng.gen_range_u64(0, total + 1) as i64;
            deltas.push(target - offset);
            offset = target;
        }
        deltas.push(start_offset as i64 - offset);

        let mut anchor = start;
        for d in deltas {
            anchor = tracker.advance(&heights[..], anchor, d);
        }
        assert_eq!(anchor, start, "heights={heights:?} tomb={tomb}");
    }
}

#[test]
fn range_over_measured_heights_has_overscan_on_both_sides() {
    let heights = [100u32; 100];
    let tracker = AnchorTracker::new(80);
    let anchor = tracker.advance(&heights[..], Anchor::TOP, 1000);

    let r = compute_range(&tracker, &heights[..], anchor, 500, 2);
    assert_eq!(r, AttachedRange::new(8, 17));

    let r = compute_range(&tracker, &heights[..], Anchor::TOP, 500, 2);
    assert_eq!(r, AttachedRange::new(0, 7));

    let end = tracker.advance(&heights[..], Anchor::TOP, 9_700);
    let r = compute_range(&tracker, &heights[..], end, 500, 2);
    assert_eq!(r, AttachedRange::new(95, 100));
}

#[test]
fn fixed_range_counts_overscan_in_rows() {
    assert_eq!(
        compute_fixed_range(1000, 500, 100, 100, 1, 2),
        AttachedRange::new(8, 17)
    );
    assert_eq!(
        compute_fixed_range(0, 250, 10, 100, 3, 1),
        AttachedRange::new(0, 10)
    );
    assert_eq!(
        compute_fixed_range(50_000, 500, 100, 100, 1, 2),
        AttachedRange::new(99, 100)
    );
    assert_eq!(compute_fixed_range(0, 500, 0, 100, 1, 2), AttachedRange::EMPTY);
}

#[test]
fn fixed_height_scroll_attaches_overscanned_window() {
    let mut rw = runway(RunwayOptions::fixed(100).with_has_more(false), |_| 999);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..100, 0);

    let r = rw.on_scroll(1000, 0);
    assert_eq!(r.range, AttachedRange::new(8, 17));
    assert_eq!(r.attached, 9);
    assert_eq!(r.scroll_correction, None);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    assert_eq!(rw.top(8), Some(800));
    assert_eq!(rw.top(16), Some(1600));
    assert!(!rw.is_awaiting_commit());
    assert_eq!(rw.factory().counts.measures, 0);
    assert_eq!(rw.extent(), 10_000);
}

#[test]
fn measured_scroll_attaches_the_same_window() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..100, 0);
    settle(&mut rw, 0);
    measure_everything(&mut rw);
    assert!((0..100).all(|i| rw.height(i) == Some(100)));

    rw.on_scroll(0, 0);
    let r = rw.on_scroll(1000, 0);
    assert_eq!(r.range, AttachedRange::new(8, 17));
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    assert_eq!(rw.extent(), 10_000);
}

#[test]
fn appended_items_settle_at_measured_positions() {
    let published = Arc::new(AtomicU64::new(0));
    let p = Arc::clone(&published);
    let options = RunwayOptions::new()
        .with_tombstone_height(80)
        .with_has_more(false)
        .with_on_extent_change(Some(move |extent| p.store(extent, Ordering::Relaxed)));
    let mut rw = runway(options, |_| 120);
    rw.on_resize(Size::new(320, 600), 0);

    let r = rw.append([1, 2, 3], 0);
    assert_eq!(r.range, AttachedRange::new(0, 3));
    assert_eq!(rw.top(1), Some(80));
    assert_eq!(published.load(Ordering::Relaxed), 240);
    assert!(rw.is_awaiting_commit());

    let r = rw.commit(16);
    assert_eq!(r.measured, 3);
    assert_eq!(r.scroll_correction, None);
    assert_eq!(
        [rw.top(0), rw.top(1), rw.top(2)],
        [Some(0), Some(120), Some(240)]
    );
    assert_eq!(rw.extent(), 360);
    assert_eq!(published.load(Ordering::Relaxed), 360);
    assert!(!rw.is_awaiting_commit());

    // The factory saw the same positions.
    let mut tops: Vec<u64> = rw.factory().attached().filter_map(|n| n.top).collect();
    tops.sort_unstable();
    assert_eq!(tops, [0, 120, 240]);
}

#[test]
fn settled_positions_equal_prefix_sums() {
    fn height_of(v: u32) -> u32 {
        40 + (v * 37) % 90
    }
    let heights: Vec<u32> = (0..60).map(height_of).collect();

    let mut rw = runway(RunwayOptions::new().with_has_more(false), height_of);
    rw.on_resize(Size::new(320, 400), 0);
    rw.append(0..60, 0);
    settle(&mut rw, 0);
    measure_everything(&mut rw);

    let mut rng = Lcg::new(11);
    let total = prefix(&heights, heights.len());
    for _ in 0..50 {
        let offset = rng.gen_range_u64(0, total);
        let r = rw.on_scroll(offset, 0);
        settle(&mut rw, 0);
        for i in r.range.first..r.range.last {
            assert_eq!(rw.top(i), Some(prefix(&heights, i)), "index {i}");
        }
        assert!(rw.attached_count() <= r.range.len());
    }
}

#[test]
fn measurement_above_anchor_reports_scroll_correction() {
    let mut rw = runway(
        RunwayOptions::new()
            .with_tombstone_height(80)
            .with_has_more(false),
        |_| 100,
    );
    rw.on_resize(Size::new(320, 300), 0);
    rw.append(0..50, 0);

    // Jump straight into unmeasured territory: 800 = 10 tombstones.
    rw.on_scroll(800, 0);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    let r = rw.commit(0);
    // Items 8 and 9 (overscan) grew from 80 to 100 above the anchor.
    assert_eq!(r.scroll_correction, Some(840));
    assert_eq!(rw.scroll_offset(), 840);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
}

#[test]
fn zero_height_measurement_counts_as_one_pixel() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 0);
    rw.on_resize(Size::new(320, 100), 0);
    rw.append([1], 0);
    settle(&mut rw, 0);
    assert_eq!(rw.height(0), Some(1));
}

#[test]
fn layout_twice_writes_no_positions() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |v| 50 + v);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..40, 0);
    settle(&mut rw, 0);
    rw.on_scroll(300, 0);
    settle(&mut rw, 0);

    rw.layout(0);
    let writes = rw.factory().counts.positions;
    let r = rw.layout(0);
    assert_eq!(r.positions_written, 0);
    assert_eq!(rw.factory().counts.positions, writes);

    let r = rw.on_scroll(rw.scroll_offset(), 0);
    assert_eq!(r.positions_written, 0);
}

#[test]
fn attached_count_never_exceeds_window() {
    let mut rng = Lcg::new(3);
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |v| 30 + v % 70);
    rw.on_resize(Size::new(320, 600), 0);
    rw.append(0..500, 0);

    for _ in 0..200 {
        let offset = rng.gen_range_u64(0, 40_000);
        let r = rw.on_scroll(offset, 0);
        assert!(r.attached <= r.range.len());
        if rng.gen_range_u32(0, 2) == 0 {
            let r = rw.commit(0);
            assert!(r.attached <= r.range.len());
        }
        assert_eq!(rw.factory().attached().count(), rw.attached_count());
    }
}

#[test]
fn pools_stay_within_capacity_after_each_pass() {
    let mut rng = Lcg::new(99);
    let options = RunwayOptions::new()
        .with_pool_capacity(3)
        .with_tombstone_pool_capacity(2)
        .with_has_more(false);
    let mut rw = runway(options, |_| 60);
    rw.on_resize(Size::new(320, 400), 0);
    rw.append(0..300, 0);
    rw.apply_changes((0..100).map(|i| Change::Placeholder { index: i * 4 }), 0);

    for _ in 0..100 {
        rw.on_scroll(rng.gen_range_u64(0, 30_000), 0);
        settle(&mut rw, 0);
        assert!(rw.pool_len() <= 3);
        assert!(rw.tombstone_pool_len() <= 2);
    }
    assert!(rw.factory().counts.destroyed > 0);
    let live = rw.factory().live();
    assert_eq!(
        live,
        rw.attached_count() + rw.pool_len() + rw.tombstone_pool_len() + rw.fading_count()
    );
}

#[test]
fn scrolling_reuses_pooled_nodes() {
    let mut rw = runway(RunwayOptions::fixed(50).with_has_more(false), |_| 50);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..1000, 0);

    for step in 1..100 {
        rw.on_scroll(step * 40, 0);
        assert!(rw.attached_count() <= 15);
    }
    // Never more nodes than the widest window: everything else came from the pool.
    assert!(rw.factory().counts.created <= 15);
    assert!(rw.factory().counts.rebinds > 0);
}

#[test]
fn pool_prefers_same_slot_and_evicts_oldest() {
    let mut f = MockFactory::new(|_| 10);
    let mut pool = Pool::new(2);

    let nodes: Vec<Node> = (0..3).map(|v| f.create(&v, v as usize, 3)).collect();
    for (slot, node) in nodes.into_iter().enumerate() {
        pool.release(&mut f, node, Some(slot));
    }
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.prune(&mut f), 1);
    assert_eq!(pool.len(), 2);
    assert!(f.nodes[0].destroyed);

    let node = pool.acquire_for(1).expect("pooled node");
    assert_eq!(f.nodes[node.0].value, Some(1));
    let node2 = pool.acquire_for(42).expect("pooled node");
    assert_eq!(f.nodes[node2.0].value, Some(2));
    assert!(pool.acquire().is_none());

    pool.release(&mut f, node, None);
    pool.release(&mut f, node2, None);
    pool.set_capacity(&mut f, 0);
    assert!(pool.is_empty());
    assert_eq!(f.live(), 0);
}

#[test]
fn load_more_fires_once_per_horizon() {
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let options = RunwayOptions::fixed(100).with_on_load_more(Some(move |_req: LoadRequest| {
        f.fetch_add(1, Ordering::SeqCst);
    }));
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 1000), 0);
    rw.append(0..50, 0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    rw.on_scroll(4000, 0);
    assert_eq!(rw.attached_range().last, 50);
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    for offset in [3990, 4000, 4010, 4500, 4000] {
        rw.on_scroll(offset, 0);
    }
    rw.layout(0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(rw.is_loading());

    rw.append(50..60, 0);
    assert!(!rw.is_loading());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    rw.on_scroll(5000, 0);
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn no_load_request_for_empty_or_exhausted_lists() {
    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    let options = RunwayOptions::fixed(100).with_on_load_more(Some(move |_req: LoadRequest| {
        f.fetch_add(1, Ordering::SeqCst);
    }));
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 1000), 0);
    rw.layout(0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    rw.set_has_more(false, 0);
    rw.append(0..3, 0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(rw.extent(), 300);

    rw.set_has_more(true, 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(rw.extent(), 1300);
}

#[test]
fn removing_the_horizon_cancels_the_load_request() {
    let requests: Arc<Mutex<Vec<LoadRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let options = RunwayOptions::fixed(100).with_on_load_more(Some(move |req| {
        log.lock().unwrap().push(req);
    }));
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 1000), 0);
    rw.append(0..5, 0);

    let first = requests.lock().unwrap()[0];
    assert_eq!(first.count, 5);
    assert_eq!(Some(first.horizon), rw.item_id(4));

    rw.apply_changes([Change::Remove { index: 4 }], 0);
    // Still at the tail: a new horizon, a new request.
    let second = *requests.lock().unwrap().last().unwrap();
    assert_ne!(second.ticket, first.ticket);
    assert_eq!(second.count, 4);

    assert!(!rw.complete_load(first.ticket, [100, 101], 0));
    assert_eq!(rw.item_count(), 4);

    assert!(rw.complete_load(second.ticket, [100, 101], 0));
    assert_eq!(rw.item_count(), 6);
    assert_eq!(rw.data(4), Some(&100));
}

#[test]
fn tombstones_beyond_cap_are_hidden() {
    let options = RunwayOptions::new()
        .with_max_tombstones(4)
        .with_has_more(false);
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 2000), 0);
    rw.apply_changes((0..30).map(|index| Change::Placeholder { index }), 0);

    let r = rw.attached_range();
    assert_eq!(r, AttachedRange::new(0, 27));
    assert_eq!(rw.node_kind(0), Some(NodeKind::Tombstone));
    assert_eq!(rw.visible_tombstones(), 4);
    assert_eq!(rw.factory().attached().filter(|n| n.visible).count(), 4);
    assert!(!rw.is_awaiting_commit());

    // Resolving the first placeholders lets hidden tombstones take their turn.
    rw.apply_changes((0..2).map(|index| Change::Update { index, item: 7 }), 0);
    assert_eq!(rw.visible_tombstones(), 4);
    assert_eq!(rw.node_kind(0), Some(NodeKind::Item));
}

#[test]
fn resolved_placeholder_crossfades_out() {
    let options = RunwayOptions::new()
        .with_fade_duration_ms(200)
        .with_has_more(false);
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.apply_changes((0..3).map(|index| Change::Placeholder { index }), 0);
    assert_eq!(rw.top(1), Some(80));

    rw.apply_changes([Change::Update { index: 1, item: 7 }], 0);
    assert_eq!(rw.node_kind(1), Some(NodeKind::Item));
    assert_eq!(rw.data(1), Some(&7));
    assert_eq!(rw.fading_count(), 1);

    rw.tick(100);
    let half = |n: &NodeState| (n.frame.opacity - 0.5).abs() < 1e-6;
    assert!(rw.factory().nodes.iter().any(|n| n.tombstone && half(n)));
    assert!(rw.factory().nodes.iter().any(|n| !n.tombstone && half(n)));

    rw.tick(200);
    assert_eq!(rw.fading_count(), 0);
    assert_eq!(rw.tombstone_pool_len(), 1);
    assert!(rw.factory().nodes.iter().all(|n| n.frame == FadeFrame::IDENTITY));
}

#[test]
fn zero_fade_duration_swaps_immediately() {
    let options = RunwayOptions::new()
        .with_fade_duration_ms(0)
        .with_has_more(false);
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.apply_changes([Change::Placeholder { index: 0 }], 0);
    rw.apply_changes([Change::Update { index: 0, item: 1 }], 0);
    assert_eq!(rw.fading_count(), 0);
    assert_eq!(rw.tombstone_pool_len(), 1);
}

#[test]
fn resize_during_pending_commit_is_deferred_and_last_wins() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 120);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..5, 0);
    assert!(rw.is_awaiting_commit());

    assert!(rw.on_resize(Size::new(320, 600), 10).deferred);
    assert!(rw.on_resize(Size::new(320, 700), 20).deferred);

    assert!(!rw.tick(75).deferred);
    rw.commit(76);
    assert_eq!(rw.height(0), Some(120));

    rw.tick(80);
    assert_eq!(rw.viewport().height, 700);
    assert_eq!(rw.height(0), None);
    assert!(rw.is_awaiting_commit());
}

#[test]
fn deferred_retry_redefers_while_commit_is_outstanding() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 120);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..5, 0);

    assert!(rw.on_resize(Size::new(320, 600), 10).deferred);
    assert!(rw.tick(70).deferred);
    assert!(!rw.tick(100).deferred);
    rw.commit(110);
    assert!(rw.tick(130).range.len() > 0);
    assert!(rw.is_awaiting_commit());
}

#[test]
fn prepend_above_anchor_keeps_it_visually_fixed() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..30, 0);
    settle(&mut rw, 0);
    measure_everything(&mut rw);
    rw.on_scroll(0, 0);
    rw.on_scroll(1000, 0);
    let anchored = rw.item_id(10);

    let r = rw.apply_changes([Change::Insert { index: 0, item: 999 }], 0);
    assert_eq!(rw.anchor(), Anchor::new(11, 0));
    assert_eq!(rw.item_id(11), anchored);
    // The new item is unmeasured: one tombstone height.
    assert_eq!(r.scroll_correction, Some(1080));

    let r = rw.apply_changes([Change::Remove { index: 0 }], 0);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    assert_eq!(r.scroll_correction, Some(1000));
}

#[test]
fn removing_the_anchored_item_resets_its_offset() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..30, 0);
    measure_everything(&mut rw);
    rw.on_scroll(0, 0);
    rw.on_scroll(1050, 0);
    assert_eq!(rw.anchor(), Anchor::new(10, 50));

    rw.apply_changes([Change::Remove { index: 10 }], 0);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    assert_eq!(rw.data(10), Some(&11));
}

#[test]
fn moves_keep_identity_and_rebind_nodes() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..10, 0);
    settle(&mut rw, 0);
    let id = rw.item_id(0);

    rw.apply_changes([Change::Move { from: 0, to: 2 }], 0);
    assert_eq!(rw.item_id(2), id);
    assert_eq!(rw.index_of(id.unwrap()), Some(2));
    assert_eq!(rw.data(0), Some(&1));
    assert_eq!(rw.height(2), Some(100));
    let bound: Vec<_> = rw
        .factory()
        .attached()
        .filter(|n| n.index.is_some())
        .filter_map(|n| n.value)
        .collect();
    assert!(bound.contains(&0));

    // Moving out of the window hands the node back to the pool.
    rw.apply_changes([Change::Move { from: 2, to: 9 }], 0);
    assert_eq!(rw.item_id(9), id);
    assert_eq!(rw.factory().attached().count(), rw.attached_count());
}

#[test]
fn grid_mode_lays_out_rows() {
    let options = RunwayOptions::fixed(100)
        .with_columns(3)
        .with_overscan(0)
        .with_has_more(false);
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(300, 200), 0);
    rw.append(0..10, 0);

    assert_eq!(rw.attached_range(), AttachedRange::new(0, 6));
    assert_eq!(rw.extent(), 400);
    assert_eq!(rw.top(4), Some(100));

    let r = rw.on_scroll(200, 0);
    assert_eq!(r.range, AttachedRange::new(6, 10));
    assert_eq!(rw.top(9), Some(300));
    assert_eq!(rw.anchor(), Anchor::new(6, 0));
    assert_eq!(rw.index_at_offset(250), Some(6));
}

#[test]
fn scroll_to_index_reports_target_offset() {
    let mut rw = runway(RunwayOptions::fixed(50).with_has_more(false), |_| 50);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..100, 0);

    let r = rw.scroll_to_index(20, 0);
    assert_eq!(r.scroll_correction, Some(1000));
    assert!(r.range.contains(20));

    let r = rw.scroll_to_index(5000, 0);
    assert_eq!(rw.anchor().index, 99);
    assert_eq!(r.scroll_correction, Some(4950));
}

#[test]
fn index_at_offset_uses_estimates() {
    let mut rw = runway(
        RunwayOptions::new()
            .with_tombstone_height(80)
            .with_has_more(false),
        |_| 100,
    );
    assert_eq!(rw.index_at_offset(0), None);
    rw.on_resize(Size::new(320, 100), 0);
    rw.append(0..10, 0);
    assert_eq!(rw.index_at_offset(0), Some(0));
    assert_eq!(rw.index_at_offset(79), Some(0));
    assert_eq!(rw.index_at_offset(80), Some(1));
    assert_eq!(rw.index_at_offset(10_000), Some(9));
}

#[test]
fn snapshot_restores_anchor_and_viewport() {
    let mut rw = runway(RunwayOptions::fixed(40).with_has_more(false), |_| 40);
    rw.on_resize(Size::new(320, 400), 0);
    rw.append(0..200, 0);
    rw.on_scroll(2020, 0);
    let snap = rw.snapshot();
    assert_eq!(snap.anchor, Anchor::new(50, 20));

    let mut other = runway(RunwayOptions::fixed(40).with_has_more(false), |_| 40);
    other.append(0..200, 0);
    other.restore(snap, 0);
    assert_eq!(other.scroll_offset(), 2020);
    assert_eq!(other.attached_range(), rw.attached_range());
}

#[test]
fn extent_keeps_floor_until_items_are_removed() {
    let mut rw = runway(
        RunwayOptions::new()
            .with_tombstone_height(100)
            .with_has_more(false),
        |_| 40,
    );
    rw.on_resize(Size::new(320, 300), 0);
    rw.append(0..5, 0);
    assert_eq!(rw.extent(), 500);

    // Measured items are shorter than the estimate: the extent does not shrink.
    settle(&mut rw, 0);
    assert_eq!(rw.extent(), 500);

    rw.apply_changes([Change::Remove { index: 4 }], 0);
    assert_eq!(rw.extent(), 160);
}

#[test]
fn options_change_rebuilds_what_changed() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..50, 0);
    settle(&mut rw, 0);
    assert_eq!(rw.height(0), Some(100));

    rw.update_options(|o| o.pool_capacity = 0, 0);
    assert_eq!(rw.pool_len(), 0);
    assert_eq!(rw.height(0), Some(100));

    rw.update_options(|o| o.fixed_item_height = Some(25), 0);
    assert_eq!(rw.height(0), None);
    assert_eq!(rw.extent(), 50 * 25);
    assert!(!rw.is_awaiting_commit());
}

#[test]
fn destroy_all_releases_every_node() {
    let mut rw = runway(RunwayOptions::new().with_has_more(false), |_| 100);
    rw.on_resize(Size::new(320, 500), 0);
    rw.append(0..40, 0);
    rw.apply_changes([Change::Placeholder { index: 1 }], 0);
    rw.apply_changes([Change::Update { index: 1, item: 5 }], 0);
    rw.on_scroll(2000, 0);

    rw.destroy_all();
    assert_eq!(rw.factory().live(), 0);
    assert_eq!(rw.attached_count(), 0);
    assert_eq!(rw.pool_len(), 0);
    assert_eq!(rw.fading_count(), 0);
    let c = rw.factory().counts;
    assert_eq!(c.destroyed, c.created + c.tombstones_created);
}

#[test]
fn empty_list_is_well_defined() {
    let mut rw = runway(RunwayOptions::new(), |_| 100);
    let r = rw.on_resize(Size::new(320, 500), 0);
    assert_eq!(r.range, AttachedRange::EMPTY);
    assert_eq!(rw.on_scroll(100, 0).range, AttachedRange::EMPTY);
    assert!(!rw.is_loading());

    rw.append(0..3, 0);
    rw.apply_changes((0..3).map(|_| Change::Remove { index: 0 }), 0);
    assert!(rw.is_empty());
    assert_eq!(rw.attached_count(), 0);
    assert_eq!(rw.factory().attached().count(), 0);
}

#[test]
fn fenwick_matches_naive_sums_under_push_and_set() {
    use crate::fenwick::Fenwick;

    let mut rng = Lcg::new(0x5eed);
    let mut naive: Vec<u32> = (0..37).map(|_| rng.gen_range_u32(1, 300)).collect();
    let mut sums = Fenwick::from_heights(naive.iter().copied());

    for step in 0..400 {
        if step % 5 == 0 {
            let h = rng.gen_range_u32(1, 300);
            naive.push(h);
            sums.push(h);
        } else {
            let i = rng.gen_range_usize(0, naive.len());
            let h = rng.gen_range_u32(1, 300);
            naive[i] = h;
            sums.set(i, h);
        }

        assert_eq!(sums.len(), naive.len());
        let total: u64 = naive.iter().map(|&h| h as u64).sum();
        assert_eq!(sums.total(), total);

        let count = rng.gen_range_usize(0, naive.len() + 1);
        let expect: u64 = naive[..count].iter().map(|&h| h as u64).sum();
        assert_eq!(sums.sum_before(count), expect);

        let offset = rng.gen_range_u64(0, total + 1);
        let mut acc = 0u64;
        let fitting = naive
            .iter()
            .take_while(|&&h| {
                acc += h as u64;
                acc <= offset
            })
            .count();
        assert_eq!(sums.count_within(offset), fitting);
    }
}

#[test]
fn grid_bottom_with_partial_last_row_needs_no_correction() {
    let options = RunwayOptions::fixed(100).with_columns(3).with_overscan(0);
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(300, 200), 0);
    rw.append(0..10, 0);
    // Four rows plus one viewport of slack while more data may come.
    assert_eq!(rw.extent(), 600);

    let r = rw.on_scroll(400, 0);
    assert_eq!(r.scroll_correction, None);
    assert_eq!(rw.scroll_offset(), 400);
    assert_eq!(rw.anchor(), Anchor::new(10, 0));
    assert_eq!(rw.offset_of(rw.anchor()), 400);
    assert_eq!(r.range.last, 10);

    let r = rw.on_scroll(350, 0);
    assert_eq!(r.scroll_correction, None);
    assert_eq!(rw.anchor(), Anchor::new(9, 50));
}

#[test]
fn scrolling_to_zero_resets_a_drifted_anchor() {
    let mut rw = runway(
        RunwayOptions::new()
            .with_tombstone_height(80)
            .with_has_more(false),
        |_| 100,
    );
    rw.on_resize(Size::new(320, 300), 0);
    rw.append(0..50, 0);

    rw.on_scroll(800, 0);
    rw.commit(0);
    // Measurements above the anchor moved it away from the offset the host scrolled to.
    assert_eq!(rw.scroll_offset(), 840);
    rw.on_scroll(600, 0);
    assert_ne!(rw.anchor(), Anchor::TOP);

    let r = rw.on_scroll(0, 0);
    assert_eq!(rw.anchor(), Anchor::TOP);
    assert_eq!(r.scroll_correction, None);
    assert_eq!(rw.scroll_offset(), 0);
    assert_eq!(r.range.first, 0);

    while rw.is_awaiting_commit() {
        let r = rw.commit(0);
        assert_eq!(r.scroll_correction, None);
    }
    assert_eq!(rw.anchor(), Anchor::TOP);
    assert_eq!(rw.top(0), Some(0));
    assert_eq!(rw.top(1), Some(100));
}

#[test]
fn reset_load_rearms_the_trigger_once() {
    let requests: Arc<Mutex<Vec<LoadRequest>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let options = RunwayOptions::fixed(100).with_on_load_more(Some(move |req| {
        log.lock().unwrap().push(req);
    }));
    let mut rw = runway(options, |_| 100);
    rw.on_resize(Size::new(320, 1000), 0);
    rw.append(0..5, 0);
    assert_eq!(requests.lock().unwrap().len(), 1);
    let first = requests.lock().unwrap()[0];

    rw.reset_load();
    assert!(!rw.is_loading());
    assert_eq!(requests.lock().unwrap().len(), 1);

    rw.layout(0);
    rw.layout(0);
    rw.on_scroll(0, 0);
    let log = requests.lock().unwrap().clone();
    assert_eq!(log.len(), 2);
    assert_ne!(log[1].ticket, first.ticket);
    assert_eq!(rw.pending_load(), Some(log[1]));

    // The forgotten request can no longer be completed.
    assert!(!rw.complete_load(first.ticket, [7], 0));
    assert_eq!(rw.item_count(), 5);
}

#[test]
fn invalidated_item_is_measured_again_in_place() {
    let mut rw = runway(
        RunwayOptions::new()
            .with_tombstone_height(80)
            .with_has_more(false),
        |_| 100,
    );
    rw.on_resize(Size::new(320, 300), 0);
    rw.append(0..20, 0);
    settle(&mut rw, 0);
    assert_eq!(rw.top(2), Some(200));

    // The node for item 1 expands.
    rw.factory_mut().height_of = |v| if v == 1 { 250 } else { 100 };
    rw.invalidate_item(1, 0);
    assert_eq!(rw.height(1), None);
    assert!(rw.is_awaiting_commit());

    settle(&mut rw, 0);
    assert_eq!(rw.height(1), Some(250));
    assert_eq!(rw.top(2), Some(350));
    assert_eq!(rw.anchor(), Anchor::TOP);
    assert_eq!(rw.node_kind(1), Some(NodeKind::Item));

    // Out of bounds is ignored.
    let r = rw.invalidate_item(99, 0);
    assert_eq!(r.positions_written, 0);
}
