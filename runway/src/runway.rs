use alloc::vec::Vec;

use crate::anchor::{AnchorTracker, Heights};
use crate::extent::ExtentPublisher;
use crate::fade::{CrossFade, crossfade_frames};
use crate::items::{Attached, Item, ItemTable};
use crate::pool::Pool;
use crate::range::{LoadGate, compute_fixed_range, compute_range};
use crate::{
    Anchor, AttachedRange, Change, Easing, FadeFrame, ItemId, LoadRequest, NodeKind, PassReport,
    RunwayOptions, RunwaySnapshot, Size, ViewFactory,
};

/// The windowing engine.
///
/// Owns the item table, both pools and every attached node handle. The host drives it with
/// discrete events:
///
/// - viewport: [`Runway::on_scroll`], [`Runway::on_resize`]
/// - rendering: [`Runway::commit`] once the last layout has been committed and sizes can be
///   read, [`Runway::tick`] on a timer/frame for deferred work and cross-fades
/// - data: [`Runway::apply_changes`], [`Runway::append`], [`Runway::complete_load`]
///
/// Every call runs to completion. Passes that move the anchor's absolute position return the
/// new scroll offset in [`PassReport::scroll_correction`]; the host should apply it to its
/// scroll container.
pub struct Runway<F: ViewFactory> {
    options: RunwayOptions,
    factory: F,
    items: ItemTable<F::Item, F::Node>,
    pool: Pool<F::Node>,
    tombstones: Pool<F::Node>,
    fades: Vec<CrossFade<F::Node>>,
    tracker: AnchorTracker,
    anchor: Anchor,
    scroll_offset: u64,
    viewport: Size,
    range: AttachedRange,
    // Indices that may still own nodes; a superset of `range` between data changes and layout.
    span: AttachedRange,
    loads: LoadGate,
    extent: ExtentPublisher,
    awaiting_commit: bool,
    deferred_remeasure: Option<u64>,
}

impl<F: ViewFactory> Runway<F> {
    pub fn new(options: RunwayOptions, factory: F) -> Self {
        rdebug!(
            overscan = options.overscan,
            tombstone_height = options.tombstone_height,
            fixed = options.fixed_item_height.is_some(),
            "Runway::new"
        );
        let fallback = options.fallback_height();
        Self {
            pool: Pool::new(options.pool_capacity),
            tombstones: Pool::new(options.tombstone_pool_capacity),
            items: ItemTable::new(fallback),
            tracker: AnchorTracker::new(fallback),
            fades: Vec::new(),
            anchor: Anchor::TOP,
            scroll_offset: 0,
            viewport: Size::default(),
            range: AttachedRange::EMPTY,
            span: AttachedRange::EMPTY,
            loads: LoadGate::default(),
            extent: ExtentPublisher::default(),
            awaiting_commit: false,
            deferred_remeasure: None,
            options,
            factory,
        }
    }

    pub fn options(&self) -> &RunwayOptions {
        &self.options
    }

    /// Applies a new configuration and re-runs layout.
    ///
    /// Pool capacities take effect immediately (excess nodes are destroyed). Switching between
    /// fixed-height and measured mode forgets all measurements.
    pub fn set_options(&mut self, options: RunwayOptions, now_ms: u64) -> PassReport {
        let prev_fixed = self.options.fixed_item_height;
        self.options = options;
        rtrace!(
            overscan = self.options.overscan,
            fixed = self.options.fixed_item_height.is_some(),
            "Runway::set_options"
        );

        self.pool
            .set_capacity(&mut self.factory, self.options.pool_capacity);
        self.tombstones
            .set_capacity(&mut self.factory, self.options.tombstone_pool_capacity);

        let fallback = self.options.fallback_height();
        if prev_fixed != self.options.fixed_item_height {
            self.items.invalidate();
            self.extent.allow_shrink();
        }
        if self.items.fallback() != fallback {
            self.items.set_fallback(fallback);
            self.extent.allow_shrink();
        }
        self.tracker = AnchorTracker::new(fallback);
        if self.is_fixed() {
            self.anchor = self.fixed_anchor(self.scroll_offset);
        }
        self.run_layout(now_ms)
    }

    /// Clones the current options, applies `f`, then delegates to [`Runway::set_options`].
    pub fn update_options(
        &mut self,
        f: impl FnOnce(&mut RunwayOptions),
        now_ms: u64,
    ) -> PassReport {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next, now_ms)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn attached_range(&self) -> AttachedRange {
        self.range
    }

    /// The last published scroll extent.
    pub fn extent(&self) -> u64 {
        self.extent.current()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Measured height of `index`, or `None` while unmeasured.
    pub fn height(&self, index: usize) -> Option<u32> {
        self.items
            .get(index)
            .filter(|it| it.is_measured())
            .map(|it| it.height)
    }

    /// Measured width of `index`, or `None` while unmeasured.
    pub fn width(&self, index: usize) -> Option<u32> {
        self.items
            .get(index)
            .filter(|it| it.is_measured())
            .map(|it| it.width)
    }

    /// Last position written for `index`, or `None` if it has not been placed since it was
    /// attached.
    pub fn top(&self, index: usize) -> Option<u64> {
        self.items.get(index).and_then(|it| it.top)
    }

    pub fn data(&self, index: usize) -> Option<&F::Item> {
        self.items.get(index).and_then(|it| it.data.as_ref())
    }

    pub fn item_id(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).map(|it| it.id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.locate(id)
    }

    /// The kind of node attached at `index`, if any.
    pub fn node_kind(&self, index: usize) -> Option<NodeKind> {
        self.items
            .get(index)
            .and_then(|it| it.node.as_ref())
            .map(|att| att.kind)
    }

    pub fn is_attached(&self, index: usize) -> bool {
        self.node_kind(index).is_some()
    }

    /// Number of attached nodes (tombstones included, fading tombstones excluded).
    pub fn attached_count(&self) -> usize {
        (self.span.first..self.span.last.min(self.items.len()))
            .filter(|&i| self.is_attached(i))
            .count()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn tombstone_pool_len(&self) -> usize {
        self.tombstones.len()
    }

    /// Number of tombstones still cross-fading into content.
    pub fn fading_count(&self) -> usize {
        self.fades.len()
    }

    /// Number of attached tombstones currently shown.
    pub fn visible_tombstones(&self) -> usize {
        (self.range.first..self.range.last)
            .filter_map(|i| self.items.get(i))
            .filter_map(|it| it.node.as_ref())
            .filter(|att| att.kind == NodeKind::Tombstone && att.visible == Some(true))
            .count()
    }

    /// The item covering `offset`, using estimates for unmeasured items.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }
        let index = match self.options.fixed_item_height {
            Some(h) => (offset / h.max(1) as u64) as usize * self.options.effective_columns(),
            None => self.items.items_before(offset),
        };
        Some(index.min(len - 1))
    }

    /// Absolute scroll offset `anchor` stands for, using estimates for unmeasured items.
    pub fn offset_of(&self, anchor: Anchor) -> u64 {
        if self.is_fixed() {
            let h = self.options.fallback_height() as u64;
            let columns = self.options.effective_columns();
            let len = self.items.len();
            // Past the tail means past the last row, which may be partial.
            let row = if anchor.index >= len {
                len.div_ceil(columns) as u64
            } else {
                (anchor.index / columns) as u64
            };
            return (row * h).saturating_add(anchor.offset);
        }
        self.tracker.offset_of(&self.items, anchor)
    }

    pub fn has_more(&self) -> bool {
        self.options.has_more
    }

    /// The load request currently in flight.
    pub fn pending_load(&self) -> Option<LoadRequest> {
        self.loads.in_flight()
    }

    pub fn is_loading(&self) -> bool {
        self.loads.in_flight().is_some()
    }

    /// `true` between a layout that attached unmeasured nodes and the matching
    /// [`Runway::commit`].
    pub fn is_awaiting_commit(&self) -> bool {
        self.awaiting_commit
    }

    pub fn snapshot(&self) -> RunwaySnapshot {
        RunwaySnapshot {
            anchor: self.anchor,
            scroll_offset: self.scroll_offset,
            viewport: self.viewport,
        }
    }

    /// Restores a snapshot taken against the same data set.
    pub fn restore(&mut self, snapshot: RunwaySnapshot, now_ms: u64) -> PassReport {
        self.viewport = snapshot.viewport;
        self.anchor = self.clamp_anchor(snapshot.anchor);
        self.scroll_offset = snapshot.scroll_offset;
        self.run_layout(now_ms)
    }

    /// Handles a scroll position change from the viewport.
    ///
    /// Back-to-back calls are fine; each runs its own layout pass, in call order.
    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) -> PassReport {
        rtrace!(offset, prev = self.scroll_offset, "on_scroll");
        if self.is_fixed() {
            self.anchor = self.fixed_anchor(offset);
        } else if offset == 0 {
            self.anchor = Anchor::TOP;
        } else {
            let delta = offset as i128 - self.scroll_offset as i128;
            let delta = delta.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
            self.anchor = self.tracker.advance(&self.items, self.anchor, delta);
        }
        self.scroll_offset = offset;
        self.run_layout(now_ms)
    }

    /// Handles a viewport size change. Every measurement is invalidated.
    ///
    /// If a commit is outstanding the re-measure is deferred by `measure_debounce_ms`; a later
    /// resize replaces the pending one.
    pub fn on_resize(&mut self, size: Size, now_ms: u64) -> PassReport {
        if self.viewport == size {
            return self.report();
        }
        rdebug!(width = size.width, height = size.height, "on_resize");
        self.viewport = size;
        self.request_remeasure(now_ms)
    }

    /// Re-runs layout at the current anchor.
    pub fn layout(&mut self, now_ms: u64) -> PassReport {
        self.run_layout(now_ms)
    }

    /// Forgets the measurement of one item whose node changed size in place (expanded,
    /// collapsed), then lays out. Its node is measured again on the next [`Runway::commit`].
    pub fn invalidate_item(&mut self, index: usize, now_ms: u64) -> PassReport {
        if index >= self.items.len() {
            rwarn!(index, count = self.items.len(), "invalidate out of bounds");
            return self.report();
        }
        rdebug!(index, "invalidate item");
        if !self.is_fixed() {
            self.items.set_height(index, Size::default());
            self.extent.allow_shrink();
        }
        self.run_layout(now_ms)
    }

    /// Called by the host once the previous layout has been committed, so the real size of
    /// newly attached nodes can be read.
    ///
    /// Measures them, re-lays out, and returns the scroll correction that keeps the anchor
    /// still. A no-op when no layout is waiting.
    pub fn commit(&mut self, now_ms: u64) -> PassReport {
        if !self.awaiting_commit {
            return self.report();
        }
        self.awaiting_commit = false;
        let measured = self.measure_attached();
        rdebug!(measured, "commit");
        let mut report = self.run_layout(now_ms);
        report.measured = measured;
        report
    }

    /// Runs deferred work that is due and advances cross-fades.
    pub fn tick(&mut self, now_ms: u64) -> PassReport {
        let mut report = self.report();
        if let Some(due) = self.deferred_remeasure {
            if now_ms >= due {
                self.deferred_remeasure = None;
                report = self.request_remeasure(now_ms);
            }
        }
        self.advance_fades(now_ms);
        report
    }

    /// Re-anchors to the top of `index`. The report always carries the resulting scroll offset.
    pub fn scroll_to_index(&mut self, index: usize, now_ms: u64) -> PassReport {
        self.scroll_to_anchor(Anchor::new(index, 0), now_ms)
    }

    /// Re-anchors to `anchor` (clamped to the last item). The report always carries the
    /// resulting scroll offset.
    pub fn scroll_to_anchor(&mut self, anchor: Anchor, now_ms: u64) -> PassReport {
        self.anchor = self.clamp_anchor(anchor);
        self.scroll_offset = self.offset_of(self.anchor);
        let mut report = self.run_layout(now_ms);
        report.scroll_correction = Some(self.scroll_offset);
        report
    }

    /// Folds an ordered diff from the data provider into the item table, then lays out.
    ///
    /// Inserting at the tail clears an in-flight load request. Removing the item a load
    /// request was raised against cancels that request.
    pub fn apply_changes(
        &mut self,
        changes: impl IntoIterator<Item = Change<F::Item>>,
        now_ms: u64,
    ) -> PassReport {
        let mut appended = false;
        for change in changes {
            match change {
                Change::Insert { index, item } => {
                    appended |= self.insert(index, Some(item));
                }
                Change::Placeholder { index } => {
                    appended |= self.insert(index, None);
                }
                Change::Remove { index } => self.remove(index),
                Change::Move { from, to } => self.move_item(from, to),
                Change::Update { index, item } => {
                    if index >= self.items.len() {
                        rwarn!(index, count = self.items.len(), "update out of bounds");
                        debug_assert!(index < self.items.len(), "update out of bounds");
                        continue;
                    }
                    self.items.update(index, item);
                }
            }
        }
        if appended {
            self.loads.clear();
        }
        self.run_layout(now_ms)
    }

    /// Appends items at the tail.
    pub fn append(&mut self, items: impl IntoIterator<Item = F::Item>, now_ms: u64) -> PassReport {
        let start = self.items.len();
        self.apply_changes(
            items
                .into_iter()
                .enumerate()
                .map(|(k, item)| Change::Insert {
                    index: start + k,
                    item,
                }),
            now_ms,
        )
    }

    /// Resolves the load request `ticket` by appending `items`.
    ///
    /// Returns `false`, without touching the table, if the request was cancelled or is no
    /// longer the one in flight.
    pub fn complete_load(
        &mut self,
        ticket: u64,
        items: impl IntoIterator<Item = F::Item>,
        now_ms: u64,
    ) -> bool {
        if !self.loads.settle(ticket) {
            rdebug!(ticket, "stale load completion ignored");
            return false;
        }
        self.append(items, now_ms);
        true
    }

    /// Forgets the in-flight load request so the next pass at the tail raises a new one.
    pub fn reset_load(&mut self) {
        self.loads.clear();
    }

    /// Tells the engine whether more data may exist past the tail.
    pub fn set_has_more(&mut self, has_more: bool, now_ms: u64) -> PassReport {
        self.options.has_more = has_more;
        if !has_more {
            self.loads.clear();
        }
        self.run_layout(now_ms)
    }

    /// Detaches and destroys every node the engine owns: attached, fading and pooled.
    pub fn destroy_all(&mut self) {
        for item in self.items.iter_mut() {
            item.top = None;
            if let Some(mut att) = item.node.take() {
                self.factory.detach(&mut att.node);
                self.factory.destroy(att.node);
            }
        }
        for mut fade in self.fades.drain(..) {
            self.factory.detach(&mut fade.tombstone);
            self.factory.destroy(fade.tombstone);
        }
        self.pool.clear(&mut self.factory);
        self.tombstones.clear(&mut self.factory);
        self.range = AttachedRange::EMPTY;
        self.span = AttachedRange::EMPTY;
        self.awaiting_commit = false;
        self.deferred_remeasure = None;
    }

    fn is_fixed(&self) -> bool {
        self.options.fixed_item_height.is_some()
    }

    fn clamp_anchor(&self, anchor: Anchor) -> Anchor {
        let len = self.items.len();
        if anchor.index >= len {
            return Anchor::new(len.saturating_sub(1), 0);
        }
        anchor
    }

    fn fixed_anchor(&self, offset: u64) -> Anchor {
        let h = self.options.fallback_height() as u64;
        let columns = self.options.effective_columns();
        let rows = self.items.len().div_ceil(columns) as u64;
        let row = (offset / h).min(rows);
        Anchor {
            index: (row as usize * columns).min(self.items.len()),
            offset: offset - row * h,
        }
    }

    fn compute_window(&self) -> AttachedRange {
        match self.options.fixed_item_height {
            Some(h) => compute_fixed_range(
                self.scroll_offset,
                self.viewport.height,
                self.items.len(),
                h,
                self.options.effective_columns(),
                self.options.overscan,
            ),
            None => compute_range(
                &self.tracker,
                &self.items,
                self.anchor,
                self.viewport.height,
                self.options.overscan,
            ),
        }
    }

    fn report(&self) -> PassReport {
        PassReport {
            range: self.range,
            attached: self.attached_count(),
            ..PassReport::default()
        }
    }

    fn request_remeasure(&mut self, now_ms: u64) -> PassReport {
        if self.awaiting_commit {
            let due = now_ms.saturating_add(self.options.measure_debounce_ms);
            rdebug!(due, "re-measure deferred");
            self.deferred_remeasure = Some(due);
            let mut report = self.report();
            report.deferred = true;
            return report;
        }
        self.deferred_remeasure = None;
        if !self.is_fixed() {
            self.items.invalidate();
            self.extent.allow_shrink();
        }
        self.run_layout(now_ms)
    }

    /// Recycle, fill, substitute tombstones, place, publish.
    fn run_layout(&mut self, now_ms: u64) -> PassReport {
        let range = if self.items.is_empty() {
            AttachedRange::EMPTY
        } else {
            self.compute_window()
        };
        rtrace!(first = range.first, last = range.last, count = self.items.len(), "layout");

        self.recycle_outside(range);
        if range.is_empty() {
            self.finish_all_fades();
        }
        self.fill(range, now_ms);
        self.cap_tombstones(range);
        self.pool.prune(&mut self.factory);
        self.tombstones.prune(&mut self.factory);

        self.range = range;
        self.span = range;
        let positions_written = self.place(range);

        self.awaiting_commit = !self.is_fixed()
            && (range.first..range.last)
                .filter_map(|i| self.items.get(i))
                .any(|it| {
                    !it.is_measured()
                        && matches!(&it.node, Some(att) if att.kind == NodeKind::Item)
                });

        self.publish_extent();
        self.check_load(range);
        let scroll_correction = self.sync_scroll_offset();

        PassReport {
            range,
            attached: self.attached_count(),
            positions_written,
            measured: 0,
            scroll_correction,
            deferred: false,
        }
    }

    fn recycle_outside(&mut self, range: AttachedRange) {
        let end = self.span.last.min(self.items.len());
        for i in self.span.first..end {
            if range.contains(i) {
                continue;
            }
            let Some(item) = self.items.get_mut(i) else {
                break;
            };
            let Some(att) = item.node.take() else {
                continue;
            };
            item.top = None;
            let id = item.id;
            match att.kind {
                NodeKind::Item => {
                    let mut node = att.node;
                    finish_fade_for(
                        &mut self.fades,
                        &mut self.factory,
                        &mut self.tombstones,
                        id,
                        Some(&mut node),
                    );
                    self.pool.release(&mut self.factory, node, Some(i));
                }
                NodeKind::Tombstone => {
                    self.tombstones.release(&mut self.factory, att.node, None);
                }
            }
        }
    }

    fn fill(&mut self, range: AttachedRange, now_ms: u64) -> usize {
        let count = self.items.len();
        let fade = self.options.fade_duration_ms > 0;
        let mut attached = 0usize;

        for i in range.first..range.last {
            let Some(item) = self.items.get_mut(i) else {
                break;
            };

            let resolved = item.data.is_some()
                && matches!(&item.node, Some(att) if att.kind == NodeKind::Tombstone);
            if resolved {
                if let Some(att) = item.node.take() {
                    if fade {
                        self.fades.push(CrossFade {
                            tombstone: att.node,
                            item: item.id,
                            started_ms: now_ms,
                            top: item.top,
                        });
                    } else {
                        self.tombstones.release(&mut self.factory, att.node, None);
                    }
                }
                item.top = None;
            }

            if let Some(att) = item.node.as_mut() {
                match &item.data {
                    Some(data) if att.bound != i || item.stale => {
                        self.factory.rebind(&mut att.node, data, i, count);
                        att.bound = i;
                        item.stale = false;
                    }
                    Some(_) => {}
                    None => att.bound = i,
                }
                continue;
            }

            let (mut node, kind, visible) = match &item.data {
                Some(data) => {
                    let node = match self.pool.acquire_for(i) {
                        Some(mut node) => {
                            self.factory.rebind(&mut node, data, i, count);
                            node
                        }
                        None => self.factory.create(data, i, count),
                    };
                    (node, NodeKind::Item, Some(true))
                }
                // Pooled tombstones may have been hidden by the cap.
                None => match self.tombstones.acquire() {
                    Some(node) => (node, NodeKind::Tombstone, None),
                    None => (self.factory.create_tombstone(), NodeKind::Tombstone, Some(true)),
                },
            };
            self.factory.attach(&mut node, i);
            item.node = Some(Attached {
                node,
                kind,
                bound: i,
                visible,
            });
            item.stale = false;
            item.top = None;
            attached += 1;
        }

        if attached > 0 {
            rtrace!(attached, "fill");
        }
        attached
    }

    /// Shows the first `max_tombstones` attached tombstones and hides the rest.
    fn cap_tombstones(&mut self, range: AttachedRange) {
        let max = self.options.max_tombstones;
        let mut shown = 0usize;
        for i in range.first..range.last {
            let Some(item) = self.items.get_mut(i) else {
                break;
            };
            let Some(att) = item.node.as_mut() else {
                continue;
            };
            if att.kind != NodeKind::Tombstone {
                continue;
            }
            let show = shown < max;
            if show {
                shown += 1;
            }
            if att.visible != Some(show) {
                self.factory.set_visible(&mut att.node, show);
                att.visible = Some(show);
            }
        }
    }

    /// Writes positions for `range`, starting from the anchor. Returns the number of writes.
    fn place(&mut self, range: AttachedRange) -> usize {
        if range.is_empty() {
            return 0;
        }
        let mut writes = 0usize;

        if let Some(h) = self.options.fixed_item_height {
            let h = h.max(1) as u64;
            let columns = self.options.effective_columns();
            for i in range.first..range.last {
                let top = (i / columns) as u64 * h;
                writes += self.write_top(i, top);
            }
            return writes;
        }

        let fallback = self.items.fallback();
        let mut i = self.anchor.index.min(self.items.len());
        let mut top = self.items.start_of(i, fallback);
        while i > range.first {
            i -= 1;
            top = top.saturating_sub(self.items.effective_height(i) as u64);
        }
        while i < range.first {
            top = top.saturating_add(self.items.effective_height(i) as u64);
            i += 1;
        }
        for i in range.first..range.last {
            writes += self.write_top(i, top);
            top = top.saturating_add(self.items.effective_height(i) as u64);
        }
        writes
    }

    fn write_top(&mut self, index: usize, top: u64) -> usize {
        let Some(item) = self.items.get_mut(index) else {
            return 0;
        };
        let mut writes = 0usize;
        if item.top != Some(top) {
            if let Some(att) = item.node.as_mut() {
                self.factory.set_position(&mut att.node, top);
                writes += 1;
            }
            item.top = Some(top);
        }
        let id = item.id;
        if let Some(fade) = self.fades.iter_mut().find(|f| f.item == id) {
            if fade.top != Some(top) {
                self.factory.set_position(&mut fade.tombstone, top);
                fade.top = Some(top);
                writes += 1;
            }
        }
        writes
    }

    fn measure_attached(&mut self) -> usize {
        if self.is_fixed() {
            return 0;
        }
        let mut measured = 0usize;
        for i in self.range.first..self.range.last {
            let size = match self.items.get(i) {
                Some(Item {
                    height: 0,
                    node: Some(att),
                    ..
                }) if att.kind == NodeKind::Item => self.factory.measure(&att.node),
                _ => continue,
            };
            // 0 is reserved for "unmeasured".
            let size = Size::new(size.width, size.height.max(1));
            self.items.set_height(i, size);
            measured += 1;
        }
        measured
    }

    fn publish_extent(&mut self) {
        let content = match self.options.fixed_item_height {
            Some(h) => {
                let rows = self.items.len().div_ceil(self.options.effective_columns()) as u64;
                rows * h.max(1) as u64
            }
            None => self.items.total(),
        };
        let slack = if self.options.has_more {
            self.viewport.height as u64
        } else {
            0
        };
        if let Some(extent) = self.extent.update(content, slack) {
            rdebug!(extent, content, slack, "extent changed");
            if let Some(cb) = &self.options.on_extent_change {
                cb(extent);
            }
        }
    }

    fn check_load(&mut self, range: AttachedRange) {
        let count = self.items.len();
        let horizon = count.checked_sub(1).and_then(|i| self.item_id(i));
        if let Some(request) = self
            .loads
            .check(range, count, horizon, self.options.has_more)
        {
            if let Some(cb) = &self.options.on_load_more {
                cb(request);
            }
        }
    }

    fn sync_scroll_offset(&mut self) -> Option<u64> {
        let offset = self.offset_of(self.anchor);
        if offset == self.scroll_offset {
            return None;
        }
        rtrace!(from = self.scroll_offset, to = offset, "scroll correction");
        self.scroll_offset = offset;
        Some(offset)
    }

    fn advance_fades(&mut self, now_ms: u64) {
        if self.fades.is_empty() {
            return;
        }
        let duration = self.options.fade_duration_ms;
        let tombstone_height = self.items.fallback();

        let mut k = 0usize;
        while k < self.fades.len() {
            let id = self.fades[k].item;
            let index = self.locate(id);
            let t = self.fades[k].progress(now_ms, duration);
            let live = index
                .and_then(|i| self.items.get(i))
                .is_some_and(|it| matches!(&it.node, Some(att) if att.kind == NodeKind::Item));

            if !live || t >= 1.0 {
                let mut fade = self.fades.swap_remove(k);
                if let Some(att) = index
                    .and_then(|i| self.items.get_mut(i))
                    .and_then(|it| it.node.as_mut())
                    .filter(|att| att.kind == NodeKind::Item)
                {
                    self.factory.set_fade(&mut att.node, FadeFrame::IDENTITY);
                }
                self.factory.set_fade(&mut fade.tombstone, FadeFrame::IDENTITY);
                self.tombstones.release(&mut self.factory, fade.tombstone, None);
                continue;
            }

            let Some(item) = index.and_then(|i| self.items.get_mut(i)) else {
                k += 1;
                continue;
            };
            let (tomb_frame, item_frame) =
                crossfade_frames(Easing::SmoothStep.sample(t), tombstone_height, item.height);
            self.factory
                .set_fade(&mut self.fades[k].tombstone, tomb_frame);
            if let Some(att) = item.node.as_mut() {
                self.factory.set_fade(&mut att.node, item_frame);
            }
            k += 1;
        }
        self.tombstones.prune(&mut self.factory);
    }

    fn finish_all_fades(&mut self) {
        for mut fade in self.fades.drain(..) {
            self.factory.set_fade(&mut fade.tombstone, FadeFrame::IDENTITY);
            self.tombstones
                .release(&mut self.factory, fade.tombstone, None);
        }
    }

    fn locate(&self, id: ItemId) -> Option<usize> {
        let end = self.span.last.min(self.items.len());
        (self.span.first..end)
            .find(|&i| self.items.get(i).is_some_and(|it| it.id == id))
            .or_else(|| self.items.index_of(id))
    }

    /// Returns `true` when the insert landed at the tail.
    fn insert(&mut self, index: usize, data: Option<F::Item>) -> bool {
        let len = self.items.len();
        if index > len {
            rwarn!(index, count = len, "insert past the tail, appending");
        }
        let index = index.min(len);
        self.items.insert(index, data);

        if index < self.anchor.index || (index == self.anchor.index && self.anchor.offset > 0) {
            self.anchor.index += 1;
        }
        if index < self.span.first {
            self.span.first += 1;
            self.span.last += 1;
        } else if index < self.span.last {
            self.span.last += 1;
        }
        index == len
    }

    fn remove(&mut self, index: usize) {
        let count = self.items.len();
        debug_assert!(index < count, "remove out of bounds (i={index}, count={count})");
        let Some(item) = self.items.remove(index) else {
            rwarn!(index, count, "remove out of bounds");
            return;
        };
        self.loads.cancel_for(item.id);
        self.discard(item);
        self.extent.allow_shrink();

        if index < self.anchor.index {
            self.anchor.index -= 1;
        } else if index == self.anchor.index {
            self.anchor.offset = 0;
        }
        self.anchor.index = self.anchor.index.min(self.items.len());

        if index < self.span.first {
            self.span.first -= 1;
            self.span.last -= 1;
        } else if index < self.span.last {
            self.span.last -= 1;
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        let count = self.items.len();
        debug_assert!(
            from < count && to < count,
            "move out of bounds (from={from}, to={to}, count={count})"
        );
        if !self.items.move_item(from, to) {
            rwarn!(from, to, count, "move out of bounds");
            return;
        }
        if from == to {
            return;
        }

        // A move is a remove followed by an insert, for anchor and span bookkeeping alike.
        if from < self.anchor.index {
            self.anchor.index -= 1;
        }
        if to < self.anchor.index || (to == self.anchor.index && self.anchor.offset > 0) {
            self.anchor.index += 1;
        }
        let mut span = self.span;
        if from < span.first {
            span.first -= 1;
            span.last -= 1;
        } else if from < span.last {
            span.last -= 1;
        }
        if to < span.first {
            span.first += 1;
            span.last += 1;
        } else if to <= span.last {
            span.last += 1;
        }
        self.span = span;

        if !self.span.contains(to) {
            self.release_node(to);
        }
    }

    fn release_node(&mut self, index: usize) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        let Some(att) = item.node.take() else {
            return;
        };
        item.top = None;
        let id = item.id;
        match att.kind {
            NodeKind::Item => {
                let mut node = att.node;
                finish_fade_for(
                    &mut self.fades,
                    &mut self.factory,
                    &mut self.tombstones,
                    id,
                    Some(&mut node),
                );
                self.pool.release(&mut self.factory, node, None);
            }
            NodeKind::Tombstone => self.tombstones.release(&mut self.factory, att.node, None),
        }
    }

    fn discard(&mut self, item: Item<F::Item, F::Node>) {
        let Some(att) = item.node else {
            return;
        };
        match att.kind {
            NodeKind::Item => {
                let mut node = att.node;
                finish_fade_for(
                    &mut self.fades,
                    &mut self.factory,
                    &mut self.tombstones,
                    item.id,
                    Some(&mut node),
                );
                self.pool.release(&mut self.factory, node, None);
            }
            NodeKind::Tombstone => self.tombstones.release(&mut self.factory, att.node, None),
        }
    }
}

/// Ends the cross-fade for `id`, if any: resets the content node and pools the tombstone.
fn finish_fade_for<F: ViewFactory>(
    fades: &mut Vec<CrossFade<F::Node>>,
    factory: &mut F,
    tombstones: &mut Pool<F::Node>,
    id: ItemId,
    node: Option<&mut F::Node>,
) {
    let Some(pos) = fades.iter().position(|f| f.item == id) else {
        return;
    };
    let mut fade = fades.swap_remove(pos);
    if let Some(node) = node {
        factory.set_fade(node, FadeFrame::IDENTITY);
    }
    factory.set_fade(&mut fade.tombstone, FadeFrame::IDENTITY);
    tombstones.release(factory, fade.tombstone, None);
}

impl<F: ViewFactory> core::fmt::Debug for Runway<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runway")
            .field("options", &self.options)
            .field("count", &self.items.len())
            .field("anchor", &self.anchor)
            .field("scroll_offset", &self.scroll_offset)
            .field("viewport", &self.viewport)
            .field("range", &self.range)
            .field("pool", &self.pool.len())
            .field("tombstone_pool", &self.tombstones.len())
            .field("fading", &self.fades.len())
            .field("awaiting_commit", &self.awaiting_commit)
            .finish_non_exhaustive()
    }
}
