use runway::{Anchor, Change, Easing, PassReport, Runway, RunwayOptions, Size, ViewFactory};

use crate::{ScrollAnchor, Tween, apply_anchor, capture_anchor};

/// How long after the last scroll event the controller reports [`ScrollPhase::Idle`].
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 200;

/// Whether the viewport is being scrolled right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollPhase {
    #[default]
    Idle,
    Scrolling,
}

#[derive(Clone, Copy, Debug)]
struct Animation {
    tween: Tween,
    /// Follow this item while its offset is still an estimate.
    index: Option<usize>,
}

/// A framework-neutral viewport observer around a [`Runway`].
///
/// The list may start below other content inside a larger scroll container. The controller
/// takes *raw* offsets of that container and translates them by the scroll margin, so the
/// engine only ever sees offsets relative to the list's own top. Offsets handed back (scroll
/// corrections, tween samples) are raw again.
///
/// Adapters drive it by calling:
/// - `on_viewport` / `on_scroll` when UI events occur
/// - `commit` after the UI has rendered the last layout
/// - `tick(now_ms)` each frame/timer tick (tweens, idle detection, deferred work, cross-fades)
pub struct Controller<F: ViewFactory> {
    rw: Runway<F>,
    scroll_margin: u64,
    idle_timeout_ms: u64,
    phase: ScrollPhase,
    last_scroll_ms: u64,
    animation: Option<Animation>,
}

impl<F: ViewFactory> Controller<F> {
    pub fn new(options: RunwayOptions, factory: F) -> Self {
        Self::from_runway(Runway::new(options, factory))
    }

    pub fn from_runway(rw: Runway<F>) -> Self {
        Self {
            rw,
            scroll_margin: 0,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            phase: ScrollPhase::Idle,
            last_scroll_ms: 0,
            animation: None,
        }
    }

    /// Distance from the scroll container's top to the list's top.
    pub fn with_scroll_margin(mut self, margin: u64) -> Self {
        self.scroll_margin = margin;
        self
    }

    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    pub fn runway(&self) -> &Runway<F> {
        &self.rw
    }

    pub fn runway_mut(&mut self) -> &mut Runway<F> {
        &mut self.rw
    }

    pub fn into_runway(self) -> Runway<F> {
        self.rw
    }

    pub fn scroll_margin(&self) -> u64 {
        self.scroll_margin
    }

    /// Moves the list inside its container. The container's scroll position is kept.
    pub fn set_scroll_margin(&mut self, margin: u64, now_ms: u64) -> PassReport {
        let raw = self.raw_offset();
        self.scroll_margin = margin;
        let report = self.rw.on_scroll(raw.saturating_sub(margin), now_ms);
        self.to_raw(report)
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn is_scrolling(&self) -> bool {
        self.phase == ScrollPhase::Scrolling
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn cancel_animation(&mut self) {
        self.animation = None;
    }

    /// The container offset matching the engine's position.
    pub fn raw_offset(&self) -> u64 {
        self.rw.scroll_offset().saturating_add(self.scroll_margin)
    }

    /// The largest container offset that still fills the viewport.
    pub fn max_raw_offset(&self) -> u64 {
        self.scroll_margin
            .saturating_add(self.rw.extent())
            .saturating_sub(self.rw.viewport().height as u64)
    }

    pub fn on_viewport(&mut self, size: Size, now_ms: u64) -> PassReport {
        let report = self.rw.on_resize(size, now_ms);
        self.to_raw(report)
    }

    /// Call this when the UI reports a scroll offset change (e.g. user wheel/drag).
    ///
    /// This cancels any active tween.
    pub fn on_scroll(&mut self, raw_offset: u64, now_ms: u64) -> PassReport {
        self.cancel_animation();
        self.mark_scrolling(now_ms);
        let report = self
            .rw
            .on_scroll(raw_offset.saturating_sub(self.scroll_margin), now_ms);
        self.to_raw(report)
    }

    pub fn commit(&mut self, now_ms: u64) -> PassReport {
        let report = self.rw.commit(now_ms);
        self.to_raw(report)
    }

    pub fn apply_changes(
        &mut self,
        changes: impl IntoIterator<Item = Change<F::Item>>,
        now_ms: u64,
    ) -> PassReport {
        let report = self.rw.apply_changes(changes, now_ms);
        self.to_raw(report)
    }

    /// Advances tweens, idle detection, and the engine's deferred work.
    ///
    /// Returns the raw offset the container should scroll to, if it moved.
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        let mut apply = None;

        if let Some(mut anim) = self.animation {
            if let Some(index) = anim.index {
                let to = self.index_target(index);
                if to != anim.tween.to {
                    atrace!(index, from = anim.tween.to, to, "tween retarget");
                    let remaining = anim.tween.remaining_ms(now_ms);
                    anim.tween.retarget(now_ms, to, remaining);
                }
            }

            let raw = anim.tween.sample(now_ms);
            let report = self
                .rw
                .on_scroll(raw.saturating_sub(self.scroll_margin), now_ms);
            apply = Some(self.to_raw(report).scroll_correction.unwrap_or(raw));

            if anim.tween.is_done(now_ms) {
                adebug!(to = anim.tween.to, "tween done");
                self.animation = None;
                self.phase = ScrollPhase::Idle;
            } else {
                self.animation = Some(anim);
                self.mark_scrolling(now_ms);
            }
        } else if self.phase == ScrollPhase::Scrolling
            && now_ms.saturating_sub(self.last_scroll_ms) >= self.idle_timeout_ms
        {
            atrace!(now_ms, "scroll idle");
            self.phase = ScrollPhase::Idle;
        }

        let report = self.rw.tick(now_ms);
        if let Some(off) = self.to_raw(report).scroll_correction {
            apply = Some(off);
        }
        apply
    }

    /// Jumps to the top of `index` (no animation). Returns the raw offset to apply.
    pub fn scroll_to_index(&mut self, index: usize, now_ms: u64) -> u64 {
        self.cancel_animation();
        self.rw.scroll_to_index(index, now_ms);
        self.raw_offset()
    }

    /// Jumps to a raw offset, clamped to the scrollable range (no animation).
    ///
    /// Returns the applied offset.
    pub fn scroll_to_offset(&mut self, raw_offset: u64, now_ms: u64) -> u64 {
        self.cancel_animation();
        let raw = raw_offset.min(self.max_raw_offset());
        self.rw
            .on_scroll(raw.saturating_sub(self.scroll_margin), now_ms);
        self.raw_offset()
    }

    /// Starts a tween to the top of `index`.
    ///
    /// The target is re-evaluated every tick, so the tween follows measurements that move the
    /// item while it runs. Returns the initial (clamped) target offset.
    pub fn start_tween_to_index(
        &mut self,
        index: usize,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let to = self.index_target(index);
        self.start(to, Some(index), now_ms, duration_ms, easing)
    }

    /// Starts a tween to a raw offset. Returns the clamped target offset.
    pub fn start_tween_to_offset(
        &mut self,
        raw_offset: u64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let to = raw_offset.min(self.max_raw_offset());
        self.start(to, None, now_ms, duration_ms, easing)
    }

    pub fn capture_anchor(&self) -> Option<ScrollAnchor> {
        capture_anchor(&self.rw)
    }

    /// Re-anchors on a captured item. Returns the raw offset to apply, or `None` if the item
    /// is gone.
    ///
    /// This cancels any active tween.
    pub fn apply_anchor(&mut self, anchor: &ScrollAnchor, now_ms: u64) -> Option<u64> {
        self.cancel_animation();
        apply_anchor(&mut self.rw, anchor, now_ms)?;
        Some(self.raw_offset())
    }

    fn start(
        &mut self,
        to: u64,
        index: Option<usize>,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> u64 {
        let from = self.raw_offset();
        adebug!(from, to, duration_ms, "tween start");
        self.animation = Some(Animation {
            tween: Tween::new(from, to, now_ms, duration_ms, easing),
            index,
        });
        self.mark_scrolling(now_ms);
        to
    }

    fn index_target(&self, index: usize) -> u64 {
        let last = self.rw.item_count().saturating_sub(1);
        let offset = self.rw.offset_of(Anchor::new(index.min(last), 0));
        offset
            .saturating_add(self.scroll_margin)
            .min(self.max_raw_offset())
    }

    fn mark_scrolling(&mut self, now_ms: u64) {
        self.phase = ScrollPhase::Scrolling;
        self.last_scroll_ms = now_ms;
    }

    fn to_raw(&self, mut report: PassReport) -> PassReport {
        report.scroll_correction = report
            .scroll_correction
            .map(|off| off.saturating_add(self.scroll_margin));
        report
    }
}

impl<F: ViewFactory> core::fmt::Debug for Controller<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("runway", &self.rw)
            .field("scroll_margin", &self.scroll_margin)
            .field("idle_timeout_ms", &self.idle_timeout_ms)
            .field("phase", &self.phase)
            .field("animation", &self.animation)
            .finish()
    }
}
