use alloc::sync::Arc;

use crate::LoadRequest;

/// A callback fired with the new total scroll extent, in pixels.
pub type OnExtentChange = Arc<dyn Fn(u64) + Send + Sync>;

/// A callback fired when the attached window reaches the end of the known data.
///
/// Fires at most once per unresolved data horizon.
pub type OnLoadMore = Arc<dyn Fn(LoadRequest) + Send + Sync>;

/// Configuration for [`crate::Runway`].
///
/// Cheap to clone: callbacks are stored in `Arc`s.
#[derive(Clone)]
pub struct RunwayOptions {
    /// Maximum number of detached item nodes kept for reuse.
    pub pool_capacity: usize,
    /// Maximum number of detached tombstone nodes kept for reuse.
    pub tombstone_pool_capacity: usize,
    /// Extra items attached on each side of the viewport (rows in fixed-height mode).
    pub overscan: usize,
    /// Assumed height of every item that has not been measured yet.
    pub tombstone_height: u32,
    /// Maximum number of tombstones shown at once. Extra ones are attached but hidden.
    pub max_tombstones: usize,
    /// Duration of the tombstone → content cross-fade. `0` swaps immediately.
    pub fade_duration_ms: u64,
    /// Opt-out of measurement: every item is exactly this tall.
    pub fixed_item_height: Option<u32>,
    /// Items per row. Only honoured together with `fixed_item_height`.
    pub columns: usize,
    /// Delay of the single deferred retry for a re-measure requested while a commit is
    /// outstanding.
    pub measure_debounce_ms: u64,
    /// Whether the data provider may have more items past the current tail.
    ///
    /// While `true`, the extent carries one viewport of slack and reaching the tail raises a
    /// load request.
    pub has_more: bool,
    pub on_extent_change: Option<OnExtentChange>,
    pub on_load_more: Option<OnLoadMore>,
}

impl Default for RunwayOptions {
    fn default() -> Self {
        Self {
            pool_capacity: 10,
            tombstone_pool_capacity: 16,
            overscan: 2,
            tombstone_height: 80,
            max_tombstones: 16,
            fade_duration_ms: 200,
            fixed_item_height: None,
            columns: 1,
            measure_debounce_ms: 60,
            has_more: true,
            on_extent_change: None,
            on_load_more: None,
        }
    }
}

impl RunwayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a fixed-height list: nothing is measured, positions are `index * height`.
    pub fn fixed(item_height: u32) -> Self {
        Self::default().with_fixed_item_height(Some(item_height))
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn with_tombstone_pool_capacity(mut self, capacity: usize) -> Self {
        self.tombstone_pool_capacity = capacity;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_tombstone_height(mut self, height: u32) -> Self {
        self.tombstone_height = height;
        self
    }

    pub fn with_max_tombstones(mut self, max: usize) -> Self {
        self.max_tombstones = max;
        self
    }

    pub fn with_fade_duration_ms(mut self, duration_ms: u64) -> Self {
        self.fade_duration_ms = duration_ms;
        self
    }

    pub fn with_fixed_item_height(mut self, height: Option<u32>) -> Self {
        self.fixed_item_height = height;
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_measure_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.measure_debounce_ms = delay_ms;
        self
    }

    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    pub fn with_on_extent_change(
        mut self,
        on_extent_change: Option<impl Fn(u64) + Send + Sync + 'static>,
    ) -> Self {
        self.on_extent_change = on_extent_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_load_more(
        mut self,
        on_load_more: Option<impl Fn(LoadRequest) + Send + Sync + 'static>,
    ) -> Self {
        self.on_load_more = on_load_more.map(|f| Arc::new(f) as _);
        self
    }

    /// Height every item is assumed to have before measurement.
    pub(crate) fn fallback_height(&self) -> u32 {
        self.fixed_item_height
            .unwrap_or(self.tombstone_height)
            .max(1)
    }

    pub(crate) fn effective_columns(&self) -> usize {
        if self.fixed_item_height.is_some() {
            self.columns.max(1)
        } else {
            1
        }
    }
}

impl core::fmt::Debug for RunwayOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunwayOptions")
            .field("pool_capacity", &self.pool_capacity)
            .field("tombstone_pool_capacity", &self.tombstone_pool_capacity)
            .field("overscan", &self.overscan)
            .field("tombstone_height", &self.tombstone_height)
            .field("max_tombstones", &self.max_tombstones)
            .field("fade_duration_ms", &self.fade_duration_ms)
            .field("fixed_item_height", &self.fixed_item_height)
            .field("columns", &self.columns)
            .field("measure_debounce_ms", &self.measure_debounce_ms)
            .field("has_more", &self.has_more)
            .finish_non_exhaustive()
    }
}
