use alloc::sync::Arc;

use masonry::GridOptions;

/// Called with the number of feed items placed so far when the grid has caught up with the feed.
pub type LoadMoreCallback = Arc<dyn Fn(usize) + Send + Sync>;

pub const DEFAULT_ITEMS_PER_FRAME: usize = 1;
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 100;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 300;

/// Configuration for [`crate::Controller`].
///
/// Cheap to clone: the callback lives in an `Arc`.
pub struct ControllerOptions {
    pub grid: GridOptions,
    /// Cap on feed items placed per frame tick.
    pub items_per_frame: usize,
    /// Minimum spacing between viewport window recomputations.
    pub scroll_throttle_ms: u64,
    /// Quiet period after the last resize before reflowing.
    pub resize_debounce_ms: u64,
    pub load_more: Option<LoadMoreCallback>,
}

impl Clone for ControllerOptions {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid,
            items_per_frame: self.items_per_frame,
            scroll_throttle_ms: self.scroll_throttle_ms,
            resize_debounce_ms: self.resize_debounce_ms,
            load_more: self.load_more.clone(),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::new(GridOptions::default())
    }
}

impl ControllerOptions {
    pub fn new(grid: GridOptions) -> Self {
        Self {
            grid,
            items_per_frame: DEFAULT_ITEMS_PER_FRAME,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            load_more: None,
        }
    }

    pub fn with_grid(mut self, grid: GridOptions) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_items_per_frame(mut self, items_per_frame: usize) -> Self {
        self.items_per_frame = items_per_frame;
        self
    }

    pub fn with_scroll_throttle_ms(mut self, throttle_ms: u64) -> Self {
        self.scroll_throttle_ms = throttle_ms;
        self
    }

    pub fn with_resize_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.resize_debounce_ms = debounce_ms;
        self
    }

    pub fn with_load_more(
        mut self,
        load_more: Option<impl Fn(usize) + Send + Sync + 'static>,
    ) -> Self {
        self.load_more = load_more.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for ControllerOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("grid", &self.grid)
            .field("items_per_frame", &self.items_per_frame)
            .field("scroll_throttle_ms", &self.scroll_throttle_ms)
            .field("resize_debounce_ms", &self.resize_debounce_ms)
            .field("load_more", &self.load_more.is_some())
            .finish()
    }
}
