use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use masonry::{
    ColumnLayout, ColumnPacker, Container, GridMetrics, ItemId, MasonryError, Measurer,
    NearestNeighbors, ViewportWindow,
};

use crate::render::{RelatedHook, RelatedRequest, RenderedItem, Renderer};
use crate::{ControllerOptions, Scheduler, TaskKind};

/// What the controller is doing between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Idle,
    /// Draining the feed one capped batch per tick.
    Inserting,
    /// Recomputing columns after a resize. Only observable while a reflow is being retried.
    Reflowing,
}

/// Summary of the work done by one [`Controller::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    /// Feed items placed this tick.
    pub placed: usize,
    /// Related items inserted this tick.
    pub related: usize,
    pub reflowed: bool,
    pub rebuilt: bool,
    pub window_updated: bool,
}

/// A framework-neutral feed/reflow driver around a [`ColumnPacker`].
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `attach` once the container can be measured
/// - `set_items` whenever the feed changes
/// - `on_scroll` / `on_resize` when UI events occur
/// - `tick(now_ms)` every animation frame
///
/// All deferred work (feed batches, debounced reflow, throttled window updates, related-item
/// insertion) is held as task tokens in an owned [`Scheduler`]; `teardown` cancels them all.
pub struct Controller<T, M> {
    options: ControllerOptions,
    measurer: M,
    packer: ColumnPacker<T>,
    resolver: NearestNeighbors,

    feed: Vec<Arc<T>>,
    placed: usize,
    phase: Phase,
    fetching: bool,

    container: Option<Container>,
    pending_container: Option<Container>,
    scroll_offset: u64,
    last_window_ms: Option<u64>,
    window: ViewportWindow,

    related: VecDeque<RelatedRequest<T>>,
    scheduler: Scheduler,
}

impl<T, M: Measurer<T>> Controller<T, M> {
    /// Creates an unattached controller. Nothing is measured until the first tick.
    pub fn new(options: ControllerOptions, measurer: M) -> Self {
        let resolver = NearestNeighbors::new(options.grid.insert_tolerance);
        Self {
            options,
            measurer,
            packer: ColumnPacker::default(),
            resolver,
            feed: Vec::new(),
            placed: 0,
            phase: Phase::Idle,
            fetching: false,
            container: None,
            pending_container: None,
            scroll_offset: 0,
            last_window_ms: None,
            window: ViewportWindow::default(),
            related: VecDeque::new(),
            scheduler: Scheduler::new(),
        }
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn packer(&self) -> &ColumnPacker<T> {
        &self.packer
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `true` between a load-more request and the next feed growth.
    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// Number of feed items placed so far.
    pub fn placed_count(&self) -> usize {
        self.placed
    }

    pub fn feed_len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_attached(&self) -> bool {
        self.container.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.scheduler.is_shut_down()
    }

    pub fn container(&self) -> Option<Container> {
        self.container
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn window(&self) -> ViewportWindow {
        self.window
    }

    pub fn metrics(&self) -> GridMetrics {
        self.packer.metrics()
    }

    /// The grid's rendered height.
    pub fn height(&self) -> u64 {
        self.packer.height()
    }

    pub fn min_height(&self) -> u64 {
        self.packer.min_height()
    }

    pub fn is_visible(&self, id: ItemId) -> bool {
        self.packer
            .item(id)
            .is_some_and(|item| self.window.is_visible(item))
    }

    /// Attaches (or re-attaches) the grid to a measurable container, laying out immediately.
    ///
    /// Fails with [`MasonryError::ColumnCountIndeterminate`] when the width is unusable; no
    /// state changes in that case.
    pub fn attach(&mut self, container: Container, now_ms: u64) -> Result<(), MasonryError> {
        if self.is_torn_down() {
            return Ok(());
        }
        let layout = ColumnLayout::resolve(&self.options.grid, container.width)?;
        self.scheduler.cancel_kind(TaskKind::Reflow);
        self.pending_container = None;

        if let Err(err) = self.packer.relayout(layout, &mut self.measurer) {
            mwarn!(%err, "attach: layout deferred to next tick");
            self.pending_container = Some(container);
            self.phase = Phase::Reflowing;
            self.scheduler
                .schedule(TaskKind::Reflow, now_ms.saturating_add(1));
            return Ok(());
        }
        mdebug!(
            width = container.width,
            height = container.height,
            columns = layout.column_count,
            "attach"
        );
        self.container = Some(container);
        self.update_window();
        if self.phase == Phase::Reflowing {
            self.phase = Phase::Idle;
        }
        self.settle(now_ms);
        Ok(())
    }

    /// Replaces the externally supplied feed.
    ///
    /// Growth schedules frame-paced insertion of the new tail. A shrink, or any element whose
    /// identity changed within the old length, schedules a full rebuild.
    pub fn set_items(&mut self, items: Vec<Arc<T>>, now_ms: u64) {
        if self.is_torn_down() {
            return;
        }
        let same_prefix = items.len() >= self.feed.len()
            && self
                .feed
                .iter()
                .zip(&items)
                .all(|(old, new)| Arc::ptr_eq(old, new));
        let len_changed = items.len() != self.feed.len();
        mtrace!(
            old = self.feed.len(),
            new = items.len(),
            same_prefix,
            "set_items"
        );
        self.feed = items;
        // Any new feed answers an outstanding load-more request.
        if len_changed || !same_prefix {
            self.fetching = false;
        }

        if !same_prefix {
            mdebug!(len = self.feed.len(), "feed identity changed, rebuilding");
            self.scheduler.cancel_kind(TaskKind::InsertBatch);
            self.scheduler.reschedule(TaskKind::Rebuild, now_ms);
            self.phase = Phase::Inserting;
            return;
        }
        self.settle(now_ms);
    }

    /// Records a scroll position. The window follows at most once per throttle interval, always
    /// with the latest offset.
    pub fn on_scroll(&mut self, scroll_offset: u64, now_ms: u64) {
        if self.is_torn_down() {
            return;
        }
        self.scroll_offset = scroll_offset;
        if self.scheduler.is_pending(TaskKind::UpdateWindow) {
            return;
        }
        let throttle = self.options.scroll_throttle_ms;
        let due = self
            .last_window_ms
            .map_or(now_ms, |last| now_ms.max(last.saturating_add(throttle)));
        self.scheduler.schedule(TaskKind::UpdateWindow, due);
    }

    /// Records new container geometry. The reflow runs once resizing has been quiet for the
    /// debounce interval.
    pub fn on_resize(&mut self, container: Container, now_ms: u64) {
        if self.is_torn_down() {
            return;
        }
        self.pending_container = Some(container);
        let due = now_ms.saturating_add(self.options.resize_debounce_ms);
        self.scheduler.reschedule(TaskKind::Reflow, due);
    }

    /// Queues related items to be inserted around `source` on the next tick.
    pub fn request_related(&mut self, source: ItemId, items: Vec<Arc<T>>) {
        if self.is_torn_down() || items.is_empty() {
            return;
        }
        self.related.push_back(RelatedRequest { source, items });
        self.scheduler.schedule_once(TaskKind::InsertRelated, 0);
    }

    /// Runs every task due at `now_ms`.
    ///
    /// Non-fatal errors are logged and retried (measurement) or dropped (stale insertion
    /// targets). Only [`MasonryError::ColumnCountIndeterminate`] is returned, after the remaining
    /// due tasks have run.
    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport, MasonryError> {
        let mut report = TickReport::default();
        let mut fatal = None;
        for kind in self.scheduler.take_due(now_ms) {
            let result = match kind {
                TaskKind::InsertBatch => self.run_insert_batch(now_ms, &mut report),
                TaskKind::InsertRelated => self.run_related(now_ms, &mut report),
                TaskKind::Reflow => self.run_reflow(now_ms, &mut report),
                TaskKind::Rebuild => self.run_rebuild(now_ms, &mut report),
                TaskKind::UpdateWindow => {
                    self.last_window_ms = Some(now_ms);
                    report.window_updated = self.update_window();
                    Ok(())
                }
            };
            if let Err(err) = result {
                fatal = fatal.or(Some(err));
            }
        }
        match fatal {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Cancels every outstanding task. The controller ignores all input afterwards.
    pub fn teardown(&mut self) {
        self.scheduler.shutdown();
        self.related.clear();
        self.pending_container = None;
        self.phase = Phase::Idle;
        self.fetching = false;
        mdebug!(placed = self.placed, "teardown");
    }

    /// Renders every placed item in feed order.
    ///
    /// Related-item requests raised through the hook are queued and applied on the next tick.
    pub fn render<R: Renderer<T>>(&mut self, renderer: &mut R) -> Vec<R::Output> {
        let mut queue = Vec::new();
        let mut out = Vec::with_capacity(self.packer.len());
        for item in self.packer.items_by_key() {
            let visible = self.window.is_visible(item);
            let mut hook = RelatedHook::new(item.id, &mut queue);
            out.push(renderer.render(RenderedItem::new(item, visible), &mut hook));
        }
        if !queue.is_empty() && !self.is_torn_down() {
            self.related.extend(queue);
            self.scheduler.schedule_once(TaskKind::InsertRelated, 0);
        }
        out
    }

    /// Calls `f` for every item inside the viewport window, column by column.
    pub fn for_each_visible(&self, mut f: impl FnMut(RenderedItem<'_, T>)) {
        self.window
            .for_each_visible(&self.packer, |item| f(RenderedItem::new(item, true)));
    }

    fn run_insert_batch(
        &mut self,
        now_ms: u64,
        report: &mut TickReport,
    ) -> Result<(), MasonryError> {
        if self.container.is_none()
            || self.phase == Phase::Reflowing
            || self.scheduler.is_pending(TaskKind::Rebuild)
        {
            return Ok(());
        }
        let end = self
            .placed
            .saturating_add(self.options.items_per_frame.max(1))
            .min(self.feed.len());
        if self.placed < end {
            let batch = self.feed[self.placed..end].to_vec();
            match self.packer.append_items(batch, &mut self.measurer) {
                Ok(ids) => {
                    self.placed += ids.len();
                    report.placed += ids.len();
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    mwarn!(%err, placed = self.placed, "feed batch left pending");
                }
            }
        }

        if self.placed < self.feed.len() {
            self.phase = Phase::Inserting;
            self.scheduler
                .schedule_once(TaskKind::InsertBatch, now_ms.saturating_add(1));
        } else {
            self.phase = Phase::Idle;
            self.request_more();
        }
        Ok(())
    }

    fn run_related(&mut self, now_ms: u64, report: &mut TickReport) -> Result<(), MasonryError> {
        if self.container.is_none() || self.phase == Phase::Reflowing {
            return Ok(());
        }
        while let Some(request) = self.related.pop_front() {
            let result = self.packer.insert_related(
                request.source,
                request.items.clone(),
                &self.resolver,
                &mut self.measurer,
            );
            match result {
                Ok(ids) => report.related += ids.len(),
                Err(MasonryError::MeasurementUnavailable) => {
                    mwarn!(source = request.source.0, "related items left pending");
                    self.related.push_front(request);
                    self.scheduler
                        .schedule_once(TaskKind::InsertRelated, now_ms.saturating_add(1));
                    break;
                }
                Err(err) if err.is_fatal() => {
                    self.related.push_front(request);
                    return Err(err);
                }
                Err(err) => {
                    mwarn!(%err, source = request.source.0, "related insertion dropped");
                }
            }
        }
        Ok(())
    }

    fn run_reflow(&mut self, now_ms: u64, report: &mut TickReport) -> Result<(), MasonryError> {
        let Some(container) = self.pending_container.take().or(self.container) else {
            return Ok(());
        };
        let layout = match ColumnLayout::resolve(&self.options.grid, container.width) {
            Ok(layout) => layout,
            Err(err) => {
                mwarn!(%err, "reflow abandoned");
                if self.phase == Phase::Reflowing {
                    self.phase = Phase::Idle;
                    self.settle(now_ms);
                }
                return Err(err);
            }
        };

        self.phase = Phase::Reflowing;
        if let Err(err) = self.packer.relayout(layout, &mut self.measurer) {
            mwarn!(%err, "reflow deferred to next tick");
            self.pending_container = Some(container);
            self.scheduler
                .schedule_once(TaskKind::Reflow, now_ms.saturating_add(1));
            return Ok(());
        }
        mdebug!(
            width = container.width,
            columns = layout.column_count,
            items = self.packer.len(),
            "reflow"
        );
        self.container = Some(container);
        self.update_window();
        report.reflowed = true;
        self.phase = Phase::Idle;
        self.settle(now_ms);
        Ok(())
    }

    fn run_rebuild(&mut self, now_ms: u64, report: &mut TickReport) -> Result<(), MasonryError> {
        if self.container.is_none() {
            self.packer.clear();
            self.placed = 0;
            self.settle(now_ms);
            return Ok(());
        }
        match self
            .packer
            .set_all_items(self.feed.clone(), &mut self.measurer)
        {
            Ok(ids) => {
                mdebug!(items = ids.len(), "rebuild");
                self.placed = ids.len();
                report.rebuilt = true;
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                mwarn!(%err, "rebuild deferred to next tick");
                self.scheduler
                    .schedule_once(TaskKind::Rebuild, now_ms.saturating_add(1));
                return Ok(());
            }
        }
        self.settle(now_ms);
        Ok(())
    }

    /// Derives the phase from the feed and schedules whatever is left to do.
    fn settle(&mut self, now_ms: u64) {
        if !self.related.is_empty() {
            self.scheduler
                .schedule_once(TaskKind::InsertRelated, now_ms);
        }
        if self.phase == Phase::Reflowing || self.scheduler.is_pending(TaskKind::Rebuild) {
            return;
        }
        if self.placed < self.feed.len() {
            self.phase = Phase::Inserting;
            if self.container.is_some() {
                self.scheduler.schedule_once(TaskKind::InsertBatch, now_ms);
            }
        } else {
            self.phase = Phase::Idle;
            self.request_more();
        }
    }

    fn request_more(&mut self) {
        if self.fetching || self.container.is_none() || self.placed < self.feed.len() {
            return;
        }
        let Some(load_more) = self.options.load_more.clone() else {
            return;
        };
        self.fetching = true;
        mdebug!(placed = self.placed, "load_more");
        load_more(self.placed);
    }

    fn update_window(&mut self) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        let window = ViewportWindow::compute(
            self.scroll_offset,
            container,
            self.options.grid.buffer_factor,
        );
        mtrace!(
            top = window.top,
            bottom = window.bottom,
            scroll_offset = self.scroll_offset,
            "update_window"
        );
        let changed = window != self.window;
        self.window = window;
        changed
    }
}

impl<T, M> fmt::Debug for Controller<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("placed", &self.placed)
            .field("feed_len", &self.feed.len())
            .field("fetching", &self.fetching)
            .field("container", &self.container)
            .field("window", &self.window)
            .field("pending_tasks", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}
