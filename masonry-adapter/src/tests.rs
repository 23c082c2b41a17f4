use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

use masonry::{ColumnLayout, ColumnPacker, Container, GridOptions, ItemId, MasonryError, Measurer};

#[derive(Debug)]
struct Tile {
    id: u32,
    height: u32,
}

fn tiles_from(first_id: u32, heights: &[u32]) -> Vec<Arc<Tile>> {
    heights
        .iter()
        .enumerate()
        .map(|(i, &height)| {
            Arc::new(Tile {
                id: first_id + i as u32,
                height,
            })
        })
        .collect()
}

fn tiles(heights: &[u32]) -> Vec<Arc<Tile>> {
    tiles_from(0, heights)
}

fn by_height(tile: &Tile, _width: u32) -> u32 {
    tile.height
}

type Measure = fn(&Tile, u32) -> u32;

fn grid() -> GridOptions {
    GridOptions::new(100)
        .with_min_columns(1)
        .with_gutter(Some(10))
        .with_buffer_factor(0.5)
}

fn options() -> ControllerOptions {
    ControllerOptions::new(grid())
}

fn container(width: u32) -> Container {
    Container {
        width,
        height: 200,
        offset: 0,
    }
}

fn controller(options: ControllerOptions) -> Controller<Tile, Measure> {
    Controller::new(options, by_height as Measure)
}

fn feed_order<M: Measurer<Tile>>(c: &Controller<Tile, M>) -> Vec<u32> {
    c.packer()
        .items_by_key()
        .iter()
        .map(|it| it.data.id)
        .collect()
}

fn with_recorder(options: ControllerOptions) -> (ControllerOptions, Arc<Mutex<Vec<usize>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let options = options.with_load_more(Some(move |placed: usize| {
        sink.lock().unwrap().push(placed);
    }));
    (options, calls)
}

struct Flaky {
    available: bool,
    measured: usize,
}

impl Measurer<Tile> for Flaky {
    fn open_surface(&mut self, _width: u32) -> Result<(), MasonryError> {
        if self.available {
            Ok(())
        } else {
            Err(MasonryError::MeasurementUnavailable)
        }
    }

    fn measure(&mut self, item: &Tile, _width: u32) -> Result<u32, MasonryError> {
        self.measured += 1;
        Ok(item.height)
    }
}

#[test]
fn options_defaults() {
    let o = ControllerOptions::default();
    assert_eq!(o.items_per_frame, DEFAULT_ITEMS_PER_FRAME);
    assert_eq!(o.scroll_throttle_ms, 100);
    assert_eq!(o.resize_debounce_ms, 300);
    assert!(o.load_more.is_none());
    assert_eq!(o.grid, GridOptions::default());

    let o = o.with_load_more(Some(|_: usize| {}));
    assert!(o.clone().load_more.is_some());
    let o = o.with_load_more(None::<fn(usize)>);
    assert!(o.load_more.is_none());
}

#[test]
fn scheduler_runs_due_tasks_in_order() {
    let mut s = Scheduler::new();
    s.schedule(TaskKind::Reflow, 10);
    s.schedule(TaskKind::InsertBatch, 5);
    s.schedule(TaskKind::UpdateWindow, 5);

    assert!(s.take_due(4).is_empty());
    assert_eq!(
        s.take_due(10),
        [
            TaskKind::InsertBatch,
            TaskKind::UpdateWindow,
            TaskKind::Reflow
        ]
    );
    assert!(s.is_empty());
}

#[test]
fn scheduler_reschedule_debounces() {
    let mut s = Scheduler::new();
    let first = s.schedule(TaskKind::Reflow, 10).unwrap();
    let second = s.reschedule(TaskKind::Reflow, 20).unwrap();
    assert_ne!(first, second);
    assert_eq!(s.due_ms(first), None);
    assert_eq!(s.due_ms(second), Some(20));
    assert_eq!(s.len(), 1);

    assert_eq!(s.schedule_once(TaskKind::Reflow, 5), Some(second));
    assert_eq!(s.due_ms(second), Some(20));

    assert!(s.cancel(second));
    assert!(!s.cancel(second));
    assert!(!s.is_pending(TaskKind::Reflow));
}

#[test]
fn scheduler_shutdown_refuses_new_tasks() {
    let mut s = Scheduler::new();
    s.schedule(TaskKind::InsertBatch, 0);
    s.schedule(TaskKind::Reflow, 300);
    assert_eq!(s.shutdown(), 2);
    assert!(s.is_shut_down());
    assert_eq!(s.schedule(TaskKind::InsertBatch, 0), None);
    assert!(s.take_due(u64::MAX).is_empty());
}

#[test]
fn feed_is_inserted_one_batch_per_tick() {
    let (opts, calls) = with_recorder(options().with_items_per_frame(2));
    let mut c = controller(opts);

    c.attach(container(330), 0).unwrap();
    assert_eq!(c.metrics().column_count, 3);
    // Caught up with an empty feed.
    assert_eq!(*calls.lock().unwrap(), [0]);
    assert!(c.is_fetching());

    c.set_items(tiles(&[50, 60, 70, 80, 90]), 0);
    assert!(!c.is_fetching());
    assert_eq!(c.phase(), Phase::Inserting);

    assert_eq!(c.tick(0).unwrap().placed, 2);
    // The next batch waits for the next frame.
    assert_eq!(c.tick(0).unwrap().placed, 0);
    assert_eq!(c.tick(1).unwrap().placed, 2);
    assert_eq!(c.phase(), Phase::Inserting);
    assert_eq!(c.tick(2).unwrap().placed, 1);

    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.placed_count(), 5);
    assert_eq!(*calls.lock().unwrap(), [0, 5]);
    assert!(c.is_fetching());

    c.tick(3).unwrap();
    assert_eq!(calls.lock().unwrap().len(), 2);

    assert_eq!(c.height(), 170);
    assert_eq!(c.min_height(), 80);
    assert_eq!(feed_order(&c), [0, 1, 2, 3, 4]);
}

#[test]
fn unchanged_feed_keeps_fetching() {
    let (opts, calls) = with_recorder(options());
    let mut c = controller(opts);
    let feed = tiles(&[10, 20]);
    c.attach(container(330), 0).unwrap();
    c.set_items(feed.clone(), 0);
    c.tick(0).unwrap();
    c.tick(1).unwrap();
    assert_eq!(*calls.lock().unwrap(), [0, 2]);

    c.set_items(feed.clone(), 2);
    assert!(c.is_fetching());
    c.tick(2).unwrap();
    assert_eq!(*calls.lock().unwrap(), [0, 2]);

    let mut grown = feed;
    grown.extend(tiles_from(2, &[30]));
    c.set_items(grown, 3);
    assert!(!c.is_fetching());
    c.tick(3).unwrap();
    assert_eq!(*calls.lock().unwrap(), [0, 2, 3]);
}

#[test]
fn resize_is_debounced_and_keeps_order() {
    let mut c = controller(options().with_items_per_frame(10));
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[30, 40, 50, 60, 70, 80]), 0);
    assert_eq!(c.tick(0).unwrap().placed, 6);

    c.on_resize(container(220), 10);
    c.on_resize(container(550), 100);
    c.on_resize(container(220), 200);
    assert_eq!(c.scheduler().len(), 1);

    assert!(!c.tick(300).unwrap().reflowed);
    assert_eq!(c.metrics().column_count, 3);

    let report = c.tick(500).unwrap();
    assert!(report.reflowed);
    assert_eq!(c.metrics().column_count, 2);
    assert_eq!(c.container(), Some(container(220)));
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(feed_order(&c), [0, 1, 2, 3, 4, 5]);

    let layout = ColumnLayout::resolve(&grid(), 220).unwrap();
    let mut fresh = ColumnPacker::new(layout);
    fresh
        .set_all_items(tiles(&[30, 40, 50, 60, 70, 80]), &mut by_height)
        .unwrap();
    assert_eq!(c.packer().placements(), fresh.placements());
}

#[test]
fn resize_mid_insert_keeps_progress() {
    let mut c = controller(options().with_resize_debounce_ms(5));
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20, 30, 40]), 0);
    c.tick(0).unwrap();
    c.tick(1).unwrap();
    assert_eq!(c.placed_count(), 2);

    c.on_resize(container(220), 1);
    let report = c.tick(6).unwrap();
    assert_eq!(report.placed, 1);
    assert!(report.reflowed);
    assert_eq!(c.metrics().column_count, 2);
    assert_eq!(c.packer().len(), 3);
    assert_eq!(c.placed_count(), 3);
    assert_eq!(c.phase(), Phase::Inserting);

    c.tick(7).unwrap();
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(feed_order(&c), [0, 1, 2, 3]);
}

#[test]
fn scroll_is_throttled_to_latest_offset() {
    let mut c = controller(options());
    c.attach(container(330), 0).unwrap();
    assert_eq!(c.window().top, -100);
    assert_eq!(c.window().bottom, 300);

    c.on_scroll(50, 10);
    c.on_scroll(120, 20);
    let report = c.tick(20).unwrap();
    assert!(report.window_updated);
    assert_eq!(c.window().top, 20);
    assert_eq!(c.window().bottom, 420);

    c.on_scroll(300, 30);
    assert!(!c.tick(119).unwrap().window_updated);
    assert_eq!(c.window().top, 20);
    assert!(c.tick(120).unwrap().window_updated);
    assert_eq!(c.window().top, 200);
    assert_eq!(c.window().bottom, 600);
    assert_eq!(c.scroll_offset(), 300);
}

#[test]
fn teardown_cancels_outstanding_work() {
    let (opts, calls) = with_recorder(options());
    let mut c = controller(opts);
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20, 30]), 0);
    c.tick(0).unwrap();
    c.on_resize(container(220), 0);
    c.on_scroll(10, 0);
    c.request_related(ItemId(0), tiles_from(100, &[5]));

    c.teardown();
    assert!(c.is_torn_down());
    assert!(c.scheduler().is_empty());

    assert_eq!(c.tick(10_000).unwrap(), TickReport::default());
    assert_eq!(c.placed_count(), 1);
    assert_eq!(c.packer().len(), 1);
    assert_eq!(c.metrics().column_count, 3);

    c.set_items(tiles(&[1, 2, 3, 4]), 10_001);
    c.on_resize(container(550), 10_001);
    assert!(c.scheduler().is_empty());
    assert_eq!(c.feed_len(), 3);
    assert_eq!(*calls.lock().unwrap(), [0]);
}

#[test]
fn unavailable_measurement_is_retried_next_tick() {
    let mut c: Controller<Tile, Flaky> = Controller::new(
        options(),
        Flaky {
            available: true,
            measured: 0,
        },
    );
    c.attach(container(330), 0).unwrap();
    c.measurer_mut().available = false;
    c.set_items(tiles(&[10, 20]), 0);

    let report = c.tick(0).unwrap();
    assert_eq!(report.placed, 0);
    assert_eq!(c.placed_count(), 0);
    assert_eq!(c.phase(), Phase::Inserting);
    assert!(c.packer().is_empty());

    c.measurer_mut().available = true;
    assert_eq!(c.tick(1).unwrap().placed, 1);
    assert_eq!(c.tick(2).unwrap().placed, 1);
    assert_eq!(c.measurer().measured, 2);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn reflow_reuses_measured_heights() {
    let mut c: Controller<Tile, Flaky> = Controller::new(
        options().with_items_per_frame(10),
        Flaky {
            available: true,
            measured: 0,
        },
    );
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20, 30, 40]), 0);
    c.tick(0).unwrap();
    assert_eq!(c.measurer().measured, 4);

    // Fixed-width columns keep their width, so nothing needs remeasuring.
    c.measurer_mut().available = false;
    c.on_resize(container(220), 0);
    assert!(c.tick(300).unwrap().reflowed);
    assert_eq!(c.measurer().measured, 4);
    assert_eq!(c.metrics().column_count, 2);
}

struct Requester {
    source: u32,
    related: Vec<Arc<Tile>>,
}

impl Renderer<Tile> for Requester {
    type Output = (u32, bool, (u32, u64));

    fn render(
        &mut self,
        item: RenderedItem<'_, Tile>,
        related: &mut RelatedHook<'_, Tile>,
    ) -> Self::Output {
        if item.data.id == self.source && !self.related.is_empty() {
            related.insert_related(core::mem::take(&mut self.related));
        }
        (item.data.id, item.visible, item.translation())
    }
}

#[test]
fn render_hook_inserts_related_items_next_tick() {
    let mut c = controller(options().with_items_per_frame(10));
    c.attach(container(220), 0).unwrap();
    c.set_items(tiles(&[40, 40, 200, 30, 30]), 0);
    c.tick(0).unwrap();

    let mut renderer = Requester {
        source: 0,
        related: tiles_from(100, &[20]),
    };
    let out = c.render(&mut renderer);
    assert_eq!(out.len(), 5);
    assert_eq!(out[1], (1, true, (115, 0)));
    assert_eq!(c.packer().len(), 5);

    let report = c.tick(1).unwrap();
    assert_eq!(report.related, 1);
    assert_eq!(c.packer().len(), 6);
    assert_eq!(c.placed_count(), 5);
    assert_eq!(feed_order(&c), [0, 100, 1, 2, 3, 4]);

    let column0: Vec<(u32, u64)> = c.packer().columns()[0]
        .iter()
        .map(|it| (it.data.id, it.top))
        .collect();
    assert_eq!(column0, [(0, 0), (100, 50), (2, 80)]);
    assert_eq!(c.height(), 290);

    assert_eq!(c.render(&mut renderer).len(), 6);
    assert!(!c.scheduler().is_pending(TaskKind::InsertRelated));
}

#[test]
fn related_request_for_unknown_item_is_dropped() {
    let mut c = controller(options());
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10]), 0);
    c.tick(0).unwrap();

    c.request_related(ItemId(999), tiles_from(100, &[5]));
    let report = c.tick(1).unwrap();
    assert_eq!(report.related, 0);
    assert_eq!(c.packer().len(), 1);
    assert!(c.scheduler().is_empty());
}

#[test]
fn feed_identity_change_rebuilds() {
    let mut c = controller(options().with_items_per_frame(10));
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20, 30]), 0);
    c.tick(0).unwrap();
    assert_eq!(c.placed_count(), 3);

    c.set_items(tiles_from(50, &[15, 25]), 1);
    assert_eq!(c.phase(), Phase::Inserting);
    let report = c.tick(1).unwrap();
    assert!(report.rebuilt);
    assert_eq!(c.placed_count(), 2);
    assert_eq!(feed_order(&c), [50, 51]);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn same_length_replacement_answers_load_more() {
    let (opts, calls) = with_recorder(options().with_items_per_frame(10));
    let mut c = controller(opts);
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20]), 0);
    c.tick(0).unwrap();
    assert_eq!(*calls.lock().unwrap(), [0, 2]);
    assert!(c.is_fetching());

    c.set_items(tiles_from(50, &[15, 25]), 1);
    assert!(!c.is_fetching());
    assert!(c.tick(1).unwrap().rebuilt);
    assert_eq!(feed_order(&c), [50, 51]);
    assert_eq!(*calls.lock().unwrap(), [0, 2, 2]);
}

#[test]
#[deny(unused_variables)]
fn warn_shim_uses_error_captures() {
    let err = MasonryError::MeasurementUnavailable;
    mwarn!(%err, placed = 0, "feed batch left pending");
}

#[test]
fn attach_without_width_is_fatal_and_retryable() {
    let mut c = controller(options());
    assert_eq!(
        c.attach(container(0), 0),
        Err(MasonryError::ColumnCountIndeterminate { container_width: 0 })
    );
    assert!(!c.is_attached());

    c.set_items(tiles(&[10, 20]), 0);
    assert_eq!(c.tick(0).unwrap().placed, 0);
    assert_eq!(c.phase(), Phase::Inserting);

    c.attach(container(330), 5).unwrap();
    assert_eq!(c.tick(5).unwrap().placed, 1);
    assert_eq!(c.tick(6).unwrap().placed, 1);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn reflow_to_zero_width_reports_fatal_error() {
    let mut c = controller(options().with_items_per_frame(10));
    c.attach(container(330), 0).unwrap();
    c.set_items(tiles(&[10, 20, 30]), 0);
    c.tick(0).unwrap();

    c.on_resize(container(0), 0);
    assert_eq!(
        c.tick(300),
        Err(MasonryError::ColumnCountIndeterminate { container_width: 0 })
    );
    assert_eq!(c.metrics().column_count, 3);
    assert_eq!(c.container(), Some(container(330)));
    assert_eq!(c.packer().len(), 3);
}

#[test]
fn render_reports_visibility_from_window() {
    let opts = ControllerOptions::new(grid().with_buffer_factor(0.0)).with_items_per_frame(9);
    let mut c = controller(opts);
    c.attach(
        Container {
            width: 330,
            height: 100,
            offset: 0,
        },
        0,
    )
    .unwrap();
    c.set_items(tiles(&[90; 9]), 0);
    c.on_scroll(250, 0);
    c.tick(0).unwrap();
    assert_eq!(c.window().top, 250);
    assert_eq!(c.window().bottom, 350);

    let mut renderer = Requester {
        source: u32::MAX,
        related: Vec::new(),
    };
    let visible: Vec<u32> = c
        .render(&mut renderer)
        .into_iter()
        .filter(|(_, visible, _)| *visible)
        .map(|(id, _, _)| id)
        .collect();
    assert_eq!(visible, [6, 7, 8]);

    let mut seen = Vec::new();
    c.for_each_visible(|item| seen.push((item.data.id, item.translation())));
    seen.sort_unstable();
    assert_eq!(seen, [(6, (5, 200)), (7, (115, 200)), (8, (225, 200))]);
    assert!(c.is_visible(ItemId(7)));
    assert!(!c.is_visible(ItemId(4)));
}
