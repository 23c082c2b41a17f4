use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use masonry::{Container, GridOptions};
use masonry_adapter::{Controller, ControllerOptions, Phase};

fn main() {
    // Example: a headless host loop driving the controller.
    //
    // An adapter would:
    // - forward scroll/resize events with a timestamp
    // - call tick(now_ms) once per animation frame
    // - hand more items to set_items when load_more fires
    // - position items from render()/for_each_visible()
    let requested = Arc::new(AtomicUsize::new(usize::MAX));
    let sink = Arc::clone(&requested);
    let load_more = move |placed: usize| sink.store(placed, Ordering::Relaxed);
    let options = ControllerOptions::new(GridOptions::default())
        .with_items_per_frame(4)
        .with_load_more(Some(load_more));

    let measure = |n: &u64, _width: u32| 100 + (*n * 53 % 200) as u32;
    let mut c: Controller<u64, _> = Controller::new(options, measure);
    let mut container = Container {
        width: 1280,
        height: 720,
        offset: 64,
    };
    if let Err(err) = c.attach(container, 0) {
        eprintln!("attach failed: {err}");
        return;
    }

    let mut feed: Vec<Arc<u64>> = Vec::new();
    let mut now_ms = 0u64;
    while feed.len() < 60 || c.phase() != Phase::Idle {
        now_ms += 16;
        let wanted = requested.swap(usize::MAX, Ordering::Relaxed);
        if wanted != usize::MAX && feed.len() < 60 {
            feed.extend((0..20).map(|i| Arc::new((wanted + i) as u64)));
            c.set_items(feed.clone(), now_ms);
        }
        if now_ms == 160 {
            container.width = 760;
            c.on_resize(container, now_ms);
        }
        c.on_scroll(now_ms * 4, now_ms);

        match c.tick(now_ms) {
            Ok(report) if report.placed > 0 || report.reflowed => println!(
                "t={now_ms} placed={} reflowed={} phase={:?} metrics={:?}",
                report.placed,
                report.reflowed,
                c.phase(),
                c.metrics()
            ),
            Ok(_) => {}
            Err(err) => eprintln!("t={now_ms} tick failed: {err}"),
        }
    }

    let mut visible = 0usize;
    c.for_each_visible(|_| visible += 1);
    println!(
        "done: t={now_ms} items={} height={} visible={visible} fetching={}",
        c.placed_count(),
        c.height(),
        c.is_fetching()
    );
    c.teardown();
}
