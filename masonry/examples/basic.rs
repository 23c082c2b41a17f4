// Example: pack a feed into columns and list what a viewport would render.
use std::sync::Arc;

use masonry::{ColumnLayout, ColumnPacker, Container, GridOptions, MasonryError, ViewportWindow};

fn main() -> Result<(), MasonryError> {
    let options = GridOptions::new(236);
    let container = Container {
        width: 1024,
        height: 800,
        offset: 0,
    };
    let layout = ColumnLayout::resolve(&options, container.width)?;
    println!("layout={layout:?}");

    // Heights normally come from an off-screen render; any closure over the item works.
    let mut measure = |len: &usize, _width: u32| 120 + (*len as u32 * 37) % 240;
    let mut packer = ColumnPacker::new(layout);
    let feed: Vec<Arc<usize>> = (0..200).map(Arc::new).collect();
    packer.append_items(feed, &mut measure)?;
    println!("metrics={:?}", packer.metrics());

    let window = ViewportWindow::compute(2_000, container, options.buffer_factor);
    println!(
        "window={window:?} visible={}",
        window.visible_count(&packer)
    );
    window.for_each_visible(&packer, |it| {
        if it.column == 0 {
            println!("  {} key={} top={} h={}", it.id, it.key, it.top, it.height);
        }
    });
    Ok(())
}
