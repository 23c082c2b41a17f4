// Example: splice related items next to an existing item.
use std::sync::Arc;

use masonry::{ColumnLayout, ColumnPacker, GridOptions, MasonryError, NearestNeighbors};

fn main() -> Result<(), MasonryError> {
    let options = GridOptions::new(200).with_min_columns(3);
    let layout = ColumnLayout::resolve(&options, 660)?;
    let mut measure = |h: &u32, _width: u32| *h;

    let mut packer = ColumnPacker::new(layout);
    let heights = [180, 240, 120, 300, 160, 200, 140, 260, 220];
    let feed: Vec<Arc<u32>> = heights.into_iter().map(Arc::new).collect();
    let ids = packer.append_items(feed, &mut measure)?;

    let resolver = NearestNeighbors::new(options.insert_tolerance);
    let source = ids[4];
    for candidate in resolver.rank(&packer, source)?.iter().take(4) {
        println!("candidate {candidate:?}");
    }

    let related: Vec<Arc<u32>> = [90, 110, 70].into_iter().map(Arc::new).collect();
    let inserted = packer.insert_related(source, related, &resolver, &mut measure)?;
    println!("inserted={inserted:?}");

    for (column, items) in packer.columns().iter().enumerate() {
        let row: Vec<String> = items
            .iter()
            .map(|it| {
                let marker = if it.appended { "" } else { "*" };
                format!("{}@{}{marker}", it.id, it.top)
            })
            .collect();
        println!("column {column}: {}", row.join(" "));
    }
    Ok(())
}
