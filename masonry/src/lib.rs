//! A headless masonry layout engine.
//!
//! Lays out an unbounded, growing list of variable-height items into equal-width columns:
//! incremental shortest-column packing, targeted mid-column insertion of related items, stable
//! order keys that survive reflow, and a buffered viewport window for virtualization.
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - container width/height and scroll offset
//! - a [`Measurer`] that reports the rendered height of an item at a given width
//!
//! For a frame-paced feed/reflow driver, see the `masonry-adapter` crate.
//!
//! Without the default `std` feature the crate is `no_std` (with `alloc`) and takes its float
//! functions from `libm`, which must then be enabled.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("masonry requires either the `std` or the `libm` feature");

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod key;
mod math;
mod measure;
mod neighbors;
mod options;
mod packer;
mod types;
mod window;


pub use error::MasonryError;
pub use key::OrderKey;
pub use measure::{Measurer, measure_batch};
pub use neighbors::{COLUMN_HOP_PENALTY, Candidate, InsertionPoint, NearestNeighbors, distance};
pub use options::{
    ColumnLayout, DEFAULT_BUFFER_FACTOR, DEFAULT_GUTTER, DEFAULT_INSERT_TOLERANCE,
    DEFAULT_ITEM_WIDTH, DEFAULT_MIN_COLUMNS, GridOptions,
};
pub use packer::ColumnPacker;
pub use types::{GridItem, GridMetrics, ItemId, Placement, Size};
pub use window::{Container, ViewportWindow};
