//! Feed and reflow driver for the `masonry` crate.
//!
//! The `masonry` crate is UI-agnostic and focuses on packing and geometry. This crate provides a
//! framework-neutral [`Controller`] that adapters drive from their event loop:
//!
//! - Frame-paced insertion of a growing feed, with a load-more callback when caught up
//! - Debounced reflow on resize and throttled viewport-window updates on scroll
//! - A render pass that lets rendered items request related items next to themselves
//!
//! Nothing here owns a timer. The host passes the current time to [`Controller::tick`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod controller;
mod options;
mod render;
mod schedule;

#[cfg(test)]
mod tests;

pub use controller::{Controller, Phase, TickReport};
pub use options::{
    ControllerOptions, DEFAULT_ITEMS_PER_FRAME, DEFAULT_RESIZE_DEBOUNCE_MS,
    DEFAULT_SCROLL_THROTTLE_MS, LoadMoreCallback,
};
pub use render::{RelatedHook, RenderedItem, Renderer};
pub use schedule::{Scheduler, TaskKind, TaskToken};
