use alloc::sync::Arc;
use core::fmt;

use crate::OrderKey;

/// A stable handle for a placed item. Survives reflow; a full rebuild issues new ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of measuring one item rendering at a target width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// One placed grid entry.
///
/// Geometry is committed once, after measurement; only the packer mutates it (shift on
/// insertion, rebuild on reflow).
pub struct GridItem<T> {
    pub id: ItemId,
    pub key: OrderKey,
    pub column: usize,
    pub left: u32,
    pub top: u64,
    pub width: u32,
    /// Measured height (excludes the gutter).
    pub height: u32,
    /// `top + height + gutter`.
    pub bottom: u64,
    pub data: Arc<T>,
    /// `true` when placed by shortest-column append, `false` for targeted insertion.
    pub appended: bool,
}

impl<T> GridItem<T> {
    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            column: self.column,
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            bottom: self.bottom,
        }
    }
}

impl<T> Clone for GridItem<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            key: self.key.clone(),
            column: self.column,
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            bottom: self.bottom,
            data: Arc::clone(&self.data),
            appended: self.appended,
        }
    }
}

impl<T> fmt::Debug for GridItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridItem")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("column", &self.column)
            .field("left", &self.left)
            .field("top", &self.top)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bottom", &self.bottom)
            .field("appended", &self.appended)
            .finish_non_exhaustive()
    }
}

/// Plain geometry of a placed item, without its payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub column: usize,
    pub left: u32,
    pub top: u64,
    pub width: u32,
    pub height: u32,
    pub bottom: u64,
}

/// A lightweight snapshot of the grid's shape, for host layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridMetrics {
    pub column_count: usize,
    pub item_width: u32,
    pub gutter: u32,
    /// Tallest column bottom; the grid's rendered height.
    pub height: u64,
    /// Shortest column bottom; a safe height floor during partial layout.
    pub min_height: u64,
    pub len: usize,
}
