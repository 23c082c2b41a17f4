//! Nearest-neighbor ranking for related-item insertion.

use alloc::vec::Vec;

use crate::{ColumnPacker, GridItem, ItemId, MasonryError, math};

/// Cost of each column hop between vertically overlapping items in different columns.
pub const COLUMN_HOP_PENALTY: f64 = 10.0;

/// Where to splice related items: `count` items into `column` starting at `index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsertionPoint {
    pub column: usize,
    pub index: usize,
    pub count: usize,
}

/// A ranked insertion candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub id: ItemId,
    pub column: usize,
    pub index: usize,
    pub distance: f64,
}

/// Geometric distance between two placed items, as seen from `a`.
///
/// - Same column: the 1-D gap between the items, less one gutter (and one pixel).
/// - Different columns, overlapping vertical spans: [`COLUMN_HOP_PENALTY`] per column hop plus
///   the vertical offset normalized by `a`'s height.
/// - Otherwise: Euclidean distance between the closest corners.
pub fn distance<T>(a: &GridItem<T>, b: &GridItem<T>, gutter: u32) -> f64 {
    let gutter = gutter as i64;
    if a.column == b.column {
        let gap = if b.top >= a.top {
            b.top as i64 - a.bottom as i64
        } else {
            a.top as i64 - b.bottom as i64
        };
        return (gap - gutter - 1) as f64;
    }

    let overlaps = a.top < b.bottom && b.top < a.bottom;
    if overlaps {
        let hops = a.column.abs_diff(b.column) as f64;
        let offset = a.top.abs_diff(b.top) as f64;
        return COLUMN_HOP_PENALTY * hops + offset / a.height.max(1) as f64;
    }

    let dy = if b.top >= a.bottom {
        b.top - a.bottom
    } else {
        a.top.saturating_sub(b.bottom)
    };
    let dx = if b.left >= a.right() {
        b.left - a.right()
    } else {
        a.left.saturating_sub(b.right())
    };
    let (dx, dy) = (dx as f64, dy as f64);
    math::sqrt(dx * dx + dy * dy)
}

/// Ranks existing items around a requester and buckets them into per-column insertion points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearestNeighbors {
    /// Candidates whose `top` is more than this far above the requester's `top` are skipped.
    pub tolerance: u64,
}

impl Default for NearestNeighbors {
    fn default() -> Self {
        Self {
            tolerance: crate::options::DEFAULT_INSERT_TOLERANCE,
        }
    }
}

impl NearestNeighbors {
    pub fn new(tolerance: u64) -> Self {
        Self { tolerance }
    }

    /// Returns every eligible candidate around `source`, closest first.
    ///
    /// Equal distances keep column-major order.
    pub fn rank<T>(
        &self,
        packer: &ColumnPacker<T>,
        source: ItemId,
    ) -> Result<Vec<Candidate>, MasonryError> {
        let a = packer
            .item(source)
            .ok_or(MasonryError::UnknownItem(source))?;
        let gutter = packer.layout().gutter;
        let floor = a.top.saturating_sub(self.tolerance);

        let mut out = Vec::new();
        for (column, items) in packer.columns().iter().enumerate() {
            for (index, b) in items.iter().enumerate() {
                if b.id == source || b.top < floor {
                    continue;
                }
                out.push(Candidate {
                    id: b.id,
                    column,
                    index,
                    distance: distance(a, b, gutter),
                });
            }
        }
        out.sort_by(|x, y| x.distance.total_cmp(&y.distance));
        Ok(out)
    }

    /// Picks the `count` closest candidates and groups them by column.
    ///
    /// Each point inserts at the closest candidate's index in that column; points are ordered by
    /// their closest candidate.
    pub fn resolve<T>(
        &self,
        packer: &ColumnPacker<T>,
        source: ItemId,
        count: usize,
    ) -> Result<Vec<InsertionPoint>, MasonryError> {
        let ranked = self.rank(packer, source)?;
        let mut points: Vec<InsertionPoint> = Vec::new();
        for candidate in ranked.into_iter().take(count) {
            match points.iter_mut().find(|p| p.column == candidate.column) {
                Some(point) => point.count += 1,
                None => points.push(InsertionPoint {
                    column: candidate.column,
                    index: candidate.index,
                    count: 1,
                }),
            }
        }
        mtrace!(
            source = source.0,
            count,
            points = points.len(),
            "resolve_insertion_points"
        );
        Ok(points)
    }
}
