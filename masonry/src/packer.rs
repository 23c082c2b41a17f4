use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;
use core::ops::Bound;

use crate::measure::resolve_heights;
use crate::neighbors::NearestNeighbors;
use crate::{
    ColumnLayout, GridItem, GridMetrics, ItemId, MasonryError, Measurer, OrderKey, Placement,
};

/// Incremental shortest-column packer.
///
/// The packer owns every [`GridItem`]. Columns are kept sorted by `top` and contiguous: each
/// item's `top` is the previous item's `bottom` (`top + height + gutter`).
///
/// All mutating operations measure first and commit afterwards, so a failed measurement leaves
/// the grid untouched.
#[derive(Clone, Debug)]
pub struct ColumnPacker<T> {
    layout: ColumnLayout,
    columns: Vec<Vec<GridItem<T>>>,
    keys: BTreeSet<OrderKey>,
    next_whole: u64,
    next_id: u64,
    height: u64,
    min_height: u64,
}

impl<T> Default for ColumnPacker<T> {
    fn default() -> Self {
        Self::new(ColumnLayout::default())
    }
}

impl<T> ColumnPacker<T> {
    pub fn new(layout: ColumnLayout) -> Self {
        Self {
            layout,
            columns: (0..layout.column_count).map(|_| Vec::new()).collect(),
            keys: BTreeSet::new(),
            next_whole: 0,
            next_id: 0,
            height: 0,
            min_height: 0,
        }
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn columns(&self) -> &[Vec<GridItem<T>>] {
        &self.columns
    }

    pub fn column(&self, column: usize) -> Option<&[GridItem<T>]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Tallest column bottom.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Shortest column bottom (an empty column counts as 0).
    pub fn min_height(&self) -> u64 {
        self.min_height
    }

    pub fn metrics(&self) -> GridMetrics {
        GridMetrics {
            column_count: self.layout.column_count,
            item_width: self.layout.item_width,
            gutter: self.layout.gutter,
            height: self.height,
            min_height: self.min_height,
            len: self.len(),
        }
    }

    /// Iterates all items column by column.
    pub fn iter(&self) -> impl Iterator<Item = &GridItem<T>> {
        self.columns.iter().flatten()
    }

    /// Returns all items sorted by key, i.e. in feed order.
    pub fn items_by_key(&self) -> Vec<&GridItem<T>> {
        let mut out: Vec<&GridItem<T>> = self.iter().collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Locates an item as `(column, index)`.
    pub fn find(&self, id: ItemId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, items)| {
            let index = items.iter().position(|it| it.id == id)?;
            Some((c, index))
        })
    }

    pub fn item(&self, id: ItemId) -> Option<&GridItem<T>> {
        let (c, i) = self.find(id)?;
        self.columns.get(c)?.get(i)
    }

    /// The append target: the column whose last item has the smallest `bottom`.
    ///
    /// The first empty column wins immediately; ties go to the lowest index.
    pub fn shortest_column(&self) -> usize {
        let mut best = 0usize;
        let mut best_bottom = u64::MAX;
        for (i, items) in self.columns.iter().enumerate() {
            let Some(last) = items.last() else {
                return i;
            };
            if last.bottom < best_bottom {
                best = i;
                best_bottom = last.bottom;
            }
        }
        best
    }

    /// Drops every item and resets keys. The layout is kept.
    pub fn clear(&mut self) {
        for items in &mut self.columns {
            items.clear();
        }
        self.keys.clear();
        self.next_whole = 0;
        self.height = 0;
        self.min_height = 0;
    }

    /// Measures `items` and appends each one to the shortest column, in order.
    ///
    /// Appending in several calls produces the same grid as appending the concatenation once.
    /// Returns the ids of the placed items.
    pub fn append_items<M>(
        &mut self,
        items: Vec<Arc<T>>,
        measurer: &mut M,
    ) -> Result<Vec<ItemId>, MasonryError>
    where
        M: Measurer<T> + ?Sized,
    {
        self.ensure_columns()?;
        let entries: Vec<(Arc<T>, Option<u32>)> = items.into_iter().map(|d| (d, None)).collect();
        let heights = resolve_heights(measurer, self.layout.item_width, &entries)?;

        let mut ids = Vec::with_capacity(entries.len());
        for ((data, _), height) in entries.into_iter().zip(heights) {
            let id = self.allocate_id();
            self.push_appended(id, data, height);
            ids.push(id);
        }
        self.refresh_extent();
        mtrace!(placed = ids.len(), height = self.height, "append_items");
        Ok(ids)
    }

    /// Measures `items` and splices them into `column` starting at `index`.
    ///
    /// The first item's `top` is the predecessor's `bottom` (or 0). Every item below the
    /// insertion point is shifted down by the inserted extent. Keys fall strictly between the
    /// predecessor's key and the next key in global order.
    pub fn insert_items<M>(
        &mut self,
        items: Vec<Arc<T>>,
        column: usize,
        index: usize,
        measurer: &mut M,
    ) -> Result<Vec<ItemId>, MasonryError>
    where
        M: Measurer<T> + ?Sized,
    {
        self.check_target(column, index)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let entries: Vec<(Arc<T>, Option<u32>)> = items.into_iter().map(|d| (d, None)).collect();
        let heights = resolve_heights(measurer, self.layout.item_width, &entries)?;
        let measured = entries
            .into_iter()
            .zip(heights)
            .map(|((data, _), h)| (data, h))
            .collect();
        self.insert_measured(measured, column, index)
    }

    /// Clears the grid and appends `items` from scratch, in order.
    ///
    /// Nothing is cleared if measurement fails.
    pub fn set_all_items<M>(
        &mut self,
        items: Vec<Arc<T>>,
        measurer: &mut M,
    ) -> Result<Vec<ItemId>, MasonryError>
    where
        M: Measurer<T> + ?Sized,
    {
        self.ensure_columns()?;
        let entries: Vec<(Arc<T>, Option<u32>)> = items.into_iter().map(|d| (d, None)).collect();
        let heights = resolve_heights(measurer, self.layout.item_width, &entries)?;

        self.clear();
        let mut ids = Vec::with_capacity(entries.len());
        for ((data, _), height) in entries.into_iter().zip(heights) {
            let id = self.allocate_id();
            self.push_appended(id, data, height);
            ids.push(id);
        }
        self.refresh_extent();
        mdebug!(items = ids.len(), height = self.height, "set_all_items");
        Ok(ids)
    }

    /// Re-packs every placed item under a new layout, in key order.
    ///
    /// Known heights are reused when the item width is unchanged; otherwise every item is
    /// remeasured. Ids survive, keys are renumbered. On error the grid is left as it was.
    pub fn relayout<M>(
        &mut self,
        layout: ColumnLayout,
        measurer: &mut M,
    ) -> Result<(), MasonryError>
    where
        M: Measurer<T> + ?Sized,
    {
        if layout.column_count == 0 {
            return Err(MasonryError::ColumnCountIndeterminate { container_width: 0 });
        }
        let reuse = layout.item_width == self.layout.item_width;
        let ordered = self.items_by_key();
        let ids: Vec<ItemId> = ordered.iter().map(|it| it.id).collect();
        let entries: Vec<(Arc<T>, Option<u32>)> = ordered
            .iter()
            .map(|it| (Arc::clone(&it.data), reuse.then_some(it.height)))
            .collect();
        let heights = resolve_heights(measurer, layout.item_width, &entries)?;

        self.layout = layout;
        self.columns = (0..layout.column_count).map(|_| Vec::new()).collect();
        self.clear();
        for ((id, (data, _)), height) in ids.into_iter().zip(entries).zip(heights) {
            self.push_appended(id, data, height);
        }
        self.refresh_extent();
        mdebug!(
            columns = layout.column_count,
            item_width = layout.item_width,
            remeasured = !reuse,
            items = self.len(),
            "relayout"
        );
        Ok(())
    }

    /// Inserts `items` near `source` at the positions chosen by `resolver`.
    ///
    /// Items beyond the number of available candidates go directly below `source`.
    pub fn insert_related<M>(
        &mut self,
        source: ItemId,
        items: Vec<Arc<T>>,
        resolver: &NearestNeighbors,
        measurer: &mut M,
    ) -> Result<Vec<ItemId>, MasonryError>
    where
        M: Measurer<T> + ?Sized,
    {
        if self.find(source).is_none() {
            return Err(MasonryError::UnknownItem(source));
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let points = resolver.resolve(self, source, items.len())?;

        let entries: Vec<(Arc<T>, Option<u32>)> = items.into_iter().map(|d| (d, None)).collect();
        let heights = resolve_heights(measurer, self.layout.item_width, &entries)?;
        let mut measured = entries
            .into_iter()
            .zip(heights)
            .map(|((data, _), h)| (data, h));

        let mut ids = Vec::new();
        for point in &points {
            let batch: Vec<(Arc<T>, u32)> = measured.by_ref().take(point.count).collect();
            ids.extend(self.insert_measured(batch, point.column, point.index)?);
        }

        let rest: Vec<(Arc<T>, u32)> = measured.collect();
        if !rest.is_empty() {
            let (column, index) = self.find(source).ok_or(MasonryError::UnknownItem(source))?;
            ids.extend(self.insert_measured(rest, column, index + 1)?);
        }
        mtrace!(
            source = source.0,
            inserted = ids.len(),
            points = points.len(),
            "insert_related"
        );
        Ok(ids)
    }

    fn check_target(&self, column: usize, index: usize) -> Result<(), MasonryError> {
        match self.columns.get(column) {
            Some(items) if index <= items.len() => Ok(()),
            _ => {
                mwarn!(column, index, "insertion target outside the grid");
                Err(MasonryError::InvalidInsertionTarget { column, index })
            }
        }
    }

    fn ensure_columns(&self) -> Result<(), MasonryError> {
        if self.columns.is_empty() {
            return Err(MasonryError::ColumnCountIndeterminate { container_width: 0 });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_appended(&mut self, id: ItemId, data: Arc<T>, height: u32) {
        let column = self.shortest_column();
        let top = self.columns[column].last().map_or(0, |it| it.bottom);
        self.next_whole += 1;
        let key = OrderKey::integer(self.next_whole);
        self.keys.insert(key.clone());
        let item = self.make_item(id, key, column, top, height, data, true);
        self.columns[column].push(item);
    }

    fn insert_measured(
        &mut self,
        items: Vec<(Arc<T>, u32)>,
        column: usize,
        index: usize,
    ) -> Result<Vec<ItemId>, MasonryError> {
        self.check_target(column, index)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        // Build the new column off to the side and publish it in one assignment.
        let mut scratch = mem::take(&mut self.columns[column]);
        let tail = scratch.split_off(index);
        let mut cursor = scratch.last().map_or(0, |it| it.bottom);
        let mut lo = scratch.last().map_or(OrderKey::MIN, |it| it.key.clone());
        let hi = self
            .keys
            .range((Bound::Excluded(&lo), Bound::Unbounded))
            .next()
            .cloned();

        let mut ids = Vec::with_capacity(items.len());
        for (data, height) in items {
            let key = OrderKey::between(&lo, hi.as_ref());
            self.keys.insert(key.clone());
            lo = key.clone();
            let id = self.allocate_id();
            let item = self.make_item(id, key, column, cursor, height, data, false);
            cursor = item.bottom;
            scratch.push(item);
            ids.push(id);
        }

        let shift = tail
            .first()
            .map_or(0, |first| cursor.saturating_sub(first.top));
        for mut item in tail {
            item.top += shift;
            item.bottom += shift;
            scratch.push(item);
        }
        self.columns[column] = scratch;
        self.refresh_extent();
        mtrace!(column, index, inserted = ids.len(), shift, "insert_items");
        Ok(ids)
    }

    #[allow(clippy::too_many_arguments)]
    fn make_item(
        &self,
        id: ItemId,
        key: OrderKey,
        column: usize,
        top: u64,
        height: u32,
        data: Arc<T>,
        appended: bool,
    ) -> GridItem<T> {
        GridItem {
            id,
            key,
            column,
            left: self.layout.column_left(column),
            top,
            width: self.layout.item_width,
            height,
            bottom: top + height as u64 + self.layout.gutter as u64,
            data,
            appended,
        }
    }

    fn refresh_extent(&mut self) {
        let bottoms = self
            .columns
            .iter()
            .map(|items| items.last().map_or(0, |it| it.bottom));
        let (mut max, mut min) = (0u64, u64::MAX);
        for bottom in bottoms {
            max = max.max(bottom);
            min = min.min(bottom);
        }
        self.height = max;
        self.min_height = if min == u64::MAX { 0 } else { min };
    }

    /// Geometry of every item, column by column. Useful for comparing layouts.
    pub fn placements(&self) -> Vec<Placement> {
        self.iter().map(GridItem::placement).collect()
    }
}
