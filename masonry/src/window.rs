use crate::{ColumnPacker, GridItem, math};

/// Container geometry as reported by the host.
///
/// `offset` is where the grid starts inside the scroll container (e.g. below a header), so that
/// scroll offsets measured on the container map into grid coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Container {
    pub width: u32,
    /// Visible height of the scroll container.
    pub height: u32,
    pub offset: u64,
}

/// The buffered viewport window in grid coordinates.
///
/// `top` may be negative when the buffer reaches above the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportWindow {
    pub top: i64,
    pub bottom: i64,
}

impl ViewportWindow {
    /// `top = scroll - offset - buffer`, `bottom = scroll - offset + height + buffer`, where
    /// `buffer = height * buffer_factor`.
    pub fn compute(scroll_offset: u64, container: Container, buffer_factor: f32) -> Self {
        let relative = scroll_offset as i64 - container.offset as i64;
        let height = container.height as i64;
        let buffer = math::round(container.height as f64 * buffer_factor.max(0.0) as f64) as i64;
        Self {
            top: relative - buffer,
            bottom: relative + height + buffer,
        }
    }

    /// Span test: `bottom >= window.top && top <= window.bottom`.
    pub fn contains(&self, top: u64, bottom: u64) -> bool {
        bottom as i64 >= self.top && top as i64 <= self.bottom
    }

    pub fn is_visible<T>(&self, item: &GridItem<T>) -> bool {
        self.contains(item.top, item.bottom)
    }

    /// Calls `f` for every item inside the window, column by column.
    ///
    /// Columns are sorted and contiguous, so each column is binary-searched for its first
    /// visible item and scanned only while items stay inside the window.
    pub fn for_each_visible<'a, T>(
        &self,
        packer: &'a ColumnPacker<T>,
        mut f: impl FnMut(&'a GridItem<T>),
    ) {
        for items in packer.columns() {
            let start = items.partition_point(|it| (it.bottom as i64) < self.top);
            for item in &items[start..] {
                if item.top as i64 > self.bottom {
                    break;
                }
                f(item);
            }
        }
    }

    pub fn visible_count<T>(&self, packer: &ColumnPacker<T>) -> usize {
        let mut n = 0usize;
        self.for_each_visible(packer, |_| n += 1);
        n
    }
}
