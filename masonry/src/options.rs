use crate::MasonryError;

pub const DEFAULT_ITEM_WIDTH: u32 = 236;
pub const DEFAULT_MIN_COLUMNS: usize = 3;
/// Gutter used by fixed-width grids when none is configured. Flexible grids default to 0.
pub const DEFAULT_GUTTER: u32 = 14;
pub const DEFAULT_BUFFER_FACTOR: f32 = 0.7;
pub const DEFAULT_INSERT_TOLERANCE: u64 = 20;

/// Configuration for the grid geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridOptions {
    /// Preferred item width (fixed mode) or minimum column unit (flexible mode).
    pub item_width: u32,
    pub min_columns: usize,
    /// Vertical/horizontal spacing between items. `None` resolves from `flexible`.
    pub gutter: Option<u32>,
    /// Stretch columns to fill the container instead of centering fixed-width columns.
    pub flexible: bool,
    /// Fraction of the container height added above and below the viewport window.
    pub buffer_factor: f32,
    /// How far above the requester a related-item target may start.
    pub insert_tolerance: u64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            item_width: DEFAULT_ITEM_WIDTH,
            min_columns: DEFAULT_MIN_COLUMNS,
            gutter: None,
            flexible: false,
            buffer_factor: DEFAULT_BUFFER_FACTOR,
            insert_tolerance: DEFAULT_INSERT_TOLERANCE,
        }
    }
}

impl GridOptions {
    pub fn new(item_width: u32) -> Self {
        Self {
            item_width,
            ..Self::default()
        }
    }

    pub fn with_item_width(mut self, item_width: u32) -> Self {
        self.item_width = item_width;
        self
    }

    pub fn with_min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = min_columns;
        self
    }

    pub fn with_gutter(mut self, gutter: Option<u32>) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    pub fn with_buffer_factor(mut self, buffer_factor: f32) -> Self {
        self.buffer_factor = buffer_factor;
        self
    }

    pub fn with_insert_tolerance(mut self, insert_tolerance: u64) -> Self {
        self.insert_tolerance = insert_tolerance;
        self
    }

    pub fn resolved_gutter(&self) -> u32 {
        self.gutter
            .unwrap_or(if self.flexible { 0 } else { DEFAULT_GUTTER })
    }
}

/// Column parameters derived from the container width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnLayout {
    pub column_count: usize,
    pub item_width: u32,
    pub gutter: u32,
    /// Horizontal offset of the first column (centering in fixed mode).
    pub offset: u32,
}

impl ColumnLayout {
    /// Derives the column count and item width for a container.
    ///
    /// `column_count = max(floor(width / (item_width + gutter)), min_columns)`. Fixed grids keep
    /// the preferred item width and are centered; flexible grids split the width evenly.
    pub fn resolve(options: &GridOptions, container_width: u32) -> Result<Self, MasonryError> {
        if container_width == 0 {
            return Err(MasonryError::ColumnCountIndeterminate { container_width });
        }
        let gutter = options.resolved_gutter();
        let preferred = options.item_width.max(1);
        let unit = preferred.saturating_add(gutter) as u64;
        let width = container_width as u64;
        let column_count = ((width / unit) as usize).max(options.min_columns.max(1));

        let layout = if options.flexible {
            let share = (width / column_count as u64) as u32;
            Self {
                column_count,
                item_width: share.saturating_sub(gutter).max(1),
                gutter,
                offset: 0,
            }
        } else {
            let used = unit.saturating_mul(column_count as u64);
            let spare = (width + gutter as u64).saturating_sub(used);
            Self {
                column_count,
                item_width: preferred,
                gutter,
                offset: (spare / 2) as u32,
            }
        };
        mdebug!(
            container_width,
            column_count = layout.column_count,
            item_width = layout.item_width,
            gutter = layout.gutter,
            "ColumnLayout::resolve"
        );
        Ok(layout)
    }

    pub fn unit(&self) -> u32 {
        self.item_width.saturating_add(self.gutter)
    }

    pub fn column_left(&self, column: usize) -> u32 {
        let step = self.unit() as u64 * column as u64;
        (self.offset as u64 + step).min(u32::MAX as u64) as u32
    }
}
