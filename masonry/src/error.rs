use crate::ItemId;

/// Errors reported by the layout engine.
///
/// Only [`MasonryError::ColumnCountIndeterminate`] is fatal to the operation that raised it; the
/// other kinds leave the grid untouched and are expected to be retried or dropped by the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MasonryError {
    /// The off-screen measurement surface could not be allocated.
    #[error("off-screen measurement surface is unavailable")]
    MeasurementUnavailable,
    /// A targeted insertion referenced a column/index that does not exist (anymore).
    #[error("no insertion slot at column {column}, index {index}")]
    InvalidInsertionTarget { column: usize, index: usize },
    /// The container width could not be measured, so no column layout can be derived.
    #[error("column count cannot be determined for container width {container_width}")]
    ColumnCountIndeterminate { container_width: u32 },
    /// The referenced item is not placed in the grid.
    #[error("no placed item with id {0}")]
    UnknownItem(ItemId),
}

impl MasonryError {
    /// Returns `true` for errors the caller must handle (retry after attaching a container).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ColumnCountIndeterminate { .. })
    }
}
