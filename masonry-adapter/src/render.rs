use alloc::sync::Arc;
use alloc::vec::Vec;

use masonry::{GridItem, ItemId, OrderKey};

/// What the render surface receives for one placed item.
#[derive(Debug)]
pub struct RenderedItem<'a, T> {
    pub id: ItemId,
    pub key: &'a OrderKey,
    pub data: &'a Arc<T>,
    pub column: usize,
    /// Translation offset inside the grid.
    pub left: u32,
    pub top: u64,
    pub width: u32,
    pub height: u32,
    /// Inside the buffered viewport window. Hidden items may skip expensive presentation.
    pub visible: bool,
    pub appended: bool,
}

impl<'a, T> RenderedItem<'a, T> {
    pub(crate) fn new(item: &'a GridItem<T>, visible: bool) -> Self {
        Self {
            id: item.id,
            key: &item.key,
            data: &item.data,
            column: item.column,
            left: item.left,
            top: item.top,
            width: item.width,
            height: item.height,
            visible,
            appended: item.appended,
        }
    }

    pub fn translation(&self) -> (u32, u64) {
        (self.left, self.top)
    }
}

pub(crate) struct RelatedRequest<T> {
    pub(crate) source: ItemId,
    pub(crate) items: Vec<Arc<T>>,
}

/// Lets rendered content ask for related items to be inserted next to it.
///
/// Requests are queued and applied on the next tick, never during the render pass.
pub struct RelatedHook<'q, T> {
    source: ItemId,
    queue: &'q mut Vec<RelatedRequest<T>>,
}

impl<'q, T> RelatedHook<'q, T> {
    pub(crate) fn new(source: ItemId, queue: &'q mut Vec<RelatedRequest<T>>) -> Self {
        Self { source, queue }
    }

    pub fn source(&self) -> ItemId {
        self.source
    }

    pub fn insert_related(&mut self, items: Vec<Arc<T>>) {
        if items.is_empty() {
            return;
        }
        self.queue.push(RelatedRequest {
            source: self.source,
            items,
        });
    }
}

/// Render capability: turns one placed item into host output.
pub trait Renderer<T> {
    type Output;

    fn render(
        &mut self,
        item: RenderedItem<'_, T>,
        related: &mut RelatedHook<'_, T>,
    ) -> Self::Output;
}
