//! Host-side trait definitions.

use std::sync::Arc;

use super::ComputeError;
use crate::item::{ContainerFrame, DependencyMode, ItemPosition, ItemSize};

/// Everything a [`SizeComputer`] is told about one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeRequest {
    /// Position of the item being measured.
    pub position: ItemPosition,
    /// Content identifier, when the item is keyed by content.
    pub content_id: Option<Arc<str>>,
    /// Container bounds captured when the computation was requested.
    pub frame: ContainerFrame,
    /// True when running on the calling (rendering) thread, false on a
    /// background worker. Thread-affine resources must only be touched
    /// when this is true.
    pub is_main_thread: bool,
    /// Dependency mode configured at request time.
    pub dependency: DependencyMode,
}

/// Measures items.
///
/// Installed once on the cache and invoked from any thread. Implementations
/// that read shared model state are responsible for their own
/// synchronization.
///
/// Closures with the matching signature implement this trait:
///
/// ```
/// use sizecache::host::{ComputeError, SizeComputer, SizeRequest};
/// use sizecache::item::ItemSize;
///
/// let computer = |request: &SizeRequest| -> Result<ItemSize, ComputeError> {
///     Ok(ItemSize::new(request.frame.width, 44.0, request.dependency))
/// };
/// let _: &dyn SizeComputer = &computer;
/// ```
pub trait SizeComputer: Send + Sync {
    /// Computes the size of one item.
    fn compute_size(&self, request: &SizeRequest) -> Result<ItemSize, ComputeError>;
}

impl<F> SizeComputer for F
where
    F: Fn(&SizeRequest) -> Result<ItemSize, ComputeError> + Send + Sync,
{
    fn compute_size(&self, request: &SizeRequest) -> Result<ItemSize, ComputeError> {
        self(request)
    }
}

/// Supplies stable content identifiers for positions.
///
/// When an identifier is returned it becomes the cache key, so cached sizes
/// follow the content across reordering and insertion.
pub trait ContentIdProvider: Send + Sync {
    /// Returns the content identifier for `position`, if it has one.
    fn content_id(&self, position: ItemPosition) -> Option<String>;
}

impl<F> ContentIdProvider for F
where
    F: Fn(ItemPosition) -> Option<String> + Send + Sync,
{
    fn content_id(&self, position: ItemPosition) -> Option<String> {
        self(position)
    }
}

/// The scrollable view whose items are being cached.
pub trait HostView: Send + Sync {
    /// Positions currently on screen.
    fn visible_positions(&self) -> Vec<ItemPosition>;

    /// Current container bounds.
    fn frame(&self) -> ContainerFrame;

    /// Number of sections in the collection.
    fn section_count(&self) -> usize;

    /// Number of items in `section` (zero for unknown sections).
    fn item_count(&self, section: usize) -> usize;
}
