//! Snapshot-backed host view.

use parking_lot::RwLock;

use super::HostView;
use crate::item::{ContainerFrame, ItemPosition};

/// A [`HostView`] fed by snapshots pushed from the UI thread.
///
/// # Example
///
/// ```
/// use sizecache::host::{HostSnapshot, HostView};
/// use sizecache::item::{ContainerFrame, ItemPosition};
///
/// let host = HostSnapshot::new(ContainerFrame::from_size(375.0, 812.0), vec![100]);
/// host.set_visible((0..12).map(|i| ItemPosition::new(0, i)));
///
/// assert_eq!(host.visible_positions().len(), 12);
/// assert_eq!(host.item_count(0), 100);
/// ```
#[derive(Debug, Default)]
pub struct HostSnapshot {
    inner: RwLock<SnapshotState>,
}

#[derive(Debug, Default)]
struct SnapshotState {
    visible: Vec<ItemPosition>,
    frame: ContainerFrame,
    item_counts: Vec<usize>,
}

impl HostSnapshot {
    /// Creates a snapshot with the given bounds and per-section item counts.
    pub fn new(frame: ContainerFrame, item_counts: Vec<usize>) -> Self {
        Self {
            inner: RwLock::new(SnapshotState {
                visible: Vec::new(),
                frame,
                item_counts,
            }),
        }
    }

    /// Replaces the visible positions.
    pub fn set_visible(&self, visible: impl IntoIterator<Item = ItemPosition>) {
        self.inner.write().visible = visible.into_iter().collect();
    }

    /// Replaces the container bounds.
    pub fn set_frame(&self, frame: ContainerFrame) {
        self.inner.write().frame = frame;
    }

    /// Replaces the per-section item counts.
    pub fn set_item_counts(&self, item_counts: Vec<usize>) {
        self.inner.write().item_counts = item_counts;
    }
}

impl HostView for HostSnapshot {
    fn visible_positions(&self) -> Vec<ItemPosition> {
        self.inner.read().visible.clone()
    }

    fn frame(&self) -> ContainerFrame {
        self.inner.read().frame
    }

    fn section_count(&self) -> usize {
        self.inner.read().item_counts.len()
    }

    fn item_count(&self, section: usize) -> usize {
        self.inner
            .read()
            .item_counts
            .get(section)
            .copied()
            .unwrap_or(0)
    }
}
