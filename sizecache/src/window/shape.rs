//! Collection shape.

use crate::host::HostView;
use crate::item::ItemPosition;

/// Item counts per section, read from the host once per window update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionShape {
    counts: Vec<usize>,
}

impl CollectionShape {
    pub fn new(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    pub fn from_host(host: &dyn HostView) -> Self {
        Self::new(
            (0..host.section_count())
                .map(|section| host.item_count(section))
                .collect(),
        )
    }

    pub fn section_count(&self) -> usize {
        self.counts.len()
    }

    pub fn item_count(&self, section: usize) -> usize {
        self.counts.get(section).copied().unwrap_or(0)
    }

    pub fn total_items(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn contains(&self, position: ItemPosition) -> bool {
        position.index < self.item_count(position.section)
    }

    /// The position after `position`, crossing into later sections and
    /// skipping empty ones.
    pub fn step_forward(&self, position: ItemPosition) -> Option<ItemPosition> {
        if position.index + 1 < self.item_count(position.section) {
            return Some(ItemPosition::new(position.section, position.index + 1));
        }
        (position.section + 1..self.counts.len())
            .find(|&section| self.counts[section] > 0)
            .map(|section| ItemPosition::new(section, 0))
    }

    /// The position before `position`, crossing into earlier sections and
    /// skipping empty ones.
    pub fn step_backward(&self, position: ItemPosition) -> Option<ItemPosition> {
        if position.index > 0 && self.contains(position) {
            return Some(ItemPosition::new(position.section, position.index - 1));
        }
        (0..position.section.min(self.counts.len()))
            .rev()
            .find(|&section| self.counts[section] > 0)
            .map(|section| ItemPosition::new(section, self.counts[section] - 1))
    }
}
