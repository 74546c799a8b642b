//! Item addressing.

use std::fmt;

/// Location of an item in a sectioned collection.
///
/// Positions order lexicographically by `(section, index)`, which is also
/// the order items appear on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ItemPosition {
    /// Section number.
    pub section: usize,
    /// Index within the section.
    pub index: usize,
}

impl ItemPosition {
    /// Creates a position.
    pub const fn new(section: usize, index: usize) -> Self {
        Self { section, index }
    }
}

impl From<(usize, usize)> for ItemPosition {
    fn from((section, index): (usize, usize)) -> Self {
        Self::new(section, index)
    }
}

impl fmt::Display for ItemPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.section, self.index)
    }
}
