//! Core cache types.

use std::fmt;
use std::sync::Arc;

use crate::item::{ItemPosition, ItemSize};

/// Key identifying one cached size.
///
/// Within one cache generation a key maps to at most one size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Keyed by position; invalidated by reordering.
    Position(ItemPosition),
    /// Keyed by a caller-supplied content identifier; stable across reordering.
    Content(Arc<str>),
}

impl CacheKey {
    /// Creates a content key.
    pub fn content(id: impl Into<Arc<str>>) -> Self {
        Self::Content(id.into())
    }

    /// Returns the position for position keys.
    pub fn as_position(&self) -> Option<ItemPosition> {
        match self {
            Self::Position(position) => Some(*position),
            Self::Content(_) => None,
        }
    }

    /// Returns the content identifier for content keys.
    pub fn content_id(&self) -> Option<Arc<str>> {
        match self {
            Self::Position(_) => None,
            Self::Content(id) => Some(Arc::clone(id)),
        }
    }
}

impl From<ItemPosition> for CacheKey {
    fn from(position: ItemPosition) -> Self {
        Self::Position(position)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "pos({})", position),
            Self::Content(id) => write!(f, "id({})", id),
        }
    }
}

/// A stored size with the generation it was written in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub size: ItemSize,
    pub generation: u64,
}
