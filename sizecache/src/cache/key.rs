//! Position to cache-key resolution.

use std::fmt;
use std::sync::Arc;

use super::CacheKey;
use crate::host::ContentIdProvider;
use crate::item::ItemPosition;

/// Derives cache keys from item positions.
///
/// Resolution order: an explicit content id passed by the caller, then the
/// installed [`ContentIdProvider`], then the position itself. The same
/// inputs always resolve to the same key.
#[derive(Clone, Default)]
pub struct KeyResolver {
    provider: Option<Arc<dyn ContentIdProvider>>,
}

impl KeyResolver {
    /// Creates a resolver that keys by position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver that asks `provider` for content ids.
    pub fn with_provider(provider: Arc<dyn ContentIdProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Installs or removes the content-id provider.
    pub fn set_provider(&mut self, provider: Option<Arc<dyn ContentIdProvider>>) {
        self.provider = provider;
    }

    /// Returns true if a content-id provider is installed.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolves the key for `position`, using `content_id` verbatim when given.
    pub fn resolve(&self, position: ItemPosition, content_id: Option<&str>) -> CacheKey {
        match content_id {
            Some(id) => CacheKey::content(id),
            None => self.resolve_position(position),
        }
    }

    /// Resolves the key for `position` through the provider, if any.
    pub fn resolve_position(&self, position: ItemPosition) -> CacheKey {
        self.provider
            .as_ref()
            .and_then(|provider| provider.content_id(position))
            .map(CacheKey::content)
            .unwrap_or(CacheKey::Position(position))
    }
}

impl fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyResolver")
            .field("has_provider", &self.has_provider())
            .finish()
    }
}
