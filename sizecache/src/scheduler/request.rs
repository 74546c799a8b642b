//! Computation requests.

use std::sync::Arc;

use super::Priority;
use crate::cache::CacheKey;
use crate::host::SizeRequest;
use crate::item::{ContainerFrame, DependencyMode, ItemPosition};

/// One item to measure, with everything captured at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub key: CacheKey,
    pub position: ItemPosition,
    pub content_id: Option<Arc<str>>,
    /// Container bounds when the request was made. Workers measure against
    /// this frame, never a later one.
    pub frame: ContainerFrame,
    pub dependency: DependencyMode,
    pub priority: Priority,
}

impl ComputeRequest {
    /// Creates a request at [`Priority::VISIBLE`]. Content keys carry their id.
    pub fn new(
        key: CacheKey,
        position: ItemPosition,
        frame: ContainerFrame,
        dependency: DependencyMode,
    ) -> Self {
        let content_id = key.content_id();
        Self {
            key,
            position,
            content_id,
            frame,
            dependency,
            priority: Priority::VISIBLE,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builds what the [`SizeComputer`](crate::host::SizeComputer) sees.
    pub fn to_size_request(&self, is_main_thread: bool) -> SizeRequest {
        SizeRequest {
            position: self.position,
            content_id: self.content_id.clone(),
            frame: self.frame,
            is_main_thread,
            dependency: self.dependency,
        }
    }
}
