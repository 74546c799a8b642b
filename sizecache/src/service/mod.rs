//! The public facade.
//!
//! [`LayoutCache`] ties the cache store, key resolver, frame tracker,
//! computation scheduler and window tracker together behind one object per
//! scrollable collection. [`LayoutCacheBuilder`] wires it up from a host
//! view, a size computer and a [`LayoutCacheConfig`].
//!
//! ```text
//! position_changed ─► WindowTracker ─► plan ─► ComputationScheduler ─► workers
//!                                                                         │
//! lookup ─────────────────────────────► CacheStore ◄──── put_if_current ──┘
//! ```

mod builder;
mod config;
mod error;
mod facade;

pub use builder::LayoutCacheBuilder;
pub use config::{LayoutCacheConfig, LookupMode};
pub use error::ServiceError;
pub use facade::{LayoutCache, LayoutCacheStats};
