//! sizecache - background size pre-computation for virtualized list views
//!
//! Measuring an item in a long list or grid can be expensive, and doing it
//! on the thread that renders the scroll causes dropped frames. This crate
//! keeps a cache of item sizes, computes sizes for a window around the
//! visible range on background workers as the view scrolls, and answers
//! lookups from the cache synchronously.
//!
//! # High-Level API
//!
//! The [`service`] module provides the facade:
//!
//! ```
//! use std::sync::Arc;
//! use sizecache::host::{ComputeError, HostSnapshot, SizeRequest};
//! use sizecache::item::{ContainerFrame, ItemPosition, ItemSize};
//! use sizecache::service::{LayoutCache, LayoutCacheConfig};
//! use sizecache::window::ScrollOffset;
//!
//! let host = Arc::new(HostSnapshot::new(ContainerFrame::from_size(390.0, 844.0), vec![500]));
//! let cache = LayoutCache::builder()
//!     .host(host.clone())
//!     .computer(Arc::new(|request: &SizeRequest| -> Result<ItemSize, ComputeError> {
//!         Ok(ItemSize::new(request.frame.width, 72.0, request.dependency))
//!     }))
//!     .config(LayoutCacheConfig::default().with_auto_prefetch(true))
//!     .build()?;
//!
//! // The host reports what is on screen, then tells the cache it scrolled.
//! host.set_visible((40..52).map(|index| ItemPosition::new(0, index)));
//! cache.position_changed(ScrollOffset::new(0.0, 2880.0));
//!
//! // The rendering path never computes when asked for cached sizes only.
//! let size = cache.lookup(ItemPosition::new(0, 45), None, true);
//! # let _ = size;
//! # Ok::<(), sizecache::service::ServiceError>(())
//! ```
//!
//! # Modules
//!
//! - [`item`]: positions, sizes, container bounds
//! - [`host`]: traits the embedding view implements
//! - [`cache`]: the size store and key resolution
//! - [`frame`]: container-bounds tracking
//! - [`scheduler`]: bounded background computation with cancellation
//! - [`window`]: the scroll-driven prefetch window
//! - [`config`]: defaults and the INI config file
//! - [`log`] / [`logging`]: diagnostics

pub mod cache;
pub mod config;
pub mod frame;
pub mod host;
pub mod item;
pub mod log;
pub mod logging;
pub mod scheduler;
pub mod service;
pub mod window;

/// Version of the sizecache library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
