//! Size cache storage and keying.
//!
//! # Components
//!
//! - [`CacheStore`]: thread-safe `CacheKey → CacheEntry` map with a
//!   generation stamp that bulk invalidation bumps
//! - [`KeyResolver`]: maps positions to keys, preferring content identifiers
//! - [`CacheStats`]: lock-free counters, read through [`CacheStatsSnapshot`]
//!
//! ```text
//! rendering thread ──get──┐                ┌──put_if_current── worker
//!                         ▼                ▼
//!                    ┌──────────────────────────┐
//!                    │ RwLock { entries, gen }  │
//!                    └──────────────────────────┘
//!                         ▲
//!          clear() ──invalidate_all (gen += 1)
//! ```

mod key;
mod stats;
mod store;
mod types;

pub use key::KeyResolver;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
pub use types::{CacheEntry, CacheKey};
