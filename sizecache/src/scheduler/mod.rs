//! Bounded-concurrency size computation.
//!
//! The [`ComputationScheduler`] accepts [`ComputeRequest`]s, keeps at most
//! one unit of work per [`CacheKey`](crate::cache::CacheKey), and runs the
//! highest-priority pending work on the tokio blocking pool while fewer than
//! `max_concurrent` computations are active.
//!
//! ```text
//! submit ──► PendingQueue ──pump──► spawn_blocking ──► SizeComputer
//!   │        (priority, position,                          │
//!   │         submission order)                            ▼
//!   │                                           finish: epoch + ticket +
//!   └── cached / running: no-op                 generation checked, then
//!                                               CacheStore::put_if_current
//! ```
//!
//! Cancellation never interrupts a running computation. A cancelled or
//! superseded computation simply loses ownership of its key, and its result
//! is dropped when it completes.

mod config;
mod core;
mod priority;
mod queue;
mod request;
mod stats;

pub use config::{clamp_max_concurrent, SchedulerConfig};
pub use self::core::{CancelOutcome, ComputationScheduler, SubmitOutcome};
pub use priority::{Priority, PriorityClass};
pub use request::ComputeRequest;
pub use stats::{SchedulerStats, SchedulerStatsSnapshot};
