//! Prefetch window tracking.
//!
//! Turns scroll position changes into a target set of keys around the
//! visible range and diffs it against the previous target:
//!
//! ```text
//! position_changed(offset)
//!        │  direction from offset delta on the configured axis
//!        ▼
//! visible range ──expand──► visible + leading margin + trailing margin
//!        │                  (clipped to the collection, fitted to the ceiling)
//!        ▼
//! diff against previous ──► cancel (left the window)
//!                           submit (entered or still inside)
//! ```
//!
//! Keys pinned with `start_caching` live beside the scroll-derived window
//! and are never cancelled by scrolling.

mod config;
mod diff;
mod expand;
mod shape;
mod tracker;
mod types;

pub use config::WindowConfig;
pub use diff::{diff_windows, WindowDiff};
pub use expand::{expand_window, fit_margins};
pub use shape::CollectionShape;
pub use tracker::{PlannedKey, WindowInput, WindowPlan, WindowState, WindowTracker};
pub use types::{ParseScrollAxisError, ScrollAxis, ScrollDirection, ScrollOffset};
