//! Value types describing items of a virtualized collection.
//!
//! - [`ItemPosition`]: `(section, index)` address of an item
//! - [`ItemSize`]: a measured size plus the [`DependencyMode`] it was computed for
//! - [`ContainerFrame`]: bounds of the host view, compared by value

mod frame;
mod position;
mod size;

pub use frame::ContainerFrame;
pub use position::ItemPosition;
pub use size::{DependencyMode, ItemSize, ParseDependencyModeError};
