//! Container bounds.

use super::DependencyMode;

/// Bounds of the host view, as last reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerFrame {
    /// Creates a frame.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a frame at the origin.
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Returns true if `other` differs on an axis that `mode` depends on.
    ///
    /// Origin changes never count.
    pub fn differs_for(&self, other: &ContainerFrame, mode: DependencyMode) -> bool {
        (mode.depends_on_width() && self.width != other.width)
            || (mode.depends_on_height() && self.height != other.height)
    }
}
