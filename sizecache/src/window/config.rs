//! Window configuration.

use super::ScrollAxis;
use crate::config::defaults::{DEFAULT_LEADING_MARGIN, DEFAULT_TRAILING_MARGIN};

/// Shape of the prefetch window around the visible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Items prefetched ahead of the visible range, in the travel direction.
    pub leading_margin: usize,
    /// Items kept warm behind the visible range.
    pub trailing_margin: usize,
    /// Axis whose offset decides the travel direction.
    pub axis: ScrollAxis,
}

impl WindowConfig {
    pub fn with_leading_margin(mut self, margin: usize) -> Self {
        self.leading_margin = margin;
        self
    }

    pub fn with_trailing_margin(mut self, margin: usize) -> Self {
        self.trailing_margin = margin;
        self
    }

    pub fn with_axis(mut self, axis: ScrollAxis) -> Self {
        self.axis = axis;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            leading_margin: DEFAULT_LEADING_MARGIN,
            trailing_margin: DEFAULT_TRAILING_MARGIN,
            axis: ScrollAxis::Vertical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WindowConfig::default();
        assert_eq!(config.leading_margin, 20);
        assert_eq!(config.trailing_margin, 5);
        assert_eq!(config.axis, ScrollAxis::Vertical);
    }

    #[test]
    fn test_builders() {
        let config = WindowConfig::default()
            .with_leading_margin(8)
            .with_trailing_margin(0)
            .with_axis(ScrollAxis::Horizontal);
        assert_eq!(config.leading_margin, 8);
        assert_eq!(config.trailing_margin, 0);
        assert_eq!(config.axis, ScrollAxis::Horizontal);
    }
}
