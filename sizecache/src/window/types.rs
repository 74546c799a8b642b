//! Scroll geometry.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Content offset reported with a position change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component along `axis`.
    pub fn along(&self, axis: ScrollAxis) -> f64 {
        match axis {
            ScrollAxis::Vertical => self.y,
            ScrollAxis::Horizontal => self.x,
        }
    }
}

/// Axis whose offset drives the scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollAxis {
    #[default]
    Vertical,
    Horizontal,
}

impl ScrollAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

impl fmt::Display for ScrollAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scroll axis '{0}' (expected vertical or horizontal)")]
pub struct ParseScrollAxisError(pub String);

impl FromStr for ScrollAxis {
    type Err = ParseScrollAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" | "y" => Ok(Self::Vertical),
            "horizontal" | "x" => Ok(Self::Horizontal),
            other => Err(ParseScrollAxisError(other.to_string())),
        }
    }
}

/// Direction of travel through the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollDirection {
    /// Towards higher positions.
    #[default]
    Forward,
    /// Towards lower positions.
    Backward,
}

impl ScrollDirection {
    /// Direction implied by moving from `previous` to `current` on `axis`.
    ///
    /// No movement keeps `fallback`.
    pub fn between(
        previous: ScrollOffset,
        current: ScrollOffset,
        axis: ScrollAxis,
        fallback: ScrollDirection,
    ) -> Self {
        let delta = current.along(axis) - previous.along(axis);
        if delta > 0.0 {
            Self::Forward
        } else if delta < 0.0 {
            Self::Backward
        } else {
            fallback
        }
    }
}
