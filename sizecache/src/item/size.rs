//! Measured item sizes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which container axis an item's size depends on.
///
/// A vertical list measures row height for a known container width, so its
/// sizes depend on `Width`; a horizontal strip is the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyMode {
    /// Size depends on the container width.
    #[default]
    Width,
    /// Size depends on the container height.
    Height,
    /// Size depends on both axes.
    Size,
}

impl DependencyMode {
    /// Returns true if a width change can change the size.
    pub fn depends_on_width(self) -> bool {
        matches!(self, Self::Width | Self::Size)
    }

    /// Returns true if a height change can change the size.
    pub fn depends_on_height(self) -> bool {
        matches!(self, Self::Height | Self::Size)
    }

    /// Config-file spelling of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown dependency mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dependency mode '{0}' (expected width, height or size)")]
pub struct ParseDependencyModeError(pub String);

impl FromStr for DependencyMode {
    type Err = ParseDependencyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            "size" | "both" => Ok(Self::Size),
            other => Err(ParseDependencyModeError(other.to_string())),
        }
    }
}

/// A computed item size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSize {
    pub width: f64,
    pub height: f64,
    /// The dependency mode the size was computed under.
    pub dependency: DependencyMode,
}

impl ItemSize {
    /// Creates a size.
    pub const fn new(width: f64, height: f64, dependency: DependencyMode) -> Self {
        Self {
            width,
            height,
            dependency,
        }
    }

    /// The zero-size sentinel returned for cache-only misses.
    pub const fn zero(dependency: DependencyMode) -> Self {
        Self::new(0.0, 0.0, dependency)
    }

    /// Returns true for the zero-size sentinel.
    pub fn is_zero(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}
