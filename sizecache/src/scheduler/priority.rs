//! Work priorities.

use std::fmt;

/// Coarse priority band. Earlier variants run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityClass {
    /// Requested explicitly by the caller (`start_caching`, offloaded lookups).
    Explicit,
    /// Currently on screen.
    Visible,
    /// Inside a prefetch margin.
    Prefetch,
}

/// Ordering key for pending work. Smaller values run first.
///
/// Within a class, `distance` orders by how far the item is from the
/// visible range. Leading-margin steps take odd distances and
/// trailing-margin steps even ones, so the two margins interleave with the
/// leading side slightly ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority {
    pub class: PriorityClass,
    pub distance: u32,
}

impl Priority {
    pub const EXPLICIT: Priority = Priority {
        class: PriorityClass::Explicit,
        distance: 0,
    };

    pub const VISIBLE: Priority = Priority {
        class: PriorityClass::Visible,
        distance: 0,
    };

    pub const fn prefetch(distance: u32) -> Self {
        Self {
            class: PriorityClass::Prefetch,
            distance,
        }
    }

    /// Priority of the item `step` positions ahead of the visible range (1-based).
    pub fn leading(step: usize) -> Self {
        Self::prefetch(step_distance(step).saturating_mul(2).saturating_sub(1))
    }

    /// Priority of the item `step` positions behind the visible range (1-based).
    pub fn trailing(step: usize) -> Self {
        Self::prefetch(step_distance(step).saturating_mul(2))
    }
}

fn step_distance(step: usize) -> u32 {
    u32::try_from(step.max(1)).unwrap_or(u32::MAX)
}

impl Default for Priority {
    fn default() -> Self {
        Self::VISIBLE
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            PriorityClass::Explicit => f.write_str("explicit"),
            PriorityClass::Visible => f.write_str("visible"),
            PriorityClass::Prefetch => write!(f, "prefetch/{}", self.distance),
        }
    }
}
