//! Container-bounds tracking.
//!
//! Cached sizes are only valid for the bounds they were measured against.
//! [`FrameTracker`] remembers the last bounds the caller acknowledged and
//! compares them with what the host reports now. It never invalidates the
//! cache on its own: the caller decides whether a change warrants a
//! `clear()` and then calls [`FrameTracker::update_last_frame`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::host::HostView;
use crate::item::{ContainerFrame, DependencyMode};

/// A detected bounds change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameChange {
    pub last: ContainerFrame,
    pub current: ContainerFrame,
}

/// Tracks the last acknowledged container bounds.
pub struct FrameTracker {
    host: Arc<dyn HostView>,
    last: Mutex<ContainerFrame>,
    // Last stale frame reported by `check_stale`, so each change is reported once.
    reported: Mutex<Option<ContainerFrame>>,
}

impl FrameTracker {
    /// Creates a tracker whose last frame is the host's current one.
    pub fn new(host: Arc<dyn HostView>) -> Self {
        let initial = host.frame();
        Self {
            host,
            last: Mutex::new(initial),
            reported: Mutex::new(None),
        }
    }

    /// Last acknowledged bounds.
    pub fn last_frame(&self) -> ContainerFrame {
        *self.last.lock()
    }

    /// Bounds the host reports right now. No side effects.
    pub fn current_frame(&self) -> ContainerFrame {
        self.host.frame()
    }

    /// Acknowledges the current bounds and returns them.
    pub fn update_last_frame(&self) -> ContainerFrame {
        let current = self.host.frame();
        *self.last.lock() = current;
        *self.reported.lock() = None;
        current
    }

    /// Returns true if the current bounds differ from the last acknowledged
    /// ones on an axis `mode` depends on.
    pub fn is_stale(&self, mode: DependencyMode) -> bool {
        self.last_frame().differs_for(&self.current_frame(), mode)
    }

    /// Like [`is_stale`](Self::is_stale) but reports each distinct stale
    /// frame only once.
    pub fn check_stale(&self, mode: DependencyMode) -> Option<FrameChange> {
        let last = self.last_frame();
        let current = self.current_frame();
        if !last.differs_for(&current, mode) {
            return None;
        }

        let mut reported = self.reported.lock();
        if *reported == Some(current) {
            return None;
        }
        *reported = Some(current);
        Some(FrameChange { last, current })
    }
}

impl std::fmt::Debug for FrameTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTracker")
            .field("last", &self.last_frame())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostSnapshot;

    fn tracker() -> (Arc<HostSnapshot>, FrameTracker) {
        let host = Arc::new(HostSnapshot::new(
            ContainerFrame::from_size(375.0, 812.0),
            vec![10],
        ));
        let tracker = FrameTracker::new(host.clone());
        (host, tracker)
    }

    #[test]
    fn test_starts_with_host_frame() {
        let (_, tracker) = tracker();
        assert_eq!(tracker.last_frame(), ContainerFrame::from_size(375.0, 812.0));
        assert!(!tracker.is_stale(DependencyMode::Size));
    }

    #[test]
    fn test_current_frame_does_not_update_last() {
        let (host, tracker) = tracker();
        host.set_frame(ContainerFrame::from_size(812.0, 375.0));

        assert_eq!(tracker.current_frame().width, 812.0);
        assert_eq!(tracker.last_frame().width, 375.0);
        assert!(tracker.is_stale(DependencyMode::Width));
    }

    #[test]
    fn test_staleness_follows_dependency_mode() {
        let (host, tracker) = tracker();
        host.set_frame(ContainerFrame::from_size(375.0, 500.0));

        assert!(!tracker.is_stale(DependencyMode::Width));
        assert!(tracker.is_stale(DependencyMode::Height));
    }

    #[test]
    fn test_update_last_frame_clears_staleness() {
        let (host, tracker) = tracker();
        host.set_frame(ContainerFrame::from_size(400.0, 812.0));

        let updated = tracker.update_last_frame();

        assert_eq!(updated.width, 400.0);
        assert!(!tracker.is_stale(DependencyMode::Width));
    }

    #[test]
    fn test_check_stale_reports_each_change_once() {
        let (host, tracker) = tracker();
        host.set_frame(ContainerFrame::from_size(400.0, 812.0));

        let change = tracker.check_stale(DependencyMode::Width);
        assert_eq!(change.map(|c| c.current.width), Some(400.0));
        assert_eq!(tracker.check_stale(DependencyMode::Width), None);

        host.set_frame(ContainerFrame::from_size(500.0, 812.0));
        assert!(tracker.check_stale(DependencyMode::Width).is_some());
    }
}
