//! Window state machine.

use std::collections::BTreeMap;

use super::{diff_windows, expand_window, CollectionShape, ScrollDirection, ScrollOffset, WindowConfig};
use crate::cache::{CacheKey, KeyResolver};
use crate::host::HostView;
use crate::item::ItemPosition;
use crate::scheduler::Priority;

/// Whether scroll events drive prefetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Idle,
    Active,
}

/// A window member: where it was seen and how urgently it is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedKey {
    pub position: ItemPosition,
    pub priority: Priority,
}

/// Host-derived inputs for one window update.
#[derive(Debug, Clone, Default)]
pub struct WindowInput {
    pub visible: Vec<ItemPosition>,
    pub shape: CollectionShape,
    /// Largest window (visible plus margins) the scheduler should be given.
    pub ceiling: usize,
}

impl WindowInput {
    pub fn new(visible: Vec<ItemPosition>, shape: CollectionShape, ceiling: usize) -> Self {
        Self {
            visible,
            shape,
            ceiling,
        }
    }

    /// Reads the visible range and collection shape from `host`.
    pub fn from_host(host: &dyn HostView, ceiling: usize) -> Self {
        Self::new(
            host.visible_positions(),
            CollectionShape::from_host(host),
            ceiling,
        )
    }
}

/// Scheduler actions produced by one window update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowPlan {
    pub to_cancel: Vec<CacheKey>,
    /// Keys to submit (new and retained), with position and priority.
    pub to_submit: Vec<(CacheKey, PlannedKey)>,
}

impl WindowPlan {
    pub fn is_empty(&self) -> bool {
        self.to_cancel.is_empty() && self.to_submit.is_empty()
    }
}

/// Tracks the prefetch window across position changes.
///
/// The tracker only plans: it returns a [`WindowPlan`] and the caller
/// applies it to the scheduler. Updates must be applied in the order they
/// were planned, which the facade guarantees by holding one lock around
/// both steps.
#[derive(Debug, Default)]
pub struct WindowTracker {
    config: WindowConfig,
    state: WindowState,
    direction: ScrollDirection,
    last_offset: Option<ScrollOffset>,
    /// Scroll-derived members.
    auto: BTreeMap<CacheKey, PlannedKey>,
    /// Members added by `pin`; untouched by scrolling.
    pinned: BTreeMap<CacheKey, ItemPosition>,
}

impl WindowTracker {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    /// Replaces the configuration. Applies from the next update.
    pub fn set_config(&mut self, config: WindowConfig) {
        self.config = config;
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == WindowState::Active
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn last_offset(&self) -> Option<ScrollOffset> {
        self.last_offset
    }

    /// Returns true if `key` is in the scroll-derived or pinned window.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.auto.contains_key(key) || self.pinned.contains_key(key)
    }

    pub fn is_pinned(&self, key: &CacheKey) -> bool {
        self.pinned.contains_key(key)
    }

    pub fn auto_keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.auto.keys()
    }

    pub fn pinned_keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.pinned.keys()
    }

    /// Members of the combined window.
    pub fn len(&self) -> usize {
        self.auto.len() + self.pinned.keys().filter(|key| !self.auto.contains_key(*key)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.auto.is_empty() && self.pinned.is_empty()
    }

    /// `Idle -> Active`, followed by an immediate update.
    pub fn activate(&mut self, input: &WindowInput, resolver: &KeyResolver) -> WindowPlan {
        self.state = WindowState::Active;
        self.recompute(input, resolver)
    }

    /// `Active -> Idle`. Cancels the scroll-derived members that are not
    /// also pinned.
    pub fn deactivate(&mut self) -> WindowPlan {
        self.state = WindowState::Idle;
        let auto = std::mem::take(&mut self.auto);
        WindowPlan {
            to_cancel: auto
                .into_keys()
                .filter(|key| !self.pinned.contains_key(key))
                .collect(),
            to_submit: Vec::new(),
        }
    }

    /// Handles a position change. While idle only the direction is tracked.
    pub fn on_position_changed(
        &mut self,
        offset: ScrollOffset,
        input: &WindowInput,
        resolver: &KeyResolver,
    ) -> WindowPlan {
        if let Some(previous) = self.last_offset {
            self.direction =
                ScrollDirection::between(previous, offset, self.config.axis, self.direction);
        }
        self.last_offset = Some(offset);
        self.recompute(input, resolver)
    }

    /// Recomputes the window for the current direction.
    ///
    /// Members that stay in the window are submitted again; the scheduler
    /// ignores them unless their size was cleared or their computation
    /// failed. Pinned members are always submitted.
    pub fn recompute(&mut self, input: &WindowInput, resolver: &KeyResolver) -> WindowPlan {
        let mut plan = WindowPlan::default();

        if self.is_active() {
            let target = self.target(input, resolver);
            let diff = diff_windows(&self.auto, &target);

            plan.to_cancel = diff
                .to_cancel
                .into_iter()
                .filter(|key| !self.pinned.contains_key(key))
                .collect();
            plan.to_submit = diff
                .to_start
                .iter()
                .chain(diff.retained.iter())
                .filter(|key| !self.pinned.contains_key(*key))
                .filter_map(|key| target.get(key).map(|planned| (key.clone(), *planned)))
                .collect();
            self.auto = target;
        }

        plan.to_submit.extend(self.pinned_submissions());
        plan
    }

    /// Adds explicit members at [`Priority::EXPLICIT`].
    pub fn pin(&mut self, positions: &[ItemPosition], resolver: &KeyResolver) -> WindowPlan {
        let mut plan = WindowPlan::default();
        for &position in positions {
            let key = resolver.resolve_position(position);
            self.pinned.insert(key.clone(), position);
            plan.to_submit.push((
                key,
                PlannedKey {
                    position,
                    priority: Priority::EXPLICIT,
                },
            ));
        }
        plan
    }

    /// Removes explicit members and cancels their work, even when the
    /// scroll-derived window also wants them. A later update re-requests
    /// those.
    pub fn unpin(&mut self, positions: &[ItemPosition], resolver: &KeyResolver) -> WindowPlan {
        let mut plan = WindowPlan::default();
        for &position in positions {
            let key = resolver.resolve_position(position);
            let pinned = self.pinned.remove(&key).is_some();
            if pinned || self.auto.contains_key(&key) {
                plan.to_cancel.push(key);
            }
        }
        plan
    }

    /// Empties both windows. Returns how many members were dropped.
    pub fn clear_all(&mut self) -> usize {
        let dropped = self.len();
        self.auto.clear();
        self.pinned.clear();
        dropped
    }

    fn target(&self, input: &WindowInput, resolver: &KeyResolver) -> BTreeMap<CacheKey, PlannedKey> {
        let mut target = BTreeMap::new();
        let window = expand_window(
            &input.shape,
            &input.visible,
            self.direction,
            self.config.leading_margin,
            self.config.trailing_margin,
            input.ceiling,
        );

        for (position, priority) in window {
            let planned = PlannedKey { position, priority };
            // Two positions may share a content id; keep the more urgent one.
            target
                .entry(resolver.resolve_position(position))
                .and_modify(|existing: &mut PlannedKey| {
                    if planned.priority < existing.priority {
                        *existing = planned;
                    }
                })
                .or_insert(planned);
        }
        target
    }

    fn pinned_submissions(&self) -> impl Iterator<Item = (CacheKey, PlannedKey)> + '_ {
        self.pinned.iter().map(|(key, position)| {
            (
                key.clone(),
                PlannedKey {
                    position: *position,
                    priority: Priority::EXPLICIT,
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn row(index: usize) -> ItemPosition {
        ItemPosition::new(0, index)
    }

    fn key(index: usize) -> CacheKey {
        CacheKey::from(row(index))
    }

    fn input(visible: std::ops::Range<usize>) -> WindowInput {
        WindowInput::new(visible.map(row).collect(), CollectionShape::new(vec![200]), 40)
    }

    fn tracker(leading: usize, trailing: usize) -> WindowTracker {
        WindowTracker::new(
            WindowConfig::default()
                .with_leading_margin(leading)
                .with_trailing_margin(trailing),
        )
    }

    fn submitted(plan: &WindowPlan) -> BTreeSet<usize> {
        plan.to_submit
            .iter()
            .map(|(_, planned)| planned.position.index)
            .collect()
    }

    fn cancelled(plan: &WindowPlan) -> BTreeSet<usize> {
        plan.to_cancel
            .iter()
            .filter_map(|key| key.as_position())
            .map(|position| position.index)
            .collect()
    }

    #[test]
    fn test_idle_tracker_plans_nothing() {
        let mut tracker = tracker(2, 1);
        let resolver = KeyResolver::new();

        let plan = tracker.on_position_changed(ScrollOffset::new(0.0, 10.0), &input(10..12), &resolver);

        assert!(plan.is_empty());
        assert_eq!(tracker.state(), WindowState::Idle);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_activate_plans_visible_and_margins() {
        let mut tracker = tracker(2, 1);
        let plan = tracker.activate(&input(10..12), &KeyResolver::new());

        assert_eq!(submitted(&plan), BTreeSet::from([9, 10, 11, 12, 13]));
        assert!(plan.to_cancel.is_empty());
        assert_eq!(tracker.len(), 5);
    }

    #[test]
    fn test_scroll_cancels_left_keys_and_resubmits_retained() {
        let mut tracker = tracker(2, 1);
        let resolver = KeyResolver::new();
        tracker.on_position_changed(ScrollOffset::new(0.0, 0.0), &input(10..12), &resolver);
        tracker.activate(&input(10..12), &resolver);

        // Window 9..=13 moves to 12..=16.
        let plan = tracker.on_position_changed(ScrollOffset::new(0.0, 120.0), &input(13..15), &resolver);

        assert_eq!(cancelled(&plan), BTreeSet::from([9, 10, 11]));
        assert_eq!(submitted(&plan), BTreeSet::from([12, 13, 14, 15, 16]));
        assert_eq!(tracker.direction(), ScrollDirection::Forward);
    }

    #[test]
    fn test_reversing_direction_moves_leading_margin() {
        let mut tracker = tracker(3, 1);
        let resolver = KeyResolver::new();
        tracker.on_position_changed(ScrollOffset::new(0.0, 500.0), &input(50..52), &resolver);
        tracker.activate(&input(50..52), &resolver);

        let plan = tracker.on_position_changed(ScrollOffset::new(0.0, 480.0), &input(50..52), &resolver);

        assert_eq!(tracker.direction(), ScrollDirection::Backward);
        assert_eq!(cancelled(&plan), BTreeSet::from([53, 54]));
        assert_eq!(submitted(&plan), BTreeSet::from([47, 48, 49, 50, 51, 52]));
        let leading: Vec<_> = plan
            .to_submit
            .iter()
            .filter(|(_, planned)| planned.priority == Priority::leading(1))
            .map(|(_, planned)| planned.position.index)
            .collect();
        assert_eq!(leading, vec![49]);
    }

    #[test]
    fn test_pinned_keys_survive_scrolling_and_deactivation() {
        let mut tracker = tracker(1, 0);
        let resolver = KeyResolver::new();
        tracker.activate(&input(0..2), &resolver);

        let plan = tracker.pin(&[row(150)], &resolver);
        assert_eq!(plan.to_submit[0].1.priority, Priority::EXPLICIT);

        let plan = tracker.on_position_changed(ScrollOffset::new(0.0, 900.0), &input(80..82), &resolver);
        assert!(!cancelled(&plan).contains(&150));
        assert!(submitted(&plan).contains(&150));

        let plan = tracker.deactivate();
        assert_eq!(cancelled(&plan), BTreeSet::from([80, 81, 82]));
        assert!(tracker.is_pinned(&key(150)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_idle_recompute_resubmits_pinned_only() {
        let mut tracker = tracker(5, 5);
        let resolver = KeyResolver::new();
        tracker.pin(&[row(3), row(4)], &resolver);

        let plan = tracker.recompute(&input(0..10), &resolver);

        assert_eq!(submitted(&plan), BTreeSet::from([3, 4]));
    }

    #[test]
    fn test_unpin_cancels_even_when_auto_targets_key() {
        let mut tracker = tracker(2, 0);
        let resolver = KeyResolver::new();
        tracker.activate(&input(0..2), &resolver);
        tracker.pin(&[row(1)], &resolver);

        let plan = tracker.unpin(&[row(1), row(99)], &resolver);

        assert_eq!(plan.to_cancel, vec![key(1)]);
        assert!(!tracker.is_pinned(&key(1)));
        // Still scroll-targeted, so the next update asks for it again.
        let plan = tracker.recompute(&input(0..2), &resolver);
        assert!(submitted(&plan).contains(&1));
    }

    #[test]
    fn test_shared_content_id_keeps_most_urgent_position() {
        let mut tracker = tracker(2, 0);
        let resolver = KeyResolver::with_provider(Arc::new(|position: ItemPosition| {
            (position.index % 2 == 0).then(|| "even".to_string())
        }));

        let plan = tracker.activate(&input(10..11), &resolver);

        let even: Vec<_> = plan
            .to_submit
            .iter()
            .filter(|(key, _)| *key == CacheKey::content("even"))
            .collect();
        assert_eq!(even.len(), 1);
        assert_eq!(even[0].1.position, row(10));
        assert_eq!(even[0].1.priority, Priority::VISIBLE);
    }

    #[test]
    fn test_window_respects_ceiling() {
        let mut tracker = tracker(20, 5);
        let input = WindowInput::new((100..110).map(row).collect(), CollectionShape::new(vec![1000]), 20);

        let plan = tracker.activate(&input, &KeyResolver::new());

        assert_eq!(plan.to_submit.len(), 20);
    }

    #[test]
    fn test_clear_all_empties_both_windows() {
        let mut tracker = tracker(2, 2);
        let resolver = KeyResolver::new();
        tracker.activate(&input(10..12), &resolver);
        tracker.pin(&[row(100)], &resolver);

        assert_eq!(tracker.clear_all(), 7);
        assert!(tracker.is_empty());
    }
}
