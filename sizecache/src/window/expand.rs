//! Window expansion around the visible range.

use super::{CollectionShape, ScrollDirection};
use crate::item::ItemPosition;
use crate::scheduler::Priority;

/// Trims margins so that `visible + leading + trailing <= ceiling`.
///
/// The visible range is never trimmed. The cut is split evenly between the
/// two margins; when one margin runs out, the other absorbs the remainder.
/// Returns the fitted `(leading, trailing)`.
pub fn fit_margins(
    visible: usize,
    leading: usize,
    trailing: usize,
    ceiling: usize,
) -> (usize, usize) {
    let excess = (visible + leading + trailing).saturating_sub(ceiling);
    if excess == 0 {
        return (leading, trailing);
    }

    let trail_cut = excess.div_ceil(2).min(trailing);
    let lead_cut = (excess - trail_cut).min(leading);
    let trail_cut = (excess - lead_cut).min(trailing);
    (leading - lead_cut, trailing - trail_cut)
}

/// Computes the target window: visible positions plus margins, each with
/// the priority it should be computed at.
///
/// Positions outside the collection are ignored. Margins stop at the
/// collection's bounds rather than spilling over to the other side.
/// Visible entries come first, then the leading and trailing margins in
/// increasing distance.
pub fn expand_window(
    shape: &CollectionShape,
    visible: &[ItemPosition],
    direction: ScrollDirection,
    leading_margin: usize,
    trailing_margin: usize,
    ceiling: usize,
) -> Vec<(ItemPosition, Priority)> {
    let mut visible: Vec<ItemPosition> = visible
        .iter()
        .copied()
        .filter(|position| shape.contains(*position))
        .collect();
    visible.sort_unstable();
    visible.dedup();

    let (Some(&first), Some(&last)) = (visible.first(), visible.last()) else {
        return Vec::new();
    };

    let (ahead_limit, behind_limit) = match direction {
        ScrollDirection::Forward => (leading_margin, trailing_margin),
        ScrollDirection::Backward => (trailing_margin, leading_margin),
    };
    let after = walk(last, ahead_limit, |p| shape.step_forward(p));
    let before = walk(first, behind_limit, |p| shape.step_backward(p));

    let (mut leading, mut trailing) = match direction {
        ScrollDirection::Forward => (after, before),
        ScrollDirection::Backward => (before, after),
    };
    let (lead_len, trail_len) = fit_margins(visible.len(), leading.len(), trailing.len(), ceiling);
    leading.truncate(lead_len);
    trailing.truncate(trail_len);

    let mut window = Vec::with_capacity(visible.len() + leading.len() + trailing.len());
    window.extend(visible.into_iter().map(|position| (position, Priority::VISIBLE)));
    window.extend(
        leading
            .into_iter()
            .enumerate()
            .map(|(step, position)| (position, Priority::leading(step + 1))),
    );
    window.extend(
        trailing
            .into_iter()
            .enumerate()
            .map(|(step, position)| (position, Priority::trailing(step + 1))),
    );
    window
}

fn walk(
    from: ItemPosition,
    limit: usize,
    step: impl Fn(ItemPosition) -> Option<ItemPosition>,
) -> Vec<ItemPosition> {
    let mut positions = Vec::with_capacity(limit);
    let mut current = from;
    while positions.len() < limit {
        match step(current) {
            Some(next) => {
                positions.push(next);
                current = next;
            }
            None => break,
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PriorityClass;

    fn row(index: usize) -> ItemPosition {
        ItemPosition::new(0, index)
    }

    fn indices(window: &[(ItemPosition, Priority)], class: PriorityClass) -> Vec<usize> {
        window
            .iter()
            .filter(|(_, priority)| priority.class == class)
            .map(|(position, _)| position.index)
            .collect()
    }

    #[test]
    fn test_fit_margins_no_excess() {
        assert_eq!(fit_margins(10, 20, 5, 40), (20, 5));
    }

    #[test]
    fn test_fit_margins_splits_cut_evenly() {
        // 10 + 20 + 5 = 35, ceiling 31: cut 4, two from each side.
        assert_eq!(fit_margins(10, 20, 5, 31), (18, 3));
    }

    #[test]
    fn test_fit_margins_remainder_from_side_with_items() {
        // Cut 15: trailing can only give 5, leading gives the other 10.
        assert_eq!(fit_margins(10, 20, 5, 20), (10, 0));
    }

    #[test]
    fn test_fit_margins_never_cuts_visible() {
        assert_eq!(fit_margins(50, 20, 5, 40), (0, 0));
    }

    #[test]
    fn test_forward_window() {
        let shape = CollectionShape::new(vec![100]);
        let visible: Vec<_> = (10..14).map(row).collect();

        let window = expand_window(&shape, &visible, ScrollDirection::Forward, 3, 2, 40);

        assert_eq!(indices(&window, PriorityClass::Visible), vec![10, 11, 12, 13]);
        let margins: Vec<_> = window
            .iter()
            .filter(|(_, p)| p.class == PriorityClass::Prefetch)
            .map(|(position, p)| (position.index, p.distance))
            .collect();
        assert_eq!(margins, vec![(14, 1), (15, 3), (16, 5), (9, 2), (8, 4)]);
    }

    #[test]
    fn test_backward_window_swaps_margins() {
        let shape = CollectionShape::new(vec![100]);
        let visible: Vec<_> = (50..52).map(row).collect();

        let window = expand_window(&shape, &visible, ScrollDirection::Backward, 3, 1, 40);
        let mut prefetch = indices(&window, PriorityClass::Prefetch);
        prefetch.sort_unstable();

        assert_eq!(prefetch, vec![47, 48, 49, 52]);
    }

    #[test]
    fn test_margins_clip_at_collection_bounds() {
        let shape = CollectionShape::new(vec![30]);
        let visible: Vec<_> = (0..5).map(row).collect();

        let window = expand_window(&shape, &visible, ScrollDirection::Forward, 20, 5, 40);

        assert_eq!(window.len(), 25);
        assert!(window.iter().all(|(position, _)| position.index < 25));
    }

    #[test]
    fn test_margins_cross_sections() {
        let shape = CollectionShape::new(vec![3, 0, 4]);
        let window = expand_window(
            &shape,
            &[ItemPosition::new(0, 2)],
            ScrollDirection::Forward,
            2,
            1,
            40,
        );
        let positions: Vec<_> = window.iter().map(|(position, _)| *position).collect();
        assert_eq!(
            positions,
            vec![
                ItemPosition::new(0, 2),
                ItemPosition::new(2, 0),
                ItemPosition::new(2, 1),
                ItemPosition::new(0, 1),
            ]
        );
    }

    #[test]
    fn test_window_respects_ceiling() {
        let shape = CollectionShape::new(vec![1000]);
        let visible: Vec<_> = (100..110).map(row).collect();

        let window = expand_window(&shape, &visible, ScrollDirection::Forward, 20, 5, 20);

        assert_eq!(window.len(), 20);
        assert_eq!(indices(&window, PriorityClass::Visible).len(), 10);
    }

    #[test]
    fn test_empty_or_out_of_range_visible() {
        let shape = CollectionShape::new(vec![5]);
        assert!(expand_window(&shape, &[], ScrollDirection::Forward, 5, 5, 40).is_empty());
        assert!(expand_window(&shape, &[row(9)], ScrollDirection::Forward, 5, 5, 40).is_empty());
    }
}
