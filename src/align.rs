//! Line alignment: turning sparse hunks into dense, renderable row pairs.
//!
//! The diff service reports only the rows it considers interesting: changed
//! lines, plus the anchors needed to pair the two file versions up. A
//! side-by-side view needs the opposite, a dense sequence of rows with no
//! numeric gaps, where every row knows which line (if any) appears on each
//! side. This module reconstructs that sequence.
//!
//! ## The offset
//!
//! Everything here is driven by one quantity: the running difference
//! `right - left` between the two sides' line numbers at a given point in
//! the walk. A deleted line shifts all following right-side lines down by
//! one relative to the left, an added line shifts them up by one, and an
//! anchor row pins the difference to its own pair of numbers. The
//! [`Offset`] type implements this once; [`pair_lines`], [`expand_lines`]
//! and [`merge_hunks`] all lean on it so the three stay consistent.
//!
//! ## Operations
//!
//! - [`sort_hunks`] orders hunks by their first explicit line number.
//! - [`pair_lines`] reconstructs the dense row sequence for one hunk,
//!   synthesizing filler rows for every omitted line.
//! - [`expand_lines`] extends a row sequence with leading and trailing
//!   context, clamped to the file bounds.
//! - [`merge_hunks`] folds hunks together when their context windows would
//!   meet or overlap.

use crate::hunk::{Hunk, HunkRow, LineRef};

/// One rendered row: a 0-indexed line number for each side, `None` where a
/// side has no counterpart (rendered as a filler cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPair {
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl RowPair {
    /// A row present on both sides.
    #[inline]
    #[must_use]
    pub fn both(left: u32, right: u32) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    /// A row present only on the left side (a deletion).
    #[inline]
    #[must_use]
    pub fn left_only(left: u32) -> Self {
        Self {
            left: Some(left),
            right: None,
        }
    }

    /// A row present only on the right side (an addition).
    #[inline]
    #[must_use]
    pub fn right_only(right: u32) -> Self {
        Self {
            left: None,
            right: Some(right),
        }
    }
}

/// Running `right - left` delta while walking rows in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Offset(i64);

impl Offset {
    /// A left-only row shifts subsequent right lines down by one.
    fn advance_left(&mut self) {
        self.0 -= 1;
    }

    /// A right-only row shifts subsequent right lines up by one.
    fn advance_right(&mut self) {
        self.0 += 1;
    }

    /// An anchor row pins the delta to its own pair of line numbers.
    fn anchor_at(&mut self, left: u32, right: u32) {
        self.0 = i64::from(right) - i64::from(left);
    }

    /// The right line paired with `left` under the current delta.
    fn right_of(self, left: u32) -> u32 {
        to_line(i64::from(left) + self.0)
    }

    /// The left line paired with `right` under the current delta.
    fn left_of(self, right: u32) -> u32 {
        to_line(i64::from(right) - self.0)
    }

    fn value(self) -> i64 {
        self.0
    }
}

/// Converts offset arithmetic back into a line number.
///
/// A result outside the representable range means any alignment computed
/// past this point would be meaningless, so it is a hard failure rather
/// than a silent clamp.
fn to_line(value: i64) -> u32 {
    u32::try_from(value)
        .unwrap_or_else(|_| panic!("line arithmetic out of range: {value}"))
}

#[inline]
fn line_of(side: &Option<LineRef>) -> Option<u32> {
    side.as_ref().map(|line_ref| line_ref.line)
}

#[inline]
fn row_lines(row: &HunkRow) -> (Option<u32>, Option<u32>) {
    (line_of(&row.left), line_of(&row.right))
}

/// Whether `a` must come strictly before `b`, judged on whichever side
/// both rows carry. Rows sharing no side keep their input order.
fn row_precedes(a: &HunkRow, b: &HunkRow) -> bool {
    if let (Some(al), Some(bl)) = (line_of(&a.left), line_of(&b.left)) {
        return al < bl;
    }
    match (line_of(&a.right), line_of(&b.right)) {
        (Some(ar), Some(br)) => ar < br,
        _ => false,
    }
}

/// Stably orders a hunk's rows so that present left line numbers increase,
/// using right line numbers to place rows that lack a left one.
///
/// Plain slice sorting is not applicable here: a left-only row and a
/// right-only row are not comparable, so the comparison is not a total
/// order. Insertion keeps the ordering stable and well-defined anyway;
/// hunks are small.
fn order_rows(hunk: &Hunk) -> Vec<&HunkRow> {
    let mut ordered: Vec<&HunkRow> = Vec::with_capacity(hunk.len());
    for row in hunk {
        let mut at = ordered.len();
        while at > 0 && row_precedes(row, ordered[at - 1]) {
            at -= 1;
        }
        ordered.insert(at, row);
    }
    ordered
}

/// The first explicit line number of a hunk, preferring the left side.
fn first_line(hunk: &Hunk) -> u32 {
    hunk.iter()
        .find_map(|row| line_of(&row.left))
        .or_else(|| hunk.iter().find_map(|row| line_of(&row.right)))
        .unwrap_or(0)
}

/// Orders hunks by their first explicit line number, ascending.
///
/// Hunks are expected not to overlap and to be independently monotonic on
/// both sides; this is a stable sort only and does not enforce either.
#[must_use]
pub fn sort_hunks(mut hunks: Vec<Hunk>) -> Vec<Hunk> {
    hunks.sort_by_key(first_line);
    hunks
}

/// Reconstructs the dense row sequence described by a sparse hunk.
///
/// Every explicit row is emitted unchanged, in order; every numeric gap
/// between consecutive rows is filled with synthesized rows consistent
/// with the offset in force at that point. The output has no gaps on any
/// side the hunk carries data for. The input is not modified.
#[must_use]
pub fn pair_lines(hunk: &Hunk) -> Vec<RowPair> {
    let ordered = order_rows(hunk);
    let has_left = ordered.iter().any(|row| row.left.is_some());
    let has_right = ordered.iter().any(|row| row.right.is_some());

    let mut offset = Offset::default();
    let mut anchored = false;
    let mut prev_left: Option<u32> = None;
    let mut prev_right: Option<u32> = None;
    let mut rows = Vec::with_capacity(hunk.len());

    for row in ordered {
        let (cur_left, cur_right) = row_lines(row);

        // Fill any numeric gap since the previous row before emitting it.
        // A filler pairs with the opposite side when the hunk has data
        // there at all; otherwise it is one-sided and moves the offset
        // exactly like an explicit one-sided row.
        loop {
            let next_left = prev_left.map(|line| line + 1);
            let next_right = prev_right.map(|line| line + 1);

            if let (Some(left), Some(cur)) = (next_left, cur_left)
                && left < cur
            {
                if has_right {
                    let right = offset.right_of(left);
                    rows.push(RowPair::both(left, right));
                    prev_right = Some(right);
                } else {
                    rows.push(RowPair::left_only(left));
                    offset.advance_left();
                }
                prev_left = Some(left);
            } else if let (Some(right), Some(cur)) = (next_right, cur_right)
                && right < cur
            {
                if has_left {
                    let left = offset.left_of(right);
                    rows.push(RowPair::both(left, right));
                    prev_left = Some(left);
                } else {
                    rows.push(RowPair::right_only(right));
                    offset.advance_right();
                }
                prev_right = Some(right);
            } else {
                break;
            }
        }

        match (cur_left, cur_right) {
            (Some(left), Some(right)) => {
                let pinned = i64::from(right) - i64::from(left);
                if anchored && offset.value() != pinned {
                    debug_assert!(
                        false,
                        "anchor {left}/{right} disagrees with running offset {}",
                        offset.value()
                    );
                    log::warn!(
                        "anchor {left}/{right} disagrees with running offset {}; keeping the anchor",
                        offset.value()
                    );
                }
                offset.anchor_at(left, right);
                anchored = true;
                prev_left = Some(left);
                prev_right = Some(right);
                rows.push(RowPair::both(left, right));
            }
            (Some(left), None) => {
                offset.advance_left();
                prev_left = Some(left);
                rows.push(RowPair::left_only(left));
            }
            (None, Some(right)) => {
                offset.advance_right();
                prev_right = Some(right);
                rows.push(RowPair::right_only(right));
            }
            (None, None) => {}
        }
    }

    rows
}

/// The offset in force immediately before the first of `rows`: propagated
/// backward from the nearest anchor, or 0 when there is none.
fn offset_leading(rows: impl Iterator<Item = (Option<u32>, Option<u32>)>) -> i64 {
    let mut net = 0i64;
    for (left, right) in rows {
        match (left, right) {
            (Some(l), Some(r)) => return i64::from(r) - i64::from(l) - net,
            (Some(_), None) => net -= 1,
            (None, Some(_)) => net += 1,
            (None, None) => {}
        }
    }
    0
}

/// The offset in force immediately after the last of `rows`: propagated
/// forward from the nearest anchor, or from 0 when there is none.
fn offset_trailing(
    rows: impl DoubleEndedIterator<Item = (Option<u32>, Option<u32>)>,
) -> i64 {
    let mut net = 0i64;
    for (left, right) in rows.rev() {
        match (left, right) {
            (Some(l), Some(r)) => return i64::from(r) - i64::from(l) + net,
            (Some(_), None) => net -= 1,
            (None, Some(_)) => net += 1,
            (None, None) => {}
        }
    }
    net
}

/// Symmetrically extends `rows` with leading and trailing context rows.
///
/// Context rows are pairs `(i, i + offset)` where the offset is resolved
/// from the nearest anchor in `rows` (or 0 when there is none). The
/// leading run counts down toward line 0, the trailing run counts up;
/// both stop as soon as either coordinate would leave `0..=left_max` /
/// `0..=right_max`. The maxes are the callers' file bounds (last valid
/// 0-indexed line per side) and act only as upper clamps. The input is
/// not modified.
#[must_use]
pub fn expand_lines(rows: &[RowPair], left_max: u32, right_max: u32) -> Vec<RowPair> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Vec::new();
    };

    let lead = offset_leading(rows.iter().map(|row| (row.left, row.right)));
    let trail = offset_trailing(rows.iter().map(|row| (row.left, row.right)));
    let left_max = i64::from(left_max);
    let right_max = i64::from(right_max);

    let in_bounds = |left: i64, right: i64| {
        left >= 0 && right >= 0 && left <= left_max && right <= right_max
    };

    // Left coordinate just before the first row, and just after the last.
    let start = match (first.left, first.right) {
        (Some(left), _) => i64::from(left),
        (None, Some(right)) => i64::from(right) - lead,
        (None, None) => return rows.to_vec(),
    };
    let end = match (last.left, last.right) {
        (Some(left), _) => i64::from(left),
        (None, Some(right)) => i64::from(right) - trail,
        (None, None) => return rows.to_vec(),
    };

    let mut leading = Vec::new();
    let mut i = start - 1;
    while in_bounds(i, i + lead) {
        leading.push(RowPair::both(to_line(i), to_line(i + lead)));
        i -= 1;
    }
    leading.reverse();

    let mut expanded = leading;
    expanded.extend_from_slice(rows);

    let mut i = end + 1;
    while in_bounds(i, i + trail) {
        expanded.push(RowPair::both(to_line(i), to_line(i + trail)));
        i += 1;
    }

    expanded
}

/// Line numbers at the leading edge of a hunk, a missing side resolved
/// through the offset in force before the first row.
fn leading_boundary(hunk: &Hunk) -> Option<(i64, i64)> {
    let ordered = order_rows(hunk);
    let lead = offset_leading(ordered.iter().map(|&row| row_lines(row)));
    ordered.iter().find_map(|&row| match row_lines(row) {
        (Some(l), Some(r)) => Some((i64::from(l), i64::from(r))),
        (Some(l), None) => Some((i64::from(l), i64::from(l) + lead)),
        (None, Some(r)) => Some((i64::from(r) - lead, i64::from(r))),
        (None, None) => None,
    })
}

/// Line numbers at the trailing edge of a hunk, a missing side resolved
/// through the offset in force after the last row.
fn trailing_boundary(hunk: &Hunk) -> Option<(i64, i64)> {
    let ordered = order_rows(hunk);
    let trail = offset_trailing(ordered.iter().map(|&row| row_lines(row)));
    ordered.iter().rev().find_map(|&row| match row_lines(row) {
        (Some(l), Some(r)) => Some((i64::from(l), i64::from(r))),
        (Some(l), None) => Some((i64::from(l), i64::from(l) + trail)),
        (None, Some(r)) => Some((i64::from(r) - trail, i64::from(r))),
        (None, None) => None,
    })
}

/// Sorts hunks and folds neighbors together when the gap between one
/// hunk's trailing boundary and the next one's leading boundary is at most
/// `2 * context_lines` on either side, so their context windows would meet
/// or overlap in the rendered view.
///
/// Merging concatenates the row lists; [`pair_lines`] later fills the
/// lines between them as context. Empty hunks are dropped. The operation
/// is idempotent and does not modify its inputs.
#[must_use]
pub fn merge_hunks(hunks: Vec<Hunk>, context_lines: u32) -> Vec<Hunk> {
    let max_gap = 2 * i64::from(context_lines);
    let mut merged: Vec<Hunk> = Vec::new();

    for hunk in sort_hunks(hunks) {
        let Some((lead_left, lead_right)) = leading_boundary(&hunk) else {
            continue;
        };
        if let Some(group) = merged.last_mut() {
            if let Some((trail_left, trail_right)) = trailing_boundary(group) {
                if lead_left - trail_left <= max_gap || lead_right - trail_right <= max_gap {
                    group.extend(hunk);
                    continue;
                }
            }
        }
        merged.push(hunk);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn line(n: u32) -> LineRef {
        LineRef {
            line: n,
            changes: vec![],
        }
    }

    fn anchor(left: u32, right: u32) -> HunkRow {
        HunkRow {
            left: Some(line(left)),
            right: Some(line(right)),
        }
    }

    fn removed(left: u32) -> HunkRow {
        HunkRow {
            left: Some(line(left)),
            right: None,
        }
    }

    fn added(right: u32) -> HunkRow {
        HunkRow {
            left: None,
            right: Some(line(right)),
        }
    }

    #[test]
    fn pair_consecutive_deletions() {
        let hunk = vec![removed(1), removed(2), removed(3), removed(4)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::left_only(1),
                RowPair::left_only(2),
                RowPair::left_only(3),
                RowPair::left_only(4),
            ]
        );
    }

    #[test]
    fn pair_fills_gaps_in_deletions() {
        let hunk = vec![removed(1), removed(3), removed(5)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::left_only(1),
                RowPair::left_only(2),
                RowPair::left_only(3),
                RowPair::left_only(4),
                RowPair::left_only(5),
            ]
        );
    }

    #[test]
    fn pair_fills_gaps_between_anchors_as_pairs() {
        let hunk = vec![anchor(2, 2), anchor(5, 5)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::both(2, 2),
                RowPair::both(3, 3),
                RowPair::both(4, 4),
                RowPair::both(5, 5),
            ]
        );
    }

    #[test]
    fn pair_fillers_after_anchor_follow_its_offset() {
        let hunk = vec![anchor(2, 2), removed(5)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::both(2, 2),
                RowPair::both(3, 3),
                RowPair::both(4, 4),
                RowPair::left_only(5),
            ]
        );
    }

    #[test]
    fn pair_orders_unsorted_rows() {
        let hunk = vec![anchor(9, 9), removed(7), anchor(8, 8)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::left_only(7),
                RowPair::both(8, 8),
                RowPair::both(9, 9),
            ]
        );
    }

    #[test]
    fn pair_mixed_additions_and_deletions() {
        let hunk = vec![removed(5), removed(6), added(5), added(6), added(7)];
        let rows = pair_lines(&hunk);
        assert_eq!(
            rows,
            vec![
                RowPair::left_only(5),
                RowPair::left_only(6),
                RowPair::right_only(5),
                RowPair::right_only(6),
                RowPair::right_only(7),
            ]
        );
    }

    #[test]
    fn pair_empty_hunk_is_empty() {
        assert!(pair_lines(&vec![]).is_empty());
    }

    #[test]
    fn expand_pure_deletions_to_file_bounds() {
        let rows = vec![
            RowPair::left_only(5),
            RowPair::left_only(6),
            RowPair::left_only(7),
        ];
        let expanded = expand_lines(&rows, 11, 8);
        let mut expected: Vec<RowPair> = (0..5).map(|i| RowPair::both(i, i)).collect();
        expected.extend_from_slice(&rows);
        expected.extend((8..=11).map(|i| RowPair::both(i, i - 3)));
        assert_eq!(expanded, expected);
    }

    #[test]
    fn expand_resolves_offset_through_anchor() {
        let rows = vec![
            RowPair::left_only(1),
            RowPair::both(2, 2),
            RowPair::left_only(3),
        ];
        let expanded = expand_lines(&rows, 7, 6);
        assert_eq!(
            expanded,
            vec![
                RowPair::both(0, 1),
                RowPair::left_only(1),
                RowPair::both(2, 2),
                RowPair::left_only(3),
                RowPair::both(4, 3),
                RowPair::both(5, 4),
                RowPair::both(6, 5),
                RowPair::both(7, 6),
            ]
        );
    }

    #[test]
    fn expand_stops_at_line_zero() {
        let rows = vec![RowPair::both(0, 0)];
        let expanded = expand_lines(&rows, 9, 9);
        assert_eq!(expanded.first(), Some(&RowPair::both(0, 0)));
        assert_eq!(expanded.len(), 10);
    }

    #[test]
    fn expand_leading_for_right_only_start() {
        let rows = vec![RowPair::right_only(1)];
        let expanded = expand_lines(&rows, 1, 2);
        assert_eq!(
            expanded,
            vec![
                RowPair::both(0, 0),
                RowPair::right_only(1),
                RowPair::both(1, 2),
            ]
        );
    }

    #[test]
    fn expand_empty_rows_is_empty() {
        assert!(expand_lines(&[], 10, 10).is_empty());
    }

    #[test]
    fn sort_hunks_by_first_line_left_preferred() {
        let hunks = vec![
            vec![anchor(7, 9)],
            vec![added(3)],
            vec![removed(1)],
        ];
        let sorted = sort_hunks(hunks);
        assert_eq!(first_line(&sorted[0]), 1);
        assert_eq!(first_line(&sorted[1]), 3);
        assert_eq!(first_line(&sorted[2]), 7);
    }

    #[test]
    fn merge_hunks_within_double_context() {
        let hunks = vec![vec![anchor(1, 1)], vec![anchor(9, 9)]];
        let merged = merge_hunks(hunks, 4);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0], vec![anchor(1, 1), anchor(9, 9)]);
    }

    #[test]
    fn merge_keeps_hunks_past_double_context() {
        let hunks = vec![vec![anchor(1, 1)], vec![anchor(10, 10)]];
        let merged = merge_hunks(hunks, 4);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_resolves_one_sided_boundaries() {
        // Trailing deletion ends at left 5 (right boundary 4); leading
        // addition starts at right 8 (left boundary 8). Left gap is 3.
        let hunks = vec![vec![removed(5)], vec![added(8)]];
        let merged = merge_hunks(hunks, 2);
        assert_eq!(merged.len(), 1);

        let merged = merge_hunks(vec![vec![removed(5)], vec![added(20)]], 2);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_sorts_before_folding() {
        let hunks = vec![vec![anchor(20, 20)], vec![anchor(1, 1)], vec![anchor(24, 24)]];
        let merged = merge_hunks(hunks, 4);
        assert_eq!(merged.len(), 2);
        assert_eq!(first_line(&merged[0]), 1);
        assert_eq!(merged[1], vec![anchor(20, 20), anchor(24, 24)]);
    }

    #[test]
    fn merge_drops_empty_hunks() {
        let merged = merge_hunks(vec![vec![], vec![anchor(3, 3)]], 4);
        assert_eq!(merged, vec![vec![anchor(3, 3)]]);
    }

    // A valid hunk is generated by walking an edit script forward and
    // dropping only anchor rows, which is exactly how real hunks end up
    // sparse: the service omits unchanged context, never changed rows.
    // The first anchor is always kept, so every gap sits between rows
    // whose offset is pinned, as in real payloads.
    fn hunk_from_ops(left_start: u32, right_start: u32, ops: Vec<(u8, bool)>) -> Hunk {
        let mut left = left_start;
        let mut right = right_start;
        let mut kept_anchor = false;
        let mut hunk = Hunk::new();
        for (op, keep) in ops {
            match op {
                0 => {
                    if keep || !kept_anchor {
                        hunk.push(anchor(left, right));
                        kept_anchor = true;
                    }
                    left += 1;
                    right += 1;
                }
                1 => {
                    hunk.push(removed(left));
                    left += 1;
                }
                _ => {
                    hunk.push(added(right));
                    right += 1;
                }
            }
        }
        hunk
    }

    fn hunk_strategy() -> impl Strategy<Value = Hunk> {
        (
            0u32..40,
            0u32..40,
            proptest::collection::vec((0u8..3, proptest::bool::ANY), 1..16),
        )
            .prop_map(|(left, right, ops)| hunk_from_ops(left, right, ops))
    }

    fn hunks_strategy() -> impl Strategy<Value = Vec<Hunk>> {
        proptest::collection::vec(
            (1u32..30, proptest::collection::vec((0u8..3, proptest::bool::ANY), 1..8)),
            1..6,
        )
        .prop_map(|parts| {
            let mut left = 0u32;
            let mut right = 0u32;
            let mut hunks = Vec::new();
            for (gap, ops) in parts {
                left += gap;
                right += gap;
                let hunk = hunk_from_ops(left, right, ops);
                for row in &hunk {
                    left = left.max(row.left.as_ref().map_or(0, |l| l.line + 1));
                    right = right.max(row.right.as_ref().map_or(0, |r| r.line + 1));
                }
                hunks.push(hunk);
            }
            hunks
        })
    }

    fn non_decreasing(values: &[u32]) -> bool {
        values.windows(2).all(|pair| pair[0] <= pair[1])
    }

    proptest! {
        #[test]
        fn prop_pair_lines_is_monotonic_per_side(hunk in hunk_strategy()) {
            let rows = pair_lines(&hunk);
            let lefts: Vec<u32> = rows.iter().filter_map(|row| row.left).collect();
            let rights: Vec<u32> = rows.iter().filter_map(|row| row.right).collect();
            prop_assert!(non_decreasing(&lefts));
            prop_assert!(non_decreasing(&rights));
        }

        #[test]
        fn prop_pair_lines_preserves_explicit_rows(hunk in hunk_strategy()) {
            let rows = pair_lines(&hunk);
            let mut walker = rows.iter();
            for row in &hunk {
                let want = row_lines(row);
                prop_assert!(
                    walker.any(|pair| (pair.left, pair.right) == want),
                    "row {want:?} missing or out of order"
                );
            }
        }

        #[test]
        fn prop_expand_lines_respects_bounds(
            hunk in hunk_strategy(),
            slack_left in 0u32..20,
            slack_right in 0u32..20,
        ) {
            let rows = pair_lines(&hunk);
            let left_max = rows.iter().filter_map(|row| row.left).max().unwrap_or(0) + slack_left;
            let right_max = rows.iter().filter_map(|row| row.right).max().unwrap_or(0) + slack_right;
            for row in expand_lines(&rows, left_max, right_max) {
                if let Some(left) = row.left {
                    prop_assert!(left <= left_max);
                }
                if let Some(right) = row.right {
                    prop_assert!(right <= right_max);
                }
            }
        }

        #[test]
        fn prop_merge_hunks_is_idempotent(
            hunks in hunks_strategy(),
            context in 0u32..8,
        ) {
            let merged = merge_hunks(hunks, context);
            prop_assert_eq!(merge_hunks(merged.clone(), context), merged);
        }
    }
}
