//! Overlaying change emphasis onto tokenized lines.
//!
//! The syntax tokenizer hands the view an ordered, gapless list of styled
//! fragments covering a line. The diff service independently reports which
//! byte ranges of that line changed. This module combines the two: every
//! character covered by a change range gets an emphasis marker on top of
//! its syntax style, and fragments are split at range boundaries so the
//! uncovered remainder keeps its original styling untouched.
//!
//! Both the fragment list and the change ranges arrive sorted by offset,
//! so a single pass with two advancing cursors suffices; the work is
//! linear in fragments plus ranges. The operation never looks at
//! neighboring lines.

use crate::hunk::{ChangeRange, Side};
use serde::{Deserialize, Serialize};

/// Change emphasis applied on top of a fragment's syntax style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// The fragment text was removed (left side).
    Removed,
    /// The fragment text was added (right side).
    Added,
}

impl Emphasis {
    fn for_side(side: Side) -> Self {
        match side {
            Side::Left => Emphasis::Removed,
            Side::Right => Emphasis::Added,
        }
    }
}

/// A contiguous styled run of a tokenized line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Start byte offset within the line.
    pub start: u32,

    /// The fragment's text.
    pub text: String,

    /// Opaque style tag assigned by the tokenizer, for example
    /// `"keyword"` or `"string"`. Carried through unchanged.
    pub style: String,

    /// Change emphasis, present on fragments covered by a change range.
    #[serde(default)]
    pub emphasis: Option<Emphasis>,
}

impl TextFragment {
    /// A plain tokenizer fragment with no emphasis.
    #[must_use]
    pub fn new(start: u32, text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
            style: style.into(),
            emphasis: None,
        }
    }

    /// End byte offset within the line (exclusive).
    #[inline]
    #[must_use]
    pub fn end(&self) -> u32 {
        self.start + self.text.len() as u32
    }

    /// A piece of this fragment covering `[start, end)`, keeping the
    /// original style tag.
    fn piece(&self, start: u32, end: u32, emphasis: Option<Emphasis>) -> Self {
        let from = (start - self.start) as usize;
        let to = (end - self.start) as usize;
        Self {
            start,
            text: self.text[from..to].to_string(),
            style: self.style.clone(),
            emphasis,
        }
    }
}

/// Marks every character of `fragments` covered by one of `changes` with
/// the emphasis for `side`, splitting fragments at range boundaries so
/// uncovered text keeps its original fragment structure.
///
/// A change range exactly covering a fragment marks it in place; a range
/// overlapping part of a fragment splits it into an unmarked prefix, an
/// emphasized middle and an unmarked suffix, as present. A range
/// straddling a fragment boundary emphasizes its intersection with each
/// fragment it touches. Fragments outside every range are passed through
/// unmodified, and an empty `changes` list returns the input as is.
///
/// `changes` must be sorted by start offset and non-overlapping, as the
/// diff service produces them.
#[must_use]
pub fn overlay(side: Side, fragments: Vec<TextFragment>, changes: &[ChangeRange]) -> Vec<TextFragment> {
    if changes.is_empty() {
        return fragments;
    }

    let emphasis = Emphasis::for_side(side);
    let mut overlaid = Vec::with_capacity(fragments.len() + 2 * changes.len());
    let mut next = 0;

    for fragment in fragments {
        let start = fragment.start;
        let end = fragment.end();

        // Skip ranges that ended before this fragment.
        while next < changes.len() && changes[next].end <= start {
            next += 1;
        }

        // No overlap: the fragment passes through untouched.
        if next >= changes.len() || changes[next].start >= end {
            overlaid.push(fragment);
            continue;
        }

        // A range covering the whole fragment marks it in place.
        let covering = changes[next];
        if covering.start <= start && covering.end >= end {
            if covering.end == end {
                next += 1;
            }
            overlaid.push(TextFragment {
                emphasis: Some(emphasis),
                ..fragment
            });
            continue;
        }

        // Split against every range overlapping this fragment.
        let mut cursor = start;
        while next < changes.len() && changes[next].start < end {
            let change = changes[next];
            let from = change.start.max(start);
            let to = change.end.min(end);
            if cursor < from {
                overlaid.push(fragment.piece(cursor, from, None));
            }
            overlaid.push(fragment.piece(from, to, Some(emphasis)));
            cursor = to;
            if change.end > end {
                // The range continues into the next fragment.
                break;
            }
            next += 1;
        }
        if cursor < end {
            overlaid.push(fragment.piece(cursor, end, None));
        }
    }

    overlaid
}
