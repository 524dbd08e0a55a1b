//! # diffview
//!
//! Diff alignment and highlight overlay for a source-code hosting
//! application's file comparison views.
//!
//! The diff service reports changes sparsely: per hunk, a list of rows
//! naming a line on the old side, the new side, or both, with the byte
//! ranges that differ within each line. Rendering a side-by-side view
//! needs the opposite shape, a dense row sequence with fillers and
//! context, plus per-character change emphasis layered over syntax
//! highlighting. This crate performs both transformations.
//!
//! ## Architecture
//!
//! - `hunk` - types and parsing for the diff service's payload
//! - `align` - dense row reconstruction, context expansion, hunk merging
//! - `overlay` - change emphasis over tokenized line fragments
//! - `view` - per-file assembly of display-ready rows
//!
//! Everything is a pure, synchronous function over immutable values;
//! unrelated files, hunks and lines can be processed concurrently, which
//! [`process_files`] uses to fan out across files.
//!
//! ## Example
//!
//! ```
//! use diffview::{Hunk, HunkRow, LineRef, pair_lines};
//!
//! let hunk: Hunk = vec![HunkRow {
//!     left: Some(LineRef { line: 2, changes: vec![] }),
//!     right: Some(LineRef { line: 2, changes: vec![] }),
//! }];
//!
//! let rows = pair_lines(&hunk);
//! assert_eq!(rows[0].left, Some(2));
//! assert_eq!(rows[0].right, Some(2));
//! ```

use rayon::prelude::*;

pub mod align;
pub mod hunk;
pub mod overlay;
pub mod view;

pub use align::{RowPair, expand_lines, merge_hunks, pair_lines, sort_hunks};
pub use hunk::{ChangeRange, FileDiff, Hunk, HunkRow, LineRef, Side, Status, parse};
pub use overlay::{Emphasis, TextFragment, overlay};
pub use view::{CONTEXT_LINES, Cell, DisplayFile, Row, ViewOptions, process_file};

/// Splits file content into individual lines, or an empty vector for a
/// missing file (one side of a created or deleted file).
#[inline]
#[must_use]
pub fn into_lines(content: Option<String>) -> Vec<String> {
    content
        .map(|c| c.lines().map(String::from).collect())
        .unwrap_or_default()
}

/// Processes a batch of compared files into display-ready form, in
/// parallel across files.
///
/// Fetching file content is the caller's concern; `fetch` must return the
/// old and new lines for a file, empty on a side where the file does not
/// exist.
pub fn process_files<F>(files: Vec<FileDiff>, options: &ViewOptions, fetch: F) -> Vec<DisplayFile>
where
    F: Fn(&FileDiff) -> (Vec<String>, Vec<String>) + Sync,
{
    log::debug!("processing {} compared files", files.len());

    files
        .into_par_iter()
        .map(|file| {
            let (old_lines, new_lines) = fetch(&file);
            view::process_file(file, old_lines, new_lines, options)
        })
        .collect()
}
