//! Assembling display-ready files from hunk data and file contents.
//!
//! This module ties the alignment engine to actual file content. For each
//! compared file it produces the rows the presentation layer renders: line
//! numbers per side, line text, the change ranges to overlay once the line
//! is tokenized, and the boundaries of each change section for navigation
//! and separators.
//!
//! ## Processing Flow
//!
//! 1. [`process_file`] dispatches on file status.
//! 2. Created and deleted files need no alignment: every line is a pure
//!    addition or deletion with a full-line change range.
//! 3. For changed files, nearby hunks are merged, each merged group is
//!    densified with [`pair_lines`] and extended with [`expand_lines`],
//!    and the context window is trimmed to the configured width.

use crate::align::{expand_lines, merge_hunks, pair_lines};
use crate::hunk::{ChangeRange, FileDiff, Hunk, Status};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::PathBuf;

/// Most lines carry 0-2 change ranges; inline storage avoids heap allocation.
type Changes = SmallVec<[ChangeRange; 2]>;

/// Default number of unchanged lines shown around each change section.
pub const CONTEXT_LINES: u32 = 4;

/// Rendering policy supplied by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewOptions {
    /// Unchanged lines to keep around each change section.
    pub context_lines: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            context_lines: CONTEXT_LINES,
        }
    }
}

/// One side of a rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// 0-indexed line number, or `None` for a filler cell.
    pub line: Option<u32>,

    /// The line's text. Empty for filler cells.
    pub content: String,

    /// Changed regions within the line, for the highlight overlay.
    pub changes: Changes,
}

impl Cell {
    fn new(line: Option<u32>, content: String, changes: Changes) -> Self {
        Self {
            line,
            content,
            changes,
        }
    }

    /// A placeholder cell for a side with no line in this row.
    #[must_use]
    fn filler() -> Self {
        Self::new(None, String::new(), Changes::new())
    }

    /// A cell whose whole line is changed (created or deleted files).
    #[must_use]
    fn full_change(line: u32, content: String) -> Self {
        let end = content.len() as u32;
        let changes = if end == 0 {
            Changes::new()
        } else {
            smallvec::smallvec![ChangeRange { start: 0, end }]
        };
        Self::new(Some(line), content, changes)
    }
}

/// A single row in the rendered diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// The old (before) side of this row.
    pub left: Cell,

    /// The new (after) side of this row.
    pub right: Cell,
}

/// A processed file ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFile {
    pub path: PathBuf,

    /// The detected programming language, passed to the tokenizer.
    pub language: String,

    pub status: Status,

    /// Count of changed lines on the new side.
    pub additions: u32,

    /// Count of changed lines on the old side.
    pub deletions: u32,

    /// The aligned rows, section by section.
    pub rows: Vec<Row>,

    /// Row indices (0-indexed) where change sections begin.
    ///
    /// Used for separators between sections and for navigation.
    pub section_starts: Vec<u32>,
}

/// Processes one compared file into display-ready rows.
///
/// Dispatches on file status: created files become right-only rows,
/// deleted files left-only rows, and changed files go through the full
/// alignment pipeline.
#[must_use]
pub fn process_file(
    file: FileDiff,
    old_lines: Vec<String>,
    new_lines: Vec<String>,
    options: &ViewOptions,
) -> DisplayFile {
    match file.status {
        Status::Created => process_created(file, new_lines),
        Status::Deleted => process_deleted(file, old_lines),
        Status::Changed => process_changed(file, &old_lines, &new_lines, options),
    }
}

/// A newly created file: every line is an addition on the right side.
fn process_created(file: FileDiff, new_lines: Vec<String>) -> DisplayFile {
    let rows: Vec<Row> = new_lines
        .into_iter()
        .enumerate()
        .map(|(line, content)| Row {
            left: Cell::filler(),
            right: Cell::full_change(line as u32, content),
        })
        .collect();

    let additions = rows.len() as u32;
    let section_starts = if rows.is_empty() { vec![] } else { vec![0] };

    DisplayFile {
        path: file.path,
        language: file.language,
        status: file.status,
        additions,
        deletions: 0,
        rows,
        section_starts,
    }
}

/// A deleted file: every line is a deletion on the left side.
fn process_deleted(file: FileDiff, old_lines: Vec<String>) -> DisplayFile {
    let rows: Vec<Row> = old_lines
        .into_iter()
        .enumerate()
        .map(|(line, content)| Row {
            left: Cell::full_change(line as u32, content),
            right: Cell::filler(),
        })
        .collect();

    let deletions = rows.len() as u32;
    let section_starts = if rows.is_empty() { vec![] } else { vec![0] };

    DisplayFile {
        path: file.path,
        language: file.language,
        status: file.status,
        additions: 0,
        deletions,
        rows,
        section_starts,
    }
}

/// Collects each side's change ranges into lookup maps keyed by line
/// number, for correlation with the aligned rows.
fn extract_changes(hunks: &[Hunk]) -> (HashMap<u32, Changes>, HashMap<u32, Changes>) {
    let capacity: usize = hunks.iter().map(Vec::len).sum();
    let mut left_changes = HashMap::with_capacity(capacity);
    let mut right_changes = HashMap::with_capacity(capacity);

    for hunk in hunks {
        for row in hunk {
            if let Some(line_ref) = &row.left {
                left_changes.insert(line_ref.line, Changes::from_slice(&line_ref.changes));
            }
            if let Some(line_ref) = &row.right {
                right_changes.insert(line_ref.line, Changes::from_slice(&line_ref.changes));
            }
        }
    }

    (left_changes, right_changes)
}

/// A changed file: merge nearby hunks, densify and extend each merged
/// group, and trim the context window to the configured width.
fn process_changed(
    file: FileDiff,
    old_lines: &[String],
    new_lines: &[String],
    options: &ViewOptions,
) -> DisplayFile {
    let FileDiff {
        path,
        language,
        status,
        hunks,
    } = file;

    let (left_changes, right_changes) = extract_changes(&hunks);
    let additions = right_changes.len() as u32;
    let deletions = left_changes.len() as u32;

    let context = options.context_lines as usize;
    let left_end = last_line(old_lines);
    let right_end = last_line(new_lines);

    let mut rows = Vec::new();
    let mut section_starts = Vec::new();

    for group in merge_hunks(hunks, options.context_lines) {
        let paired = pair_lines(&group);
        let Some(&first) = paired.first() else {
            continue;
        };

        let expanded = expand_lines(&paired, left_end, right_end);

        // The engine extends to the file bounds; keep at most `context`
        // rows of surrounding lines on each side of the section.
        let lead_len = expanded
            .iter()
            .position(|&row| row == first)
            .unwrap_or_default();
        let trail_len = expanded.len() - lead_len - paired.len();
        let from = lead_len.saturating_sub(context);
        let to = expanded.len() - trail_len.saturating_sub(context);

        section_starts.push(rows.len() as u32);
        for row in &expanded[from..to] {
            rows.push(Row {
                left: make_cell(row.left, old_lines, &left_changes),
                right: make_cell(row.right, new_lines, &right_changes),
            });
        }
    }

    DisplayFile {
        path,
        language,
        status,
        additions,
        deletions,
        rows,
        section_starts,
    }
}

/// Last valid 0-indexed line of a file.
fn last_line(lines: &[String]) -> u32 {
    lines.len().saturating_sub(1) as u32
}

fn make_cell(line: Option<u32>, lines: &[String], changes: &HashMap<u32, Changes>) -> Cell {
    let Some(line) = line else {
        return Cell::filler();
    };
    let content = lines.get(line as usize).cloned().unwrap_or_default();
    let line_changes = changes.get(&line).cloned().unwrap_or_default();
    Cell::new(Some(line), content, line_changes)
}
