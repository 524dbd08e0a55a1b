//! Types and parsing for the diff service's per-file change payload.
//!
//! The hosting application's diff service compares two versions of a file
//! and reports the result as a list of hunks: sparse groups of changed
//! rows, each row naming a line on the old side, the new side, or both,
//! together with the character ranges that differ within that line. This
//! module provides the types to deserialize that payload into Rust structs
//! that can be processed by the [`crate::align`] and [`crate::view`]
//! modules.
//!
//! ## Payload Format
//!
//! The service emits one JSON object per compared file, delivered either
//! as a JSON array (`[{...}, {...}]`) or as newline-separated objects
//! (`{...}\n{...}`) when streamed. The [`parse`] function handles both
//! shapes transparently.
//!
//! ## Example Payload
//!
//! ```json
//! {
//!   "path": "src/lib.rs",
//!   "language": "Rust",
//!   "status": "changed",
//!   "hunks": [[
//!     {
//!       "left": {"line": 4, "changes": [{"start": 0, "end": 5}]},
//!       "right": {"line": 4, "changes": [{"start": 0, "end": 7}]}
//!     }
//!   ]]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which version of a file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The old ("before") version.
    Left,
    /// The new ("after") version.
    Right,
}

/// How a file changed between the two compared versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Created,
    Deleted,
    Changed,
}

/// A changed character range within a line.
///
/// `start` and `end` are byte offsets within the line, half-open
/// (`start < end`). Offsets are bytes, not characters, which matters for
/// non-ASCII text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRange {
    /// Start byte offset within the line (inclusive).
    pub start: u32,

    /// End byte offset within the line (exclusive).
    pub end: u32,
}

/// One side of a hunk row: a 0-indexed line number plus the ranges within
/// that line the diff considers changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    /// The 0-indexed line number in that version of the file.
    pub line: u32,

    /// Changed regions within the line, ordered and non-overlapping.
    ///
    /// Multiple ranges occur when several parts of one line were modified.
    /// Empty for lines reported only for pairing purposes.
    #[serde(default)]
    pub changes: Vec<ChangeRange>,
}

/// A single hunk row, present on the left side, the right side, or both.
///
/// Rows with both sides are anchors (a matched or modified line); rows
/// with only a left side are pure deletions, only a right side pure
/// additions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkRow {
    pub left: Option<LineRef>,
    pub right: Option<LineRef>,
}

/// A hunk: a group of related changed rows within one file comparison.
///
/// Rows are sparse (unchanged lines between nearby changes are omitted)
/// and their order is not guaranteed by the service.
pub type Hunk = Vec<HunkRow>;

/// A file entry from the diff service's payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileDiff {
    pub path: PathBuf,
    pub language: String,
    pub status: Status,
    /// Groups of related changes within the file.
    #[serde(default)]
    pub hunks: Vec<Hunk>,
}

/// Parses a diff service payload into a list of file entries.
///
/// Handles two shapes:
/// - a JSON array: `[{...}, {...}]`
/// - newline-separated JSON objects (streamed responses)
pub fn parse(json: &str) -> Result<Vec<FileDiff>, serde_json::Error> {
    // Try the array shape first.
    if let Ok(files) = serde_json::from_str::<Vec<FileDiff>>(json) {
        return Ok(files);
    }

    // Fall back to newline-separated objects.
    json.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}
