//! Line diffs for grove.
//!
//! # Key Types
//!
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- Structured line-level diff
//! - [`render_unified`] -- Unified diff text for display

pub mod line_diff;
pub mod unified;

pub use line_diff::{diff_bytes, diff_text, BlobDiff, DiffHunk, DiffLine, CONTEXT_LINES};
pub use unified::render_unified;
