use std::fmt::Write;

use crate::line_diff::BlobDiff;

/// Render `diff` as unified diff text with `---`/`+++` file headers.
///
/// An empty diff renders as an empty string.
pub fn render_unified(diff: &BlobDiff, old_label: &str, new_label: &str) -> String {
    if diff.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "--- {old_label}");
    let _ = writeln!(out, "+++ {new_label}");
    for hunk in &diff.hunks {
        let _ = writeln!(out, "{}", hunk.header());
        for line in &hunk.lines {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}
