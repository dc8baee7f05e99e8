//! Line-by-line comparison of file contents.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce structured
//! hunks with context lines.

use std::fmt;

use similar::{ChangeTag, TextDiff};

/// Unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// The result of diffing two texts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    pub hunks: Vec<DiffHunk>,
    /// Total number of lines in the old content.
    pub old_lines: usize,
    /// Total number of lines in the new content.
    pub new_lines: usize,
}

impl BlobDiff {
    /// Returns `true` if both sides are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| pred(l))
            .count()
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// First old line covered (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// First new line covered (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` header line.
    ///
    /// An empty side is reported as starting at line 0.
    pub fn header(&self) -> String {
        let start = |start: usize, count: usize| if count == 0 { start.saturating_sub(1) } else { start };
        format!(
            "@@ -{},{} +{},{} @@",
            start(self.old_start, self.old_count),
            self.old_count,
            start(self.new_start, self.new_count),
            self.new_count
        )
    }
}

/// A single line in a diff hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(text) => write!(f, " {text}"),
            Self::Added(text) => write!(f, "+{text}"),
            Self::Removed(text) => write!(f, "-{text}"),
        }
    }
}

/// Diff two texts line by line.
pub fn diff_text(old: &str, new: &str) -> BlobDiff {
    let old_lines = old.lines().count();
    let new_lines = new.lines().count();
    if old == new {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let text_diff = TextDiff::from_lines(old, new);
    let hunks = text_diff
        .grouped_ops(CONTEXT_LINES)
        .iter()
        .filter_map(|group| {
            let first = group.first()?;
            let mut hunk = DiffHunk {
                old_start: first.old_range().start + 1,
                old_count: 0,
                new_start: first.new_range().start + 1,
                new_count: 0,
                lines: Vec::new(),
            };
            for change in group.iter().flat_map(|op| text_diff.iter_changes(op)) {
                let text = change.value().trim_end_matches(['\n', '\r']).to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                        hunk.lines.push(DiffLine::Context(text));
                    }
                    ChangeTag::Delete => {
                        hunk.old_count += 1;
                        hunk.lines.push(DiffLine::Removed(text));
                    }
                    ChangeTag::Insert => {
                        hunk.new_count += 1;
                        hunk.lines.push(DiffLine::Added(text));
                    }
                }
            }
            Some(hunk)
        })
        .collect();

    BlobDiff {
        hunks,
        old_lines,
        new_lines,
    }
}

/// Diff two byte buffers, treating non-UTF-8 content as binary.
///
/// Binary content yields a single synthetic hunk describing the sizes.
pub fn diff_bytes(old: &[u8], new: &[u8]) -> BlobDiff {
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) => diff_text(old, new),
        _ if old == new => BlobDiff {
            hunks: Vec::new(),
            old_lines: 0,
            new_lines: 0,
        },
        _ => binary_diff(old, new),
    }
}

fn binary_diff(old: &[u8], new: &[u8]) -> BlobDiff {
    let mut lines = Vec::new();
    if !old.is_empty() {
        lines.push(DiffLine::Removed(format!("(binary content, {} bytes)", old.len())));
    }
    if !new.is_empty() {
        lines.push(DiffLine::Added(format!("(binary content, {} bytes)", new.len())));
    }
    BlobDiff {
        hunks: vec![DiffHunk {
            old_start: 1,
            old_count: usize::from(!old.is_empty()),
            new_start: 1,
            new_count: usize::from(!new.is_empty()),
            lines,
        }],
        old_lines: 0,
        new_lines: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_hunks() {
        let diff = diff_text("hello\nworld\n", "hello\nworld\n");
        assert!(diff.is_empty());
        assert_eq!(diff.old_lines, 2);
    }

    #[test]
    fn appended_line() {
        let diff = diff_text("line1\nline2\n", "line1\nline2\nline3\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 0);
        assert_eq!(diff.hunks.len(), 1);
    }

    #[test]
    fn modification_is_remove_plus_add() {
        let diff = diff_text("hello world\n", "hello universe\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
        assert_eq!(
            diff.hunks[0].lines,
            vec![
                DiffLine::Removed("hello world".into()),
                DiffLine::Added("hello universe".into()),
            ]
        );
    }

    #[test]
    fn from_empty_counts_every_line() {
        let diff = diff_text("", "a\nb\nc\n");
        assert_eq!(diff.additions(), 3);
        let hunk = &diff.hunks[0];
        assert_eq!((hunk.old_count, hunk.new_start, hunk.new_count), (0, 1, 3));
        assert_eq!(hunk.header(), "@@ -0,0 +1,3 @@");
    }

    #[test]
    fn to_empty_counts_every_line() {
        let diff = diff_text("a\nb\n", "");
        assert_eq!(diff.deletions(), 2);
        assert_eq!(diff.hunks[0].header(), "@@ -1,2 +0,0 @@");
    }

    #[test]
    fn context_surrounds_change() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
        let new = "a\nb\nc\nd\nX\nf\ng\nh\ni\nj\n";
        let hunk = &diff_text(old, new).hunks[0];
        let context = hunk.lines.iter().filter(|l| matches!(l, DiffLine::Context(_))).count();
        assert_eq!(context, 2 * CONTEXT_LINES);
        assert_eq!(hunk.old_start, 2);
        assert_eq!(hunk.header(), "@@ -2,7 +2,7 @@");
    }

    #[test]
    fn distant_changes_make_separate_hunks() {
        let old: String = (0..30).map(|i| format!("l{i}\n")).collect();
        let new = old.replace("l2\n", "X\n").replace("l25\n", "Y\n");
        assert_eq!(diff_text(&old, &new).hunks.len(), 2);
    }

    #[test]
    fn binary_content_gets_synthetic_hunk() {
        let diff = diff_bytes(&[0, 159, 146, 150], &[1, 0xff]);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.deletions(), 1);
        assert_eq!(diff.additions(), 1);
    }

    #[test]
    fn identical_binary_is_empty() {
        assert!(diff_bytes(&[0xff, 0xfe], &[0xff, 0xfe]).is_empty());
    }

    #[test]
    fn diff_line_display_prefixes() {
        assert_eq!(DiffLine::Context("x".into()).to_string(), " x");
        assert_eq!(DiffLine::Added("x".into()).to_string(), "+x");
        assert_eq!(DiffLine::Removed("x".into()).to_string(), "-x");
    }
}
