//! Line diff engine.
//!
//! Produces unified-style hunks: the cursor advances while lines match, and
//! each mismatched region is expanded forward on both sides until the
//! sequences realign. Each region becomes one hunk with a fixed number of
//! context lines around it.

/// One contiguous changed region.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// 1-based first line of the region in the old content.
    pub old_start: usize,
    /// 1-based first line of the region in the new content.
    pub new_start: usize,
    /// Context lines before the region.
    pub context_before: Vec<String>,
    /// Lines removed from the old content.
    pub removed: Vec<String>,
    /// Lines added in the new content.
    pub added: Vec<String>,
    /// Context lines after the region.
    pub context_after: Vec<String>,
}

/// Result of diffing two line sequences.
#[derive(Debug, Clone, Default)]
pub struct LineDiff {
    pub hunks: Vec<Hunk>,
    pub additions: usize,
    pub deletions: usize,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

/// Diff two texts line by line.
pub fn diff_lines(old: &str, new: &str, context_lines: usize) -> LineDiff {
    let old_lines: Vec<&str> = split_lines(old);
    let new_lines: Vec<&str> = split_lines(new);

    let mut hunks = Vec::new();
    let mut additions = 0;
    let mut deletions = 0;

    let mut oi = 0;
    let mut ni = 0;

    while oi < old_lines.len() || ni < new_lines.len() {
        // Advance through the maximal run of equal lines.
        while oi < old_lines.len() && ni < new_lines.len() && old_lines[oi] == new_lines[ni] {
            oi += 1;
            ni += 1;
        }
        if oi >= old_lines.len() && ni >= new_lines.len() {
            break;
        }

        // Mismatch: expand forward on both sides until the sequences
        // realign (or one side is exhausted).
        let (removed_len, added_len) = realign(&old_lines[oi..], &new_lines[ni..]);

        let removed: Vec<String> = old_lines[oi..oi + removed_len]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let added: Vec<String> = new_lines[ni..ni + added_len]
            .iter()
            .map(|l| l.to_string())
            .collect();

        let ctx_start = oi.saturating_sub(context_lines);
        let context_before: Vec<String> = old_lines[ctx_start..oi]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let after_start = oi + removed_len;
        let after_end = (after_start + context_lines).min(old_lines.len());
        let context_after: Vec<String> = old_lines[after_start..after_end]
            .iter()
            .map(|l| l.to_string())
            .collect();

        deletions += removed.len();
        additions += added.len();

        hunks.push(Hunk {
            old_start: oi + 1,
            new_start: ni + 1,
            context_before,
            removed,
            added,
            context_after,
        });

        oi += removed_len;
        ni += added_len;
    }

    LineDiff {
        hunks,
        additions,
        deletions,
    }
}

/// Find the smallest forward expansion (removed, added) after which both
/// sequences realign. Exhaustion of both sides counts as realignment.
fn realign(old_rest: &[&str], new_rest: &[&str]) -> (usize, usize) {
    let max_k = old_rest.len() + new_rest.len();
    for k in 1..=max_k {
        for i in 0..=k {
            let j = k - i;
            if i > old_rest.len() || j > new_rest.len() {
                continue;
            }
            let old_done = i == old_rest.len();
            let new_done = j == new_rest.len();
            if old_done && new_done {
                return (i, j);
            }
            if !old_done && !new_done && old_rest[i] == new_rest[j] {
                return (i, j);
            }
        }
    }
    (old_rest.len(), new_rest.len())
}

/// Render a diff as unified text.
pub fn render_unified(diff: &LineDiff) -> String {
    let mut out = String::new();
    for hunk in &diff.hunks {
        let old_count = hunk.context_before.len() + hunk.removed.len() + hunk.context_after.len();
        let new_count = hunk.context_before.len() + hunk.added.len() + hunk.context_after.len();
        let old_start = hunk.old_start.saturating_sub(hunk.context_before.len());
        let new_start = hunk.new_start.saturating_sub(hunk.context_before.len());

        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_count, new_start, new_count
        ));
        for line in &hunk.context_before {
            out.push_str(&format!(" {}\n", line));
        }
        for line in &hunk.removed {
            out.push_str(&format!("-{}\n", line));
        }
        for line in &hunk.added {
            out.push_str(&format!("+{}\n", line));
        }
        for line in &hunk.context_after {
            out.push_str(&format!(" {}\n", line));
        }
    }
    out
}

/// Truncate diff text to a bounded number of lines, appending a marker for
/// what was cut.
pub fn truncate_preview(diff_text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = diff_text.lines().collect();
    if lines.len() <= max_lines {
        return diff_text.to_string();
    }
    let mut out: String = lines[..max_lines].join("\n");
    out.push_str(&format!("\n... +{} more lines", lines.len() - max_lines));
    out
}

/// Split text into lines without treating a trailing newline as an extra
/// empty line.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_has_no_hunks() {
        let diff = diff_lines("a\nb\nc\n", "a\nb\nc\n", 3);
        assert!(diff.is_empty());
        assert_eq!(diff.additions, 0);
        assert_eq!(diff.deletions, 0);
    }

    #[test]
    fn test_single_line_change() {
        let diff = diff_lines("a\nb\nc\n", "a\nx\nc\n", 1);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.additions, 1);
        assert_eq!(diff.deletions, 1);
        assert_eq!(diff.hunks[0].removed, vec!["b"]);
        assert_eq!(diff.hunks[0].added, vec!["x"]);
        assert_eq!(diff.hunks[0].context_before, vec!["a"]);
        assert_eq!(diff.hunks[0].context_after, vec!["c"]);
    }

    #[test]
    fn test_pure_insertion() {
        let diff = diff_lines("a\nc\n", "a\nb\nc\n", 0);
        assert_eq!(diff.additions, 1);
        assert_eq!(diff.deletions, 0);
    }

    #[test]
    fn test_pure_deletion() {
        let diff = diff_lines("a\nb\nc\n", "a\nc\n", 0);
        assert_eq!(diff.additions, 0);
        assert_eq!(diff.deletions, 1);
    }

    #[test]
    fn test_empty_to_content_counts_all_lines() {
        let diff = diff_lines("", "a\nb\nc\n", 0);
        assert_eq!(diff.additions, 3);
        assert_eq!(diff.deletions, 0);
        assert_eq!(diff.hunks.len(), 1);
    }

    #[test]
    fn test_two_separated_regions_make_two_hunks() {
        let old = "a\nb\nc\nd\ne\nf\ng\nh\n";
        let new = "a\nB\nc\nd\ne\nf\nG\nh\n";
        let diff = diff_lines(old, new, 1);
        assert_eq!(diff.hunks.len(), 2);
        assert_eq!(diff.additions, 2);
        assert_eq!(diff.deletions, 2);
    }

    #[test]
    fn test_symmetry_swaps_counts() {
        let a = "one\ntwo\nthree\nfour\n";
        let b = "one\ntwo-changed\nthree\nfour\nfive\nsix\n";
        let forward = diff_lines(a, b, 2);
        let inverse = diff_lines(b, a, 2);
        assert_eq!(forward.additions, inverse.deletions);
        assert_eq!(forward.deletions, inverse.additions);
    }

    #[test]
    fn test_truncate_preview() {
        let text = (0..20).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n");
        let preview = truncate_preview(&text, 5);
        assert!(preview.ends_with("... +15 more lines"));
        assert_eq!(preview.lines().count(), 6);
    }

    #[test]
    fn test_unified_render_markers() {
        let diff = diff_lines("a\nb\n", "a\nc\n", 1);
        let text = render_unified(&diff);
        assert!(text.contains("@@"));
        assert!(text.contains("-b"));
        assert!(text.contains("+c"));
        assert!(text.contains(" a"));
    }
}
