use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::types::DiffHunk;

static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();

fn hunk_header() -> &'static Regex {
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@\s+-(\d+)(?:,(\d+))?\s+\+(\d+)(?:,(\d+))?\s+@@\s*(.*)$")
            .expect("hunk header pattern is valid")
    })
}

/// Parse the unified diff of one file into hunks with per-line numbers.
///
/// Expects `--unified=0` output but tolerates context lines, which advance
/// both cursors. `+++`/`---` lines are file markers only once the current
/// hunk's line counts are used up; inside a hunk they are content. Hunks
/// that add and delete nothing are dropped.
pub fn parse_hunks(diff: &str) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut current: Option<DiffHunk> = None;
    let mut old_line = 0;
    let mut new_line = 0;
    let mut old_seen = 0;
    let mut new_seen = 0;

    for line in diff.lines() {
        if line.starts_with("@@") {
            let Some(hunk) = parse_header(line) else {
                debug!(line, "Skipping malformed hunk header");
                continue;
            };
            old_line = hunk.old_start;
            new_line = hunk.new_start;
            old_seen = 0;
            new_seen = 0;
            if let Some(done) = current.replace(hunk) {
                push_non_empty(&mut hunks, done);
            }
            continue;
        }

        let Some(hunk) = current.as_mut() else {
            continue;
        };

        // "\ No newline at end of file" belongs to the previous line.
        if line.starts_with('\\') {
            continue;
        }
        let exhausted = old_seen >= hunk.old_count && new_seen >= hunk.new_count;
        if exhausted && (line.starts_with("+++") || line.starts_with("---")) {
            continue;
        }
        if line.starts_with('+') {
            hunk.added_lines.push(new_line);
            new_line += 1;
            new_seen += 1;
        } else if line.starts_with('-') {
            hunk.deleted_lines.push(old_line);
            old_line += 1;
            old_seen += 1;
        } else {
            old_line += 1;
            new_line += 1;
            old_seen += 1;
            new_seen += 1;
        }
    }

    if let Some(done) = current {
        push_non_empty(&mut hunks, done);
    }
    hunks
}

fn parse_header(line: &str) -> Option<DiffHunk> {
    let caps = hunk_header().captures(line)?;
    let number = |i: usize, default: usize| -> Option<usize> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    Some(DiffHunk {
        old_start: number(1, 0)?,
        old_count: number(2, 1)?,
        new_start: number(3, 0)?,
        new_count: number(4, 1)?,
        header: caps.get(5).map_or("", |m| m.as_str()).trim().to_string(),
        added_lines: Vec::new(),
        deleted_lines: Vec::new(),
    })
}

fn push_non_empty(hunks: &mut Vec<DiffHunk>, hunk: DiffHunk) {
    if !hunk.is_empty() {
        hunks.push(hunk);
    }
}
