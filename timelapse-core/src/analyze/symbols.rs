// Gap averages cast counts to float.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use timelapse_graphs::{SymbolSpan, SymbolTable};
use tracing::debug;

use crate::extract::parse_hunks;
use crate::types::{
    AttributionMethod, Commit, DiffHunk, QualityFlag, SymbolRollup, SymbolTouchRow,
};

use super::round4;

/// Symbol id absorbing every hunk when nothing else could be attributed.
pub const UNKNOWN_SYMBOL: &str = "unknown";

static DECLARATION: OnceLock<Regex> = OnceLock::new();

fn declaration() -> &'static Regex {
    DECLARATION.get_or_init(|| {
        Regex::new(
            r"\b(?:def|class|function\*?|fn|func|struct|impl|interface|trait|enum)(?:\s*<[^>]*>)?\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)",
        )
        .expect("declaration pattern is valid")
    })
}

/// What a set of hunks contributed to one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolHits {
    /// Hunks attributed to the symbol, at most one per hunk.
    pub touches: u32,
    pub added: u64,
    pub deleted: u64,
}

impl SymbolHits {
    fn record(&mut self, hunk: &DiffHunk) {
        self.touches += 1;
        self.added += hunk.added_lines.len() as u64;
        self.deleted += hunk.deleted_lines.len() as u64;
    }
}

// ── Mapping ────────────────────────────────────────────────────────

/// Attribute each hunk to every span containing at least one of its
/// changed lines. Nested spans are all credited.
pub fn map_hunks_to_symbols(
    hunks: &[DiffHunk],
    spans: &[SymbolSpan],
) -> BTreeMap<String, SymbolHits> {
    let mut hits: BTreeMap<String, SymbolHits> = BTreeMap::new();

    for hunk in hunks {
        let changed = hunk.changed_lines();
        for span in spans {
            if changed.range(span.start_line..=span.end_line).next().is_some() {
                hits.entry(span.name.clone()).or_default().record(hunk);
            }
        }
    }
    hits
}

/// Attribute hunks by their `@@` context header.
///
/// The identifier after the first declaration keyword wins; otherwise the
/// header itself, cut to `max_len` characters, is used as an opaque symbol.
/// Hunks with an empty header are not attributed.
pub fn symbols_from_hunk_headers(
    hunks: &[DiffHunk],
    max_len: usize,
) -> BTreeMap<String, SymbolHits> {
    let mut hits: BTreeMap<String, SymbolHits> = BTreeMap::new();

    for hunk in hunks {
        let header = hunk.header.trim();
        if header.is_empty() {
            continue;
        }
        let symbol = match declaration().captures(header).and_then(|c| c.get(1)) {
            Some(name) => name.as_str().to_string(),
            None => header.chars().take(max_len).collect(),
        };
        hits.entry(symbol).or_default().record(hunk);
    }
    hits
}

// ── Per-commit attribution ─────────────────────────────────────────

/// Rows and quality flags produced for one (commit, file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttribution {
    pub rows: Vec<SymbolTouchRow>,
    pub flags: BTreeSet<QualityFlag>,
}

/// Turn one commit's diff of `file` into symbol touch rows.
///
/// `table` is the file's symbol table as of the commit; an empty table
/// switches to header attribution.
pub fn attribute_commit_file(
    commit: &Commit,
    file: &str,
    diff: &str,
    table: &SymbolTable,
    header_max_len: usize,
) -> FileAttribution {
    let mut out = FileAttribution::default();

    if commit.merge_commit {
        out.flags.insert(QualityFlag::MergeSkipped);
        return out;
    }

    let hunks = parse_hunks(diff);
    if hunks.is_empty() {
        debug!(sha = %commit.sha, file, "No hunks for commit");
        return out;
    }

    let (method, mut hits) = match table {
        SymbolTable::Resolved(spans) => (AttributionMethod::Ast, map_hunks_to_symbols(&hunks, spans)),
        SymbolTable::Empty => {
            out.flags.insert(QualityFlag::SymbolFallbackHeader);
            (
                AttributionMethod::HeaderFallback,
                symbols_from_hunk_headers(&hunks, header_max_len),
            )
        }
    };

    if hits.is_empty() {
        out.flags.insert(QualityFlag::SymbolUnresolved);
        let mut all = SymbolHits::default();
        for hunk in &hunks {
            all.record(hunk);
        }
        hits.insert(UNKNOWN_SYMBOL.to_string(), all);
    }

    if commit.binary_numstat {
        out.flags.insert(QualityFlag::BinaryNumstatPresent);
    }

    // Only span attribution can narrow line counts; header and unknown rows
    // carry every line changed in the file.
    let mut whole_file = SymbolHits::default();
    for hunk in &hunks {
        whole_file.record(hunk);
    }

    let flags: Vec<QualityFlag> = out.flags.iter().copied().collect();
    out.rows = hits
        .into_iter()
        .map(|(symbol_id, hit)| {
            let (added, deleted) = if method == AttributionMethod::Ast {
                (hit.added, hit.deleted)
            } else {
                (whole_file.added, whole_file.deleted)
            };
            SymbolTouchRow {
                repo: commit.repo.clone(),
                sha: commit.sha.clone(),
                ts: commit.ts,
                file: file.to_string(),
                symbol_id,
                touches: hit.touches,
                added,
                deleted,
                churn: added + deleted,
                extractor: method,
                flags: flags.clone(),
            }
        })
        .collect();

    debug!(
        sha = %commit.sha,
        file,
        method = method.as_str(),
        symbols = out.rows.len(),
        "Attributed commit"
    );
    out
}

// ── Roll-up ────────────────────────────────────────────────────────

/// Roll touch rows up per symbol, busiest first.
pub fn aggregate_rows(rows: &[SymbolTouchRow]) -> Vec<SymbolRollup> {
    let mut grouped: HashMap<&str, (SymbolRollup, Vec<DateTime<Utc>>)> = HashMap::new();

    for row in rows {
        let (agg, stamps) = grouped.entry(row.symbol_id.as_str()).or_insert_with(|| {
            (
                SymbolRollup {
                    symbol_id: row.symbol_id.clone(),
                    touches: 0,
                    added: 0,
                    deleted: 0,
                    churn: 0,
                    first_touch: row.ts,
                    last_touch: row.ts,
                    avg_gap_days: None,
                },
                Vec::new(),
            )
        });
        agg.touches += u64::from(row.touches);
        agg.added += row.added;
        agg.deleted += row.deleted;
        agg.churn += row.churn;
        agg.first_touch = agg.first_touch.min(row.ts);
        agg.last_touch = agg.last_touch.max(row.ts);
        stamps.push(row.ts);
    }

    let mut rollups: Vec<SymbolRollup> = grouped
        .into_values()
        .map(|(mut agg, mut stamps)| {
            stamps.sort();
            if stamps.len() >= 2 {
                let gaps: Vec<f64> = stamps
                    .windows(2)
                    .map(|w| (w[1] - w[0]).num_seconds() as f64 / 86_400.0)
                    .collect();
                agg.avg_gap_days = Some(round4(gaps.iter().sum::<f64>() / gaps.len() as f64));
            }
            agg
        })
        .collect();

    rollups.sort_by(|a, b| {
        (b.touches, b.churn)
            .cmp(&(a.touches, a.churn))
            .then_with(|| a.symbol_id.cmp(&b.symbol_id))
    });
    rollups
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::TimeZone;
    use timelapse_graphs::{SymbolExtractor, SymbolKind};

    use super::*;

    fn hunk(header: &str, added: &[usize], deleted: &[usize]) -> DiffHunk {
        DiffHunk {
            old_start: deleted.first().copied().unwrap_or(0),
            old_count: deleted.len(),
            new_start: added.first().copied().unwrap_or(0),
            new_count: added.len(),
            header: header.to_string(),
            added_lines: added.to_vec(),
            deleted_lines: deleted.to_vec(),
        }
    }

    fn span(name: &str, start: usize, end: usize) -> SymbolSpan {
        SymbolSpan {
            name: name.to_string(),
            kind: SymbolKind::Function,
            start_line: start,
            end_line: end,
        }
    }

    fn commit(day: u32) -> Commit {
        Commit::new(
            "bot",
            format!("{day:0>40}"),
            Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap(),
            "change",
        )
        .with_file("app.py", 1, 1)
    }

    #[test]
    fn nested_spans_are_all_credited_once_per_hunk() {
        let spans = [span("A", 1, 10), span("A.f", 2, 4), span("g", 12, 14)];
        let hunks = [hunk("", &[2, 3], &[2]), hunk("", &[9], &[])];
        let hits = map_hunks_to_symbols(&hunks, &spans);

        assert_eq!(hits["A"], SymbolHits { touches: 2, added: 3, deleted: 1 });
        assert_eq!(hits["A.f"], SymbolHits { touches: 1, added: 2, deleted: 1 });
        assert!(!hits.contains_key("g"));
    }

    #[test]
    fn span_bounds_are_inclusive() {
        let spans = [span("f", 5, 7)];
        assert!(map_hunks_to_symbols(&[hunk("", &[7], &[])], &spans).contains_key("f"));
        assert!(map_hunks_to_symbols(&[hunk("", &[], &[5])], &spans).contains_key("f"));
        assert!(map_hunks_to_symbols(&[hunk("", &[8], &[4])], &spans).is_empty());
    }

    #[test]
    fn header_keywords_across_languages() {
        let hunks = [
            hunk("function demo", &[10, 11], &[10]),
            hunk("class Service(Base):", &[1], &[]),
            hunk("pub async fn handle(req: Request) {", &[1], &[]),
            hunk("func (s *Server) Serve(l net.Listener) error {", &[1], &[]),
            hunk("impl<T> Cache<T> {", &[1], &[]),
            hunk("undefined_thing = 1", &[1], &[]),
            hunk("", &[1], &[]),
        ];
        let hits = symbols_from_hunk_headers(&hunks, 80);

        assert_eq!(hits["demo"], SymbolHits { touches: 1, added: 2, deleted: 1 });
        assert!(hits.contains_key("Service"));
        assert!(hits.contains_key("handle"));
        assert!(hits.contains_key("Serve"));
        assert!(hits.contains_key("Cache"));
        assert!(hits.contains_key("undefined_thing = 1"));
        assert_eq!(hits.len(), 6);
    }

    #[test]
    fn opaque_headers_are_truncated() {
        let long = "x".repeat(120);
        let hits = symbols_from_hunk_headers(&[hunk(&long, &[1], &[])], 80);
        let key = hits.keys().next().unwrap();
        assert_eq!(key.chars().count(), 80);
    }

    #[test]
    fn ast_attribution_rows() {
        let source = "class A:\n    def f(self):\n        return 1\n\ndef g():\n    return 2\n";
        let table = SymbolExtractor::new().extract(Path::new("app.py"), source);
        let diff = "@@ -3 +3 @@ def f(self):\n-        return 0\n+        return 1\n";

        let out = attribute_commit_file(&commit(2), "app.py", diff, &table, 80);
        assert!(out.flags.is_empty());
        let ids: Vec<_> = out.rows.iter().map(|r| r.symbol_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "A.f"]);

        let row = &out.rows[1];
        assert_eq!(row.extractor, AttributionMethod::Ast);
        assert_eq!((row.touches, row.added, row.deleted, row.churn), (1, 1, 1, 2));
        assert_eq!(row.file, "app.py");
        assert!(row.flags.is_empty());
    }

    #[test]
    fn header_fallback_when_table_is_empty() {
        let diff = "@@ -10,2 +10,2 @@ function demo\n-a\n-b\n+c\n+d\n";
        let out = attribute_commit_file(&commit(2), "app.js", diff, &SymbolTable::Empty, 80);

        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].symbol_id, "demo");
        assert_eq!(out.rows[0].extractor, AttributionMethod::HeaderFallback);
        assert_eq!(out.rows[0].flags, vec![QualityFlag::SymbolFallbackHeader]);
        assert!(out.flags.contains(&QualityFlag::SymbolFallbackHeader));
    }

    #[test]
    fn header_rows_carry_whole_file_line_counts() {
        let diff = "@@ -10,2 +10,1 @@ def alpha():\n-a\n-b\n+c\n\
                    @@ -30 +29,3 @@ def beta():\n-d\n+e\n+f\n+g\n\
                    @@ -50 +52 @@ def beta():\n-h\n+i\n";
        let out = attribute_commit_file(&commit(2), "app.py", diff, &SymbolTable::Empty, 80);

        let rows: Vec<_> = out
            .rows
            .iter()
            .map(|r| (r.symbol_id.as_str(), r.touches, r.added, r.deleted, r.churn))
            .collect();
        assert_eq!(rows, vec![("alpha", 1, 5, 4, 9), ("beta", 2, 5, 4, 9)]);
    }

    #[test]
    fn unresolved_hunks_go_to_unknown() {
        let diff = "@@ -1 +1 @@\n-a\n+b\n@@ -20 +20 @@\n-c\n+d\n";
        let mut c = commit(2);
        c.record_file("logo.png", None, None);

        let out = attribute_commit_file(&c, "app.py", diff, &SymbolTable::Empty, 80);
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.symbol_id, UNKNOWN_SYMBOL);
        assert_eq!((row.touches, row.churn), (2, 4));
        assert_eq!(
            row.flags,
            vec![
                QualityFlag::BinaryNumstatPresent,
                QualityFlag::SymbolFallbackHeader,
                QualityFlag::SymbolUnresolved,
            ]
        );
    }

    #[test]
    fn merges_and_empty_diffs_produce_no_rows() {
        let merge = commit(2).with_merge(true);
        let out = attribute_commit_file(&merge, "app.py", "@@ -1 +1 @@\n-a\n+b\n", &SymbolTable::Empty, 80);
        assert!(out.rows.is_empty());
        assert_eq!(out.flags.into_iter().collect::<Vec<_>>(), vec![QualityFlag::MergeSkipped]);

        let out = attribute_commit_file(&commit(2), "app.py", "", &SymbolTable::Empty, 80);
        assert_eq!(out, FileAttribution::default());
    }

    fn row(symbol: &str, day: u32, touches: u32, churn: u64) -> SymbolTouchRow {
        SymbolTouchRow {
            repo: "bot".into(),
            sha: format!("{day:0>40}"),
            ts: Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap(),
            file: "app.py".into(),
            symbol_id: symbol.into(),
            touches,
            added: churn,
            deleted: 0,
            churn,
            extractor: AttributionMethod::Ast,
            flags: Vec::new(),
        }
    }

    #[test]
    fn aggregate_sums_and_orders() {
        let rows = [
            row("g", 1, 1, 5),
            row("A.f", 4, 1, 2),
            row("A.f", 1, 1, 2),
            row("A.f", 2, 1, 2),
            row("b", 3, 1, 5),
        ];
        let rollups = aggregate_rows(&rows);
        let ids: Vec<_> = rollups.iter().map(|r| r.symbol_id.as_str()).collect();
        assert_eq!(ids, vec!["A.f", "b", "g"]);

        let f = &rollups[0];
        assert_eq!((f.touches, f.churn), (3, 6));
        assert_eq!(f.first_touch, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(f.last_touch, Utc.with_ymd_and_hms(2026, 1, 4, 0, 0, 0).unwrap());
        assert_eq!(f.avg_gap_days, Some(1.5));
        assert_eq!(rollups[1].avg_gap_days, None);
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        assert!(aggregate_rows(&[]).is_empty());
    }
}
