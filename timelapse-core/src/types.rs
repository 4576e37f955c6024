use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Time ───────────────────────────────────────────────────────────

/// Half-open `[start, end)` interval of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days leading up to `end`, or `None` when the start would
    /// fall outside the representable time range.
    pub fn last_days(end: DateTime<Utc>, days: i64) -> Option<Self> {
        let start = end.checked_sub_signed(Duration::try_days(days)?)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Whole days covered, never less than one.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// Accepts `Z` and numeric offsets; a timestamp without an offset is taken
/// to be UTC already.
pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ── Commit ─────────────────────────────────────────────────────────

/// Insertions and deletions recorded for one file in one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub insertions: u64,
    pub deletions: u64,
}

/// One historical change, as read from `git log --numstat`.
///
/// `files` keeps first-seen order with no duplicates; `file_stats` holds the
/// per-file counts and is not part of the serialized record. Per-file
/// counts always sum to `insertions`/`deletions`: binary entries count as
/// zero and set `binary_numstat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub repo: String,
    pub sha: String,
    pub ts: DateTime<Utc>,
    pub subject: String,
    pub files: Vec<String>,
    pub insertions: u64,
    pub deletions: u64,
    pub binary_numstat: bool,
    pub merge_commit: bool,
    #[serde(skip)]
    pub file_stats: HashMap<String, FileStat>,
}

impl Commit {
    pub fn new(
        repo: impl Into<String>,
        sha: impl Into<String>,
        ts: DateTime<Utc>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            sha: sha.into(),
            ts,
            subject: subject.into(),
            files: Vec::new(),
            insertions: 0,
            deletions: 0,
            binary_numstat: false,
            merge_commit: false,
            file_stats: HashMap::new(),
        }
    }

    /// Record one numstat entry. `None` marks a field that was not an
    /// integer (git prints `-` for binary files).
    pub fn record_file(&mut self, path: &str, insertions: Option<u64>, deletions: Option<u64>) {
        if insertions.is_none() || deletions.is_none() {
            self.binary_numstat = true;
        }
        let ins = insertions.unwrap_or(0);
        let dels = deletions.unwrap_or(0);

        let stat = self.file_stats.entry(path.to_string()).or_insert_with(|| {
            self.files.push(path.to_string());
            FileStat::default()
        });
        stat.insertions += ins;
        stat.deletions += dels;

        self.insertions += ins;
        self.deletions += dels;
    }

    /// Builder form of [`Commit::record_file`] for integer counts.
    #[must_use]
    pub fn with_file(mut self, path: &str, insertions: u64, deletions: u64) -> Self {
        self.record_file(path, Some(insertions), Some(deletions));
        self
    }

    #[must_use]
    pub fn with_merge(mut self, merge_commit: bool) -> Self {
        self.merge_commit = merge_commit;
        self
    }

    pub fn touches(&self, path: &str) -> bool {
        self.file_stats.contains_key(path)
    }

    pub fn file_stat(&self, path: &str) -> FileStat {
        self.file_stats.get(path).copied().unwrap_or_default()
    }
}

// ── External events ────────────────────────────────────────────────

/// A timestamped prompt or other external event tagged with a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEvent {
    pub repo: String,
    pub ts: DateTime<Utc>,
    pub source: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

// ── Diff hunks ─────────────────────────────────────────────────────

/// One `@@` region of a zero-context unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    /// Text after the closing `@@`, usually the enclosing signature.
    pub header: String,
    /// New-file line numbers, strictly increasing.
    pub added_lines: Vec<usize>,
    /// Old-file line numbers, strictly increasing.
    pub deleted_lines: Vec<usize>,
}

impl DiffHunk {
    /// Union of added and deleted line numbers.
    pub fn changed_lines(&self) -> BTreeSet<usize> {
        self.added_lines
            .iter()
            .chain(&self.deleted_lines)
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added_lines.is_empty() && self.deleted_lines.is_empty()
    }
}

// ── Symbol attribution ─────────────────────────────────────────────

/// Data-quality markers attached to attribution output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// At least one numstat line had non-integer counts.
    BinaryNumstatPresent,
    /// A merge commit was not attributed.
    MergeSkipped,
    /// Symbols came from hunk headers instead of a syntax tree.
    SymbolFallbackHeader,
    /// Nothing could be attributed; churn went to `unknown`.
    SymbolUnresolved,
}

impl QualityFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BinaryNumstatPresent => "binary_numstat_present",
            Self::MergeSkipped => "merge_skipped",
            Self::SymbolFallbackHeader => "symbol_fallback_header",
            Self::SymbolUnresolved => "symbol_unresolved",
        }
    }
}

impl std::fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a row's symbol was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMethod {
    Ast,
    HeaderFallback,
}

impl AttributionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ast => "ast",
            Self::HeaderFallback => "header_fallback",
        }
    }
}

/// Contribution of one commit to one symbol of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTouchRow {
    pub repo: String,
    pub sha: String,
    pub ts: DateTime<Utc>,
    pub file: String,
    pub symbol_id: String,
    /// Distinct hunks attributed to the symbol in this commit.
    pub touches: u32,
    pub added: u64,
    pub deleted: u64,
    pub churn: u64,
    pub extractor: AttributionMethod,
    pub flags: Vec<QualityFlag>,
}

/// Per-symbol aggregate over all touch rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRollup {
    pub symbol_id: String,
    pub touches: u64,
    pub added: u64,
    pub deleted: u64,
    pub churn: u64,
    pub first_touch: DateTime<Utc>,
    pub last_touch: DateTime<Utc>,
    /// Mean days between consecutive touches; absent below two touches.
    pub avg_gap_days: Option<f64>,
}
