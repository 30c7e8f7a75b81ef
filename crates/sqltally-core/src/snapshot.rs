//! Point-in-time copies of the statement counters and their summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shape::{OperationKind, StatementShape};

/// One counter in a [`StatisticsSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Operation kind of the counted statements.
    pub kind: OperationKind,
    /// Primary table, or sequence name for `nextval` calls.
    pub table: String,
    /// Joined tables in order of first appearance.
    pub joins: Vec<String>,
    /// Number of statements recorded with this shape.
    pub count: u64,
}

/// Sorted copy of every counter at the time it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Entries ordered by table, then kind, then join list.
    pub entries: Vec<SnapshotEntry>,
}

/// Per-table totals used by the summary.
#[derive(Default)]
struct TableTotals<'a> {
    select: u64,
    insert: u64,
    update: u64,
    delete: u64,
    selects_by_joins: Vec<&'a SnapshotEntry>,
}

impl StatisticsSnapshot {
    /// Build a snapshot from `(shape, count)` pairs.
    pub fn from_counts(counts: impl IntoIterator<Item = (StatementShape, u64)>) -> Self {
        let mut entries: Vec<SnapshotEntry> = counts
            .into_iter()
            .map(|(shape, count)| SnapshotEntry {
                kind: shape.kind(),
                table: shape.table().to_string(),
                joins: shape.joins().to_vec(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| {
            (&a.table, a.kind, &a.joins).cmp(&(&b.table, b.kind, &b.joins))
        });
        Self { entries }
    }

    /// Whether the snapshot holds no counters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every counter.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn filtered<'a>(
        &'a self,
        name: Option<&'a str>,
        sequences: bool,
    ) -> impl Iterator<Item = &'a SnapshotEntry> + 'a {
        let name = name.map(str::to_ascii_lowercase);
        self.entries.iter().filter(move |e| {
            (e.kind == OperationKind::Sequence) == sequences
                && name.as_deref().is_none_or(|n| e.table == n)
        })
    }

    /// Table breakdown: per table select/insert/update/delete totals, then
    /// every distinct select join set with its count.
    ///
    /// ```text
    /// Recorded operations:
    ///   lazy_posts: 2 select(s), 1 insert(s), 0 update(s), 0 delete(s)
    ///     select with no joins: 1
    ///     select join(s) lazy_post_comments: 1
    /// ```
    #[must_use]
    pub fn render_tables(&self, table: Option<&str>) -> String {
        let mut tables: BTreeMap<&str, TableTotals<'_>> = BTreeMap::new();
        for entry in self.filtered(table, false) {
            let totals = tables.entry(entry.table.as_str()).or_default();
            match entry.kind {
                OperationKind::Select => {
                    totals.select += entry.count;
                    totals.selects_by_joins.push(entry);
                }
                OperationKind::Insert => totals.insert += entry.count,
                OperationKind::Update => totals.update += entry.count,
                OperationKind::Delete => totals.delete += entry.count,
                OperationKind::Sequence => {}
            }
        }

        if tables.is_empty() {
            return match table {
                Some(t) => format!("No operations recorded for {t}"),
                None => "No operations recorded".to_string(),
            };
        }

        let mut out = String::from("Recorded operations:");
        for (name, totals) in &tables {
            out.push_str(&format!(
                "\n  {name}: {} select(s), {} insert(s), {} update(s), {} delete(s)",
                totals.select, totals.insert, totals.update, totals.delete
            ));
            for entry in &totals.selects_by_joins {
                let joins = if entry.joins.is_empty() {
                    "with no joins".to_string()
                } else {
                    format!("join(s) {}", entry.joins.join(", "))
                };
                out.push_str(&format!("\n    select {joins}: {}", entry.count));
            }
        }
        out
    }

    /// Sequence breakdown: `nextval` calls per sequence.
    #[must_use]
    pub fn render_sequences(&self, sequence: Option<&str>) -> String {
        let mut sequences: BTreeMap<&str, u64> = BTreeMap::new();
        for entry in self.filtered(sequence, true) {
            *sequences.entry(entry.table.as_str()).or_default() += entry.count;
        }

        if sequences.is_empty() {
            return match sequence {
                Some(s) => format!("No sequence calls recorded for {s}"),
                None => "No sequence calls recorded".to_string(),
            };
        }

        let mut out = String::from("Recorded sequence calls:");
        for (name, count) in &sequences {
            out.push_str(&format!("\n  {name}: {count} nextval(s)"));
        }
        out
    }
}
