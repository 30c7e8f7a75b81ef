//! Thread-safe statement counters.
//!
//! [`StatementStatistics`] keeps one atomic counter per [`StatementShape`].
//! Recording is safe from any number of threads; a counter is only ever
//! incremented by [`StatementStatistics::record`] and only ever removed by a
//! consuming count or [`StatementStatistics::clear_all`].
//!
//! # Example
//!
//! ```
//! use sqltally_core::{CountQuery, OperationKind, StatementShape, StatementStatistics};
//!
//! let stats = StatementStatistics::new();
//! stats.record(StatementShape::new(OperationKind::Insert, "lazy_posts"));
//! stats.record(StatementShape::new(OperationKind::Insert, "lazy_post_comments"));
//! stats.record(StatementShape::new(OperationKind::Insert, "lazy_post_comments"));
//!
//! assert_eq!(stats.count(&CountQuery::insert("lazy_post_comments").peek()), 2);
//! assert_eq!(stats.count(&CountQuery::all(OperationKind::Insert)), 3);
//! // The previous count consumed every insert counter.
//! assert_eq!(stats.count(&CountQuery::all(OperationKind::Insert)), 0);
//! ```

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::shape::{OperationKind, StatementShape};
use crate::snapshot::StatisticsSnapshot;

/// Selects which counters a [`StatementStatistics::count`] call sums.
///
/// Defaults to strict join matching and consuming reads, which is what an
/// assertion wants. Use [`CountQuery::lenient`] to ignore joins and
/// [`CountQuery::peek`] to leave the counters in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    kind: OperationKind,
    table: Option<String>,
    joins: Vec<String>,
    strict: bool,
    consume: bool,
}

impl CountQuery {
    /// Count statements of `kind` against `table`, or against every table
    /// when `table` is `None`.
    pub fn new(kind: OperationKind, table: Option<&str>) -> Self {
        Self {
            kind,
            table: table.map(str::to_ascii_lowercase),
            joins: Vec::new(),
            strict: true,
            consume: true,
        }
    }

    /// Count statements of `kind` across all tables.
    pub fn all(kind: OperationKind) -> Self {
        Self::new(kind, None)
    }

    /// Selects against `table`.
    pub fn select(table: &str) -> Self {
        Self::new(OperationKind::Select, Some(table))
    }

    /// Inserts into `table`.
    pub fn insert(table: &str) -> Self {
        Self::new(OperationKind::Insert, Some(table))
    }

    /// Updates of `table`.
    pub fn update(table: &str) -> Self {
        Self::new(OperationKind::Update, Some(table))
    }

    /// Deletes from `table`.
    pub fn delete(table: &str) -> Self {
        Self::new(OperationKind::Delete, Some(table))
    }

    /// `nextval` calls on `sequence`.
    pub fn next_val(sequence: &str) -> Self {
        Self::new(OperationKind::Sequence, Some(sequence))
    }

    /// Require exactly this join set (order-independent).
    #[must_use]
    pub fn joins<I, S>(mut self, joins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.joins = joins
            .into_iter()
            .map(|j| j.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Sum every join shape of the table, ignoring the requested joins.
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Set strict join matching explicitly.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Leave matching counters in place after reading them.
    #[must_use]
    pub fn peek(mut self) -> Self {
        self.consume = false;
        self
    }

    /// Set whether matching counters are removed after reading.
    #[must_use]
    pub fn consume(mut self, consume: bool) -> Self {
        self.consume = consume;
        self
    }

    /// The operation kind being counted.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The table filter, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The requested join set.
    #[must_use]
    pub fn join_list(&self) -> &[String] {
        &self.joins
    }

    /// Whether join sets must match exactly.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether the read removes the counters it sums.
    #[must_use]
    pub fn is_consuming(&self) -> bool {
        self.consume
    }

    /// Whether `shape` contributes to this query's sum.
    #[must_use]
    pub fn matches(&self, shape: &StatementShape) -> bool {
        if shape.kind() != self.kind {
            return false;
        }
        match &self.table {
            None => true,
            Some(table) if shape.table() != table => false,
            Some(_) if self.strict => shape.joins_match(&self.joins),
            Some(_) => true,
        }
    }
}

/// Per-shape statement counters shared by every connection of a test run.
///
/// The map is guarded by an `RwLock`, but incrementing an existing counter
/// only takes the read lock and performs a single atomic add, so concurrent
/// recorders of the same shape never lose an increment.
#[derive(Debug, Default)]
pub struct StatementStatistics {
    counters: RwLock<HashMap<StatementShape, AtomicU64>>,
}

impl StatementStatistics {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `shape` by one.
    pub fn record(&self, shape: StatementShape) {
        {
            let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(counter) = counters.get(&shape) {
                counter.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(shape)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `nextval` call on `sequence`.
    pub fn record_next_val(&self, sequence: &str) {
        self.record(StatementShape::new(OperationKind::Sequence, sequence));
    }

    /// Sum the counters selected by `query`.
    ///
    /// A consuming query removes every counter it summed, so an identical
    /// query issued right after returns 0.
    pub fn count(&self, query: &CountQuery) -> u64 {
        if query.is_consuming() {
            let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
            let mut total = 0;
            counters.retain(|shape, counter| {
                if query.matches(shape) {
                    total += counter.load(Ordering::Relaxed);
                    false
                } else {
                    true
                }
            });
            tracing::trace!(
                target: "sqltally::stats",
                kind = %query.kind(),
                table = query.table().unwrap_or("*"),
                strict = query.is_strict(),
                total,
                "consumed counters"
            );
            total
        } else {
            let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
            counters
                .iter()
                .filter(|(shape, _)| query.matches(shape))
                .map(|(_, counter)| counter.load(Ordering::Relaxed))
                .sum()
        }
    }

    /// `nextval` calls on `sequence`, or on every sequence when `None`.
    ///
    /// Sequence shapes never carry joins, so `strict` only matters for
    /// symmetry with [`CountQuery`].
    pub fn next_val_count(&self, sequence: Option<&str>, strict: bool, consume: bool) -> u64 {
        self.count(
            &CountQuery::new(OperationKind::Sequence, sequence)
                .strict(strict)
                .consume(consume),
        )
    }

    /// Remove every counter.
    pub fn clear_all(&self) {
        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        let dropped = counters.len();
        counters.clear();
        tracing::debug!(target: "sqltally::stats", shapes = dropped, "cleared statement counters");
    }

    /// Whether no statement has been recorded since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Total number of recorded statements of every kind.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Copy the current counters.
    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        StatisticsSnapshot::from_counts(
            counters
                .iter()
                .map(|(shape, counter)| (shape.clone(), counter.load(Ordering::Relaxed))),
        )
    }

    /// Multi-line breakdown of table operations, restricted to `table` when
    /// given. Never empty: reports "No operations recorded" instead.
    #[must_use]
    pub fn render_summary(&self, table: Option<&str>) -> String {
        self.snapshot().render_tables(table)
    }

    /// Multi-line breakdown of `nextval` calls, restricted to `sequence` when
    /// given.
    #[must_use]
    pub fn render_sequence_summary(&self, sequence: Option<&str>) -> String {
        self.snapshot().render_sequences(sequence)
    }

    /// Table and sequence breakdown together.
    #[must_use]
    pub fn render_full_summary(&self, name: Option<&str>) -> String {
        let snapshot = self.snapshot();
        format!(
            "{}\n{}",
            snapshot.render_tables(name),
            snapshot.render_sequences(name)
        )
    }
}
