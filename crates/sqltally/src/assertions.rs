//! Statement count assertions for tests.
//!
//! [`DbAssertions`] owns the shared [`StatementStatistics`] for a test run and
//! hands out [`StatisticsCollector`]s to wire into the persistence runtime.
//! Every `check_*` call is consuming: the counters it compared are removed,
//! so a later check in the same test only sees statements issued after it.
//!
//! # Example
//!
//! ```
//! use sqltally::{DbAssertions, StatementInspector};
//!
//! let db = DbAssertions::new();
//! let inspector = db.collector();
//!
//! db.before_each();
//! inspector.inspect("select p1_0.id,p1_0.title from lazy_posts p1_0 where p1_0.id=?");
//! db.check_query_count(1, Some("lazy_posts"), &[]).unwrap();
//! db.check_query_count(0, Some("lazy_post_comments"), &[]).unwrap();
//! db.after_each(false).unwrap();
//! ```

use std::sync::Arc;

use sqltally_core::{CountQuery, OperationKind, StatementStatistics};

use crate::config::InspectorConfig;
use crate::error::{AssertionError, OperationType};
use crate::inspector::StatisticsCollector;
use crate::scope::TestScope;

/// Count assertions over a shared statement store.
#[derive(Debug, Clone)]
pub struct DbAssertions {
    statistics: Arc<StatementStatistics>,
    config: InspectorConfig,
}

impl Default for DbAssertions {
    fn default() -> Self {
        Self::new()
    }
}

impl DbAssertions {
    /// Assertions over a fresh store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InspectorConfig::default())
    }

    /// Assertions over a fresh store.
    #[must_use]
    pub fn with_config(config: InspectorConfig) -> Self {
        Self::from_statistics(Arc::new(StatementStatistics::new()), config)
    }

    /// Assertions over an existing store.
    #[must_use]
    pub fn from_statistics(statistics: Arc<StatementStatistics>, config: InspectorConfig) -> Self {
        Self { statistics, config }
    }

    /// A collector recording into this store, for the persistence runtime.
    #[must_use]
    pub fn collector(&self) -> StatisticsCollector {
        StatisticsCollector::with_config(Arc::clone(&self.statistics), self.config.clone())
    }

    /// The underlying store.
    #[must_use]
    pub fn statistics(&self) -> &Arc<StatementStatistics> {
        &self.statistics
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Reset all counters. Call at the start of every test case.
    pub fn before_each(&self) {
        self.statistics.clear_all();
    }

    /// End-of-test hook: unless the test already failed, require that every
    /// recorded statement was consumed by an assertion.
    pub fn after_each(&self, test_failed: bool) -> Result<(), AssertionError> {
        if test_failed || !self.config.residual_check {
            return Ok(());
        }
        self.check_no_interactions()
    }

    /// Start a test case; see [`TestScope`].
    #[must_use]
    pub fn scope(&self) -> TestScope<'_> {
        TestScope::new(self)
    }

    /// Selects against `table` with exactly `joins`, or all selects when
    /// `table` is `None`.
    pub fn check_query_count(
        &self,
        expected: u64,
        table: Option<&str>,
        joins: &[&str],
    ) -> Result<(), AssertionError> {
        let query = CountQuery::new(OperationKind::Select, table).joins(joins.iter().copied());
        self.check(OperationType::Query, expected, &query)
    }

    /// Inserts into `table`, or all inserts.
    pub fn check_insert_count(
        &self,
        expected: u64,
        table: Option<&str>,
    ) -> Result<(), AssertionError> {
        self.check(
            OperationType::Insert,
            expected,
            &CountQuery::new(OperationKind::Insert, table),
        )
    }

    /// Updates of `table`, or all updates.
    pub fn check_update_count(
        &self,
        expected: u64,
        table: Option<&str>,
    ) -> Result<(), AssertionError> {
        self.check(
            OperationType::Update,
            expected,
            &CountQuery::new(OperationKind::Update, table),
        )
    }

    /// Deletes from `table`, or all deletes.
    pub fn check_delete_count(
        &self,
        expected: u64,
        table: Option<&str>,
    ) -> Result<(), AssertionError> {
        self.check(
            OperationType::Delete,
            expected,
            &CountQuery::new(OperationKind::Delete, table),
        )
    }

    /// `nextval` calls on `sequence`, or on all sequences.
    pub fn check_next_val_count(
        &self,
        expected: u64,
        sequence: Option<&str>,
    ) -> Result<(), AssertionError> {
        self.check(
            OperationType::NextVal,
            expected,
            &CountQuery::new(OperationKind::Sequence, sequence),
        )
    }

    /// Require that nothing at all was recorded (since the last consuming
    /// checks). Consumes everything it finds.
    pub fn check_no_interactions(&self) -> Result<(), AssertionError> {
        let summary = self.statistics.render_full_summary(None);
        let actual: u64 = OperationKind::ALL
            .into_iter()
            .map(|kind| self.statistics.count(&CountQuery::all(kind)))
            .sum();
        compare(OperationType::Interaction, None, Vec::new(), 0, actual, summary)
    }

    /// Like [`check_query_count`](Self::check_query_count) but panics on mismatch.
    #[track_caller]
    pub fn assert_query_count(&self, expected: u64, table: Option<&str>, joins: &[&str]) {
        fail_on(self.check_query_count(expected, table, joins));
    }

    /// Like [`check_insert_count`](Self::check_insert_count) but panics on mismatch.
    #[track_caller]
    pub fn assert_insert_count(&self, expected: u64, table: Option<&str>) {
        fail_on(self.check_insert_count(expected, table));
    }

    /// Like [`check_update_count`](Self::check_update_count) but panics on mismatch.
    #[track_caller]
    pub fn assert_update_count(&self, expected: u64, table: Option<&str>) {
        fail_on(self.check_update_count(expected, table));
    }

    /// Like [`check_delete_count`](Self::check_delete_count) but panics on mismatch.
    #[track_caller]
    pub fn assert_delete_count(&self, expected: u64, table: Option<&str>) {
        fail_on(self.check_delete_count(expected, table));
    }

    /// Like [`check_next_val_count`](Self::check_next_val_count) but panics on mismatch.
    #[track_caller]
    pub fn assert_next_val_count(&self, expected: u64, sequence: Option<&str>) {
        fail_on(self.check_next_val_count(expected, sequence));
    }

    /// Like [`check_no_interactions`](Self::check_no_interactions) but panics on mismatch.
    #[track_caller]
    pub fn assert_no_interactions(&self) {
        fail_on(self.check_no_interactions());
    }

    fn check(
        &self,
        operation: OperationType,
        expected: u64,
        query: &CountQuery,
    ) -> Result<(), AssertionError> {
        // Rendered before counting: the count consumes what the summary shows.
        let summary = match operation {
            OperationType::NextVal => self.statistics.render_sequence_summary(query.table()),
            _ => self.statistics.render_summary(query.table()),
        };
        let actual = self.statistics.count(query);
        compare(
            operation,
            query.table().map(str::to_string),
            query.join_list().to_vec(),
            expected,
            actual,
            summary,
        )
    }
}

fn compare(
    operation: OperationType,
    table: Option<String>,
    joins: Vec<String>,
    expected: u64,
    actual: u64,
    summary: String,
) -> Result<(), AssertionError> {
    if expected == actual {
        return Ok(());
    }
    tracing::warn!(
        target: "sqltally::assert",
        operation = operation.op_name(),
        table = table.as_deref().unwrap_or("*"),
        expected,
        actual,
        "statement count mismatch"
    );
    Err(AssertionError {
        operation,
        table,
        joins,
        expected,
        actual,
        summary,
    })
}

#[track_caller]
fn fail_on(result: Result<(), AssertionError>) {
    if let Err(e) = result {
        panic!("{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::StatementInspector;

    fn run(db: &DbAssertions, statements: &[&str]) {
        let collector = db.collector();
        for sql in statements {
            collector.inspect(sql);
        }
    }

    #[test]
    fn test_check_passes_and_consumes() {
        let db = DbAssertions::new();
        run(&db, &["insert into posts (id) values (?)"]);

        db.check_insert_count(1, Some("posts")).unwrap();
        db.check_insert_count(0, Some("posts")).unwrap();
    }

    #[test]
    fn test_check_mismatch_carries_details() {
        let db = DbAssertions::new();
        run(&db, &["select p.id from posts p join comments c on c.post_id=p.id"]);

        let err = db.check_query_count(1, Some("posts"), &[]).unwrap_err();
        assert_eq!(err.operation, OperationType::Query);
        assert_eq!(err.table.as_deref(), Some("posts"));
        assert_eq!((err.expected, err.actual), (1, 0));
        assert!(err.summary.contains("select join(s) comments: 1"));
        assert!(
            err.to_string()
                .starts_with("Expected 1 query(s) in posts with no joins but was: 0\n")
        );
    }

    #[test]
    fn test_next_val_uses_sequence_summary() {
        let db = DbAssertions::new();
        run(&db, &["select nextval('seq_posts')"]);

        let err = db.check_next_val_count(2, Some("seq_posts")).unwrap_err();
        assert_eq!(err.actual, 1);
        assert!(err.summary.contains("seq_posts: 1 nextval(s)"));
    }

    #[test]
    fn test_after_each_detects_residual_statements() {
        let db = DbAssertions::new();
        run(&db, &["update posts set title=? where id=?", "select nextval('seq_posts')"]);

        let err = db.after_each(false).unwrap_err();
        assert_eq!(err.operation, OperationType::Interaction);
        assert_eq!(err.actual, 2);
        assert!(err.summary.contains("posts: 0 select(s), 0 insert(s), 1 update(s)"));
        assert!(err.summary.contains("seq_posts: 1 nextval(s)"));
        assert!(db.statistics().is_empty());
    }

    #[test]
    fn test_after_each_skipped_for_failed_test() {
        let db = DbAssertions::new();
        run(&db, &["update posts set title=? where id=?"]);
        db.after_each(true).unwrap();
    }

    #[test]
    fn test_residual_check_can_be_disabled() {
        let db = DbAssertions::with_config(InspectorConfig::new().residual_check(false));
        run(&db, &["update posts set title=? where id=?"]);
        db.after_each(false).unwrap();
    }

    #[test]
    fn test_before_each_clears() {
        let db = DbAssertions::new();
        run(&db, &["delete from posts where id=?"]);
        db.before_each();
        db.check_no_interactions().unwrap();
    }

    #[test]
    #[should_panic(expected = "Expected 2 delete(s) in posts but was: 1")]
    fn test_assert_panics_with_message() {
        let db = DbAssertions::new();
        run(&db, &["delete from posts where id=?"]);
        db.assert_delete_count(2, Some("posts"));
    }

    #[test]
    fn test_shared_store() {
        let stats = Arc::new(StatementStatistics::new());
        let db = DbAssertions::from_statistics(Arc::clone(&stats), InspectorConfig::default());
        run(&db, &["insert into posts (id) values (?)"]);
        assert_eq!(stats.total(), 1);
        db.assert_insert_count(1, None);
    }
}
