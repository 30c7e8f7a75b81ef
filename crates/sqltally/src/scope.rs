//! Per-test lifecycle guard.

use crate::assertions::DbAssertions;
use crate::error::AssertionError;

/// RAII guard for one test case.
///
/// Creating the scope clears every counter. Dropping it runs the
/// end-of-test residual check and panics if statements were left
/// unasserted, unless the thread is already panicking (the test has failed
/// for another reason and the residual noise would only hide it).
///
/// # Example
///
/// ```
/// use sqltally::{DbAssertions, StatementInspector};
///
/// let db = DbAssertions::new();
/// let inspector = db.collector();
///
/// {
///     let _scope = db.scope();
///     inspector.inspect("insert into lazy_posts (title,id) values (?,?)");
///     db.assert_insert_count(1, Some("lazy_posts"));
///     // Dropping `_scope` verifies nothing else was recorded.
/// }
/// ```
#[must_use = "the residual check runs when the scope is dropped"]
pub struct TestScope<'a> {
    db: &'a DbAssertions,
    finished: bool,
}

impl<'a> TestScope<'a> {
    pub(crate) fn new(db: &'a DbAssertions) -> Self {
        db.before_each();
        tracing::debug!(target: "sqltally::scope", "test scope started");
        Self {
            db,
            finished: false,
        }
    }

    /// Run the residual check now and return its result instead of panicking
    /// on drop.
    pub fn finish(mut self) -> Result<(), AssertionError> {
        self.finished = true;
        self.db.after_each(false)
    }
}

impl Drop for TestScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let failing = std::thread::panicking();
        if let Err(e) = self.db.after_each(failing) {
            panic!("{e}");
        }
    }
}
