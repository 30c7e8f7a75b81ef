//! The statement inspection hook.
//!
//! A persistence runtime calls [`StatementInspector::inspect`] once per SQL
//! statement, right before executing it. The inspector only observes: the
//! returned text is always the text it was given.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sqltally::{CountQuery, StatementInspector, StatementStatistics, StatisticsCollector};
//!
//! let stats = Arc::new(StatementStatistics::new());
//! let collector = StatisticsCollector::new(Arc::clone(&stats));
//!
//! let sql = "select nextval('seq_posts')";
//! assert_eq!(collector.inspect(sql), sql);
//! assert_eq!(stats.count(&CountQuery::next_val("seq_posts")), 1);
//! ```

use std::sync::Arc;

use sqltally_core::{StatementStatistics, classify};

use crate::config::InspectorConfig;

/// Observation point for SQL statements about to be executed.
pub trait StatementInspector: Send + Sync {
    /// Observe `sql` and hand it back unchanged.
    fn inspect<'a>(&self, sql: &'a str) -> &'a str;
}

impl<T: StatementInspector + ?Sized> StatementInspector for &T {
    fn inspect<'a>(&self, sql: &'a str) -> &'a str {
        (**self).inspect(sql)
    }
}

impl<T: StatementInspector + ?Sized> StatementInspector for Arc<T> {
    fn inspect<'a>(&self, sql: &'a str) -> &'a str {
        (**self).inspect(sql)
    }
}

impl<T: StatementInspector + ?Sized> StatementInspector for Box<T> {
    fn inspect<'a>(&self, sql: &'a str) -> &'a str {
        (**self).inspect(sql)
    }
}

/// Inspector that classifies each statement and records it in a shared
/// [`StatementStatistics`].
///
/// Cloning is cheap; clones record into the same store, so one collector can
/// be handed to every connection of a test run.
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    statistics: Arc<StatementStatistics>,
    config: InspectorConfig,
}

impl StatisticsCollector {
    /// Collector with the default configuration.
    #[must_use]
    pub fn new(statistics: Arc<StatementStatistics>) -> Self {
        Self::with_config(statistics, InspectorConfig::default())
    }

    /// Collector with an explicit configuration.
    #[must_use]
    pub fn with_config(statistics: Arc<StatementStatistics>, config: InspectorConfig) -> Self {
        Self { statistics, config }
    }

    /// The store this collector records into.
    #[must_use]
    pub fn statistics(&self) -> &Arc<StatementStatistics> {
        &self.statistics
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }
}

impl StatementInspector for StatisticsCollector {
    fn inspect<'a>(&self, sql: &'a str) -> &'a str {
        if self.config.log_statements {
            tracing::info!(target: "sqltally::inspect", sql, "new statement");
        }
        if !self.config.enabled {
            return sql;
        }

        match classify(sql) {
            Some(shape) => {
                tracing::debug!(
                    target: "sqltally::inspect",
                    kind = %shape.kind(),
                    table = shape.table(),
                    joins = ?shape.joins(),
                    "recorded statement"
                );
                self.statistics.record(shape);
            }
            None => {
                tracing::trace!(target: "sqltally::inspect", sql, "unrecognized statement, not counted");
            }
        }
        sql
    }
}
