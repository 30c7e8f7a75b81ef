//! sqltally - count the SQL your ORM actually runs, and assert on it.
//!
//! Wire a [`StatisticsCollector`] into the persistence runtime as its
//! statement inspector. Every statement is classified by operation and table
//! (including joined tables) and counted. Tests then assert exact counts with
//! [`DbAssertions`]; each check consumes what it compared, and a
//! [`TestScope`] fails the test if anything was left unasserted.
//!
//! # Quick Start
//!
//! ```
//! use sqltally::prelude::*;
//!
//! let db = DbAssertions::new();
//! let inspector = db.collector();
//!
//! let scope = db.scope();
//!
//! // Statements as the runtime would issue them for a post with two comments
//! // and sequence-generated ids.
//! for sql in [
//!     "select nextval('seq_posts')",
//!     "select nextval('seq_post_comments')",
//!     "select nextval('seq_post_comments')",
//!     "insert into sequence_posts (title,id) values (?,?)",
//!     "insert into sequence_post_comments (post_id,review,id) values (?,?,?)",
//!     "insert into sequence_post_comments (post_id,review,id) values (?,?,?)",
//! ] {
//!     inspector.inspect(sql);
//! }
//!
//! db.assert_next_val_count(3, None);
//! db.assert_insert_count(1, Some("sequence_posts"));
//! db.assert_insert_count(2, Some("sequence_post_comments"));
//! scope.finish().unwrap();
//! ```
//!
//! # Logging
//!
//! Events are emitted through `tracing` under the `sqltally::*` targets;
//! install any subscriber to see them.

pub mod assertions;
pub mod config;
pub mod error;
pub mod inspector;
pub mod scope;

pub use assertions::DbAssertions;
pub use config::InspectorConfig;
pub use error::{AssertionError, ConfigError, Error, OperationType, Result};
pub use inspector::{StatementInspector, StatisticsCollector};
pub use scope::TestScope;

pub use sqltally_core::{
    CountQuery, OperationKind, SnapshotEntry, StatementShape, StatementStatistics,
    StatisticsSnapshot, classify,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::assertions::DbAssertions;
    pub use crate::config::InspectorConfig;
    pub use crate::error::{AssertionError, Error, OperationType, Result};
    pub use crate::inspector::{StatementInspector, StatisticsCollector};
    pub use crate::scope::TestScope;
    pub use sqltally_core::{CountQuery, OperationKind, StatementShape, StatementStatistics};
}
