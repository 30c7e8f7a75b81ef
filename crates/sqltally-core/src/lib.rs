//! Core types for sqltally.
//!
//! This crate holds the two pieces every statement passes through:
//!
//! - [`classify`] turns one SQL statement into a [`StatementShape`]
//!   (operation kind, primary table, joined tables), or `None` for statements
//!   it doesn't account for (DDL, `SET`, transaction control)
//! - [`StatementStatistics`] keeps a thread-safe counter per shape and answers
//!   strict, lenient and consuming count queries
//!
//! # Example
//!
//! ```
//! use sqltally_core::{CountQuery, StatementStatistics, classify};
//!
//! let stats = StatementStatistics::new();
//! for sql in [
//!     "insert into lazy_posts (title,id) values (?,?)",
//!     "insert into lazy_post_comments (post_id,review,id) values (?,?,?)",
//!     "insert into lazy_post_comments (post_id,review,id) values (?,?,?)",
//!     "set search_path to public",
//! ] {
//!     if let Some(shape) = classify(sql) {
//!         stats.record(shape);
//!     }
//! }
//!
//! assert_eq!(stats.count(&CountQuery::insert("lazy_posts")), 1);
//! assert_eq!(stats.count(&CountQuery::insert("lazy_post_comments")), 2);
//! assert!(stats.is_empty());
//! ```

pub mod classify;
pub mod shape;
pub mod snapshot;
pub mod stats;

pub use classify::classify;
pub use shape::{OperationKind, StatementShape};
pub use snapshot::{SnapshotEntry, StatisticsSnapshot};
pub use stats::{CountQuery, StatementStatistics};
