//! Error types for sqltally.

use std::fmt;

/// The primary error type for sqltally operations.
#[derive(Debug)]
pub enum Error {
    /// A statement count did not match the expected value
    Assertion(AssertionError),
    /// Invalid configuration
    Config(ConfigError),
    /// Serialization/deserialization errors
    Serde(String),
}

/// The operation an assertion was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Select statements
    Query,
    /// Insert statements
    Insert,
    /// Update statements
    Update,
    /// Delete statements
    Delete,
    /// Any statement (residual check at the end of a test)
    Interaction,
    /// Sequence `nextval` calls
    NextVal,
}

impl OperationType {
    /// Name used in assertion messages.
    #[must_use]
    pub const fn op_name(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
            OperationType::Interaction => "interaction",
            OperationType::NextVal => "next val",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.op_name())
    }
}

/// A statement count mismatch.
///
/// Carries everything needed to understand the failure without rerunning
/// the test: what was counted, both counts, and a rendered summary of what
/// *was* recorded at the time of the check.
#[derive(Debug, Clone)]
pub struct AssertionError {
    pub operation: OperationType,
    pub table: Option<String>,
    pub joins: Vec<String>,
    pub expected: u64,
    pub actual: u64,
    pub summary: String,
}

impl AssertionError {
    /// Where the operation was counted, e.g. ` in posts with no joins`.
    ///
    /// Empty when no table was given.
    #[must_use]
    pub fn location(&self) -> String {
        let Some(table) = &self.table else {
            return String::new();
        };
        let joins = if self.joins.is_empty() {
            if self.operation == OperationType::Query {
                " with no joins".to_string()
            } else {
                String::new()
            }
        } else {
            format!(" join(s) {}", self.joins.join(", "))
        };
        format!(" in {table}{joins}")
    }
}

#[derive(Debug)]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Assertion(e) => write!(f, "{e}"),
            Error::Config(e) => write!(f, "Configuration error: {e}"),
            Error::Serde(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} {}(s){} but was: {}\n{}",
            self.expected,
            self.operation.op_name(),
            self.location(),
            self.actual,
            self.summary
        )
    }
}

impl std::error::Error for AssertionError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<AssertionError> for Error {
    fn from(err: AssertionError) -> Self {
        Error::Assertion(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for sqltally operations.
pub type Result<T> = std::result::Result<T, Error>;
