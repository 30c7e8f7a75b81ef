//! Statement shapes: the key every counter is tracked under.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// The kind of operation a SQL statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// `select ... from <table>`
    Select,
    /// `insert into <table>`
    Insert,
    /// `update <table>`
    Update,
    /// `delete from <table>`
    Delete,
    /// `select nextval('<sequence>')`
    Sequence,
}

impl OperationKind {
    /// All kinds, in summary display order.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Select,
        OperationKind::Insert,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::Sequence,
    ];

    /// Lowercase name used in logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationKind::Select => "select",
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Sequence => "nextval",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classified shape of one SQL statement.
///
/// Two shapes are equal when their kind, table and *set* of joined tables are
/// equal. The joined tables keep their order of first appearance so that
/// summaries print them the way the statement did.
///
/// Table names are stored lowercased.
///
/// ```
/// use sqltally_core::{OperationKind, StatementShape};
///
/// let a = StatementShape::with_joins(OperationKind::Select, "posts", ["comments", "tags"]);
/// let b = StatementShape::with_joins(OperationKind::Select, "POSTS", ["tags", "comments"]);
/// assert_eq!(a, b);
/// assert_eq!(a.joins(), ["comments", "tags"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ShapeFields")]
pub struct StatementShape {
    kind: OperationKind,
    table: String,
    joins: Vec<String>,
}

/// Serialized form of a [`StatementShape`]; normalized through
/// [`StatementShape::with_joins`] on the way in.
#[derive(Deserialize)]
struct ShapeFields {
    kind: OperationKind,
    table: String,
    #[serde(default)]
    joins: Vec<String>,
}

impl From<ShapeFields> for StatementShape {
    fn from(fields: ShapeFields) -> Self {
        StatementShape::with_joins(fields.kind, fields.table, fields.joins)
    }
}

impl StatementShape {
    /// A shape with no joined tables.
    pub fn new(kind: OperationKind, table: impl AsRef<str>) -> Self {
        Self {
            kind,
            table: table.as_ref().to_ascii_lowercase(),
            joins: Vec::new(),
        }
    }

    /// A shape with joined tables. Duplicates are dropped, keeping the first.
    ///
    /// Only [`OperationKind::Select`] shapes carry joins; for any other kind
    /// `joins` is ignored.
    pub fn with_joins<I, S>(kind: OperationKind, table: impl AsRef<str>, joins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shape = Self::new(kind, table);
        if kind != OperationKind::Select {
            return shape;
        }
        for join in joins {
            shape.push_join(join.as_ref());
        }
        shape
    }

    pub(crate) fn push_join(&mut self, join: &str) {
        let join = join.to_ascii_lowercase();
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
    }

    /// The operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The primary table, or the sequence name for [`OperationKind::Sequence`].
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Joined tables in order of first appearance.
    #[must_use]
    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    /// Whether the statement joined any other table.
    #[must_use]
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Order-independent comparison of the joined tables against `joins`.
    ///
    /// `joins` is compared case-insensitively and duplicates in it are ignored.
    pub fn joins_match<S: AsRef<str>>(&self, joins: &[S]) -> bool {
        let mut wanted: Vec<String> = joins
            .iter()
            .map(|j| j.as_ref().to_ascii_lowercase())
            .collect();
        wanted.sort_unstable();
        wanted.dedup();
        wanted == self.sorted_joins()
    }

    fn sorted_joins(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.joins.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// Human-readable join description used in summaries.
    #[must_use]
    pub fn join_description(&self) -> String {
        if self.joins.is_empty() {
            "with no joins".to_string()
        } else {
            format!("join(s) {}", self.joins.join(", "))
        }
    }
}

impl PartialEq for StatementShape {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.table == other.table
            && self.joins.len() == other.joins.len()
            && self.sorted_joins() == other.sorted_joins()
    }
}

impl Eq for StatementShape {}

impl Hash for StatementShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.table.hash(state);
        self.sorted_joins().hash(state);
    }
}

impl fmt::Display for StatementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.table)?;
        if !self.joins.is_empty() {
            write!(f, " join(s) {}", self.joins.join(", "))?;
        }
        Ok(())
    }
}
