//! SQL statement classification.
//!
//! Statements are dispatched on their leading keyword and matched against a
//! small fixed set of patterns. Anything that doesn't match (DDL, `SET`,
//! transaction control, CTEs, subqueries in `FROM`) is unrecognized and
//! returns `None`: unrecognized statements are never an error.
//!
//! # Example
//!
//! ```
//! use sqltally_core::{OperationKind, classify};
//!
//! let shape = classify(
//!     "select p.id, p.title from lazy_posts p inner join lazy_post_comments c on c.post_id = p.id",
//! )
//! .unwrap();
//! assert_eq!(shape.kind(), OperationKind::Select);
//! assert_eq!(shape.table(), "lazy_posts");
//! assert_eq!(shape.joins(), ["lazy_post_comments"]);
//!
//! assert!(classify("set search_path to public").is_none());
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::shape::{OperationKind, StatementShape};

/// Table and sequence name charset, applied to lowercased text. Input of
/// any case is accepted because it is lowercased before matching.
const IDENTIFIER_PATTERN: &str = "[a-z0-9_]+";

/// Compiled classification patterns.
///
/// Patterns run against lowercased text, so the identifier class only needs
/// the lowercase range.
struct Patterns {
    select: Regex,
    from: Regex,
    insert: Regex,
    update: Regex,
    delete: Regex,
    sequence: Regex,
    join: Regex,
    identifier: Regex,
}

impl Patterns {
    fn compile() -> Self {
        let id = IDENTIFIER_PATTERN;
        Self {
            select: build(r"^select\s"),
            from: build(r"\sfrom\s+(\S)"),
            identifier: build(&format!("^{id}")),
            insert: build(&format!(r"^insert\s+into\s+({id})")),
            update: build(&format!(r"^update\s+({id})")),
            delete: build(&format!(r"^delete\s+from\s+({id})")),
            sequence: build(&format!(r"^select\s+nextval\s*\(\s*'({id})'\s*\)")),
            join: build(&format!(r"\bjoin\s+({id})")),
        }
    }
}

fn build(pattern: &str) -> Regex {
    Regex::new(pattern).expect("classification patterns are valid regexes")
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::compile)
}

/// Classify one SQL statement.
///
/// Matching is case-insensitive and ignores leading whitespace. Patterns are
/// tried in priority order and the first match wins:
///
/// 1. `select ... from <table>`, with every `join <table>` in the statement
/// 2. `insert into <table>`
/// 3. `update <table>`
/// 4. `delete from <table>`
/// 5. `select nextval('<sequence>')`
///
/// Returns `None` for anything else.
#[must_use]
pub fn classify(sql: &str) -> Option<StatementShape> {
    let text = sql.trim_start().to_ascii_lowercase();
    let p = patterns();

    if let Some(table) = select_table(p, &text) {
        let mut shape = StatementShape::new(OperationKind::Select, table);
        for join in p.join.captures_iter(&text) {
            if let Some(m) = join.get(1) {
                shape.push_join(m.as_str());
            }
        }
        return Some(shape);
    }

    let simple = [
        (&p.insert, OperationKind::Insert),
        (&p.update, OperationKind::Update),
        (&p.delete, OperationKind::Delete),
        (&p.sequence, OperationKind::Sequence),
    ];
    simple
        .into_iter()
        .find_map(|(regex, kind)| capture(regex, &text).map(|name| StatementShape::new(kind, name)))
}

/// Table named by the first `from` of a select. A subquery or any other
/// non-identifier token there makes the statement unrecognized.
fn select_table<'t>(p: &Patterns, text: &'t str) -> Option<&'t str> {
    if !p.select.is_match(text) {
        return None;
    }
    let start = p.from.captures(text)?.get(1)?.start();
    p.identifier.find(&text[start..]).map(|m| m.as_str())
}

fn capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
