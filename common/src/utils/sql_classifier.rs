//! SQL statement classification.
//!
//! Decides how the executor handles a statement: fetch a result set, or run
//! it inside a transaction and commit.

/// Classifies SQL statements by their effect.
pub struct SqlClassifier;

/// Keywords marking a statement as data-modifying. Matched by containment
/// on the uppercased statement, so `insert`, `Insert` and SQL embedding the
/// word anywhere all take the transactional path.
const MODIFYING_KEYWORDS: [&str; 6] = ["INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER"];

/// Leading keywords of statements that produce a result set.
const ROW_RETURNING_KEYWORDS: [&str; 5] = ["SELECT", "WITH", "SHOW", "EXPLAIN", "DESCRIBE"];

impl SqlClassifier {
    /// Whether the statement modifies data and should be committed.
    pub fn is_modifying(sql: &str) -> bool {
        let upper = sql.to_uppercase();
        MODIFYING_KEYWORDS.iter().any(|kw| upper.contains(kw))
    }

    /// Whether the statement is expected to return rows.
    pub fn returns_rows(sql: &str) -> bool {
        let upper = sql.trim_start().to_uppercase();
        ROW_RETURNING_KEYWORDS
            .iter()
            .any(|kw| upper.starts_with(kw))
    }

    /// Strips a trailing semicolon (and trailing whitespace) before execution.
    pub fn strip_trailing_semicolon(sql: &str) -> &str {
        sql.trim().trim_end_matches(';').trim_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_any_case_is_modifying() {
        assert!(SqlClassifier::is_modifying("insert into t values (1)"));
        assert!(SqlClassifier::is_modifying("INSERT INTO t VALUES (1)"));
        assert!(SqlClassifier::is_modifying("Drop Table t"));
    }

    #[test]
    fn test_pure_select_is_not_modifying() {
        assert!(!SqlClassifier::is_modifying("SELECT a, b FROM t WHERE a > 1"));
    }

    #[test]
    fn test_returns_rows() {
        assert!(SqlClassifier::returns_rows("SELECT 1"));
        assert!(SqlClassifier::returns_rows("  with x as (select 1) select * from x"));
        assert!(SqlClassifier::returns_rows("SHOW TABLES"));
        assert!(!SqlClassifier::returns_rows("INSERT INTO t VALUES (1)"));
    }

    #[test]
    fn test_strip_trailing_semicolon() {
        assert_eq!(
            SqlClassifier::strip_trailing_semicolon("SELECT 1;\n"),
            "SELECT 1"
        );
        assert_eq!(SqlClassifier::strip_trailing_semicolon("SELECT 1"), "SELECT 1");
    }
}
