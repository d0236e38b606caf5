//! SQL text cleanup for LLM output.
//!
//! The model is instructed to answer with bare SQL, but replies still show
//! up wrapped in markdown fences often enough that the pipeline always runs
//! them through [`clean_llm_sql`] and [`format_sql`] before display.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

static FENCED_SQL: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"```sql\s*(.*?)\s*```")
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("fenced SQL pattern")
});

static CLAUSE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"\b(FROM|WHERE|GROUP BY|ORDER BY|LEFT JOIN|RIGHT JOIN|INNER JOIN|ON|HAVING|LIMIT)\b",
    )
    .case_insensitive(true)
    .build()
    .expect("clause keyword pattern")
});

/// Extracts the SQL query from a raw LLM reply.
///
/// Strips a ```` ```sql … ``` ```` fenced block when present, otherwise uses
/// the reply verbatim; surrounding whitespace is removed either way.
pub fn clean_llm_sql(raw: &str) -> String {
    let query = raw.trim();
    if query.is_empty() {
        return String::new();
    }
    match FENCED_SQL.captures(query) {
        Some(caps) => caps[1].trim().to_string(),
        None => query.to_string(),
    }
}

/// Inserts a newline before each major SQL clause keyword for readability.
///
/// Whole-word, case-insensitive matching keeps identifiers like `GROUPING`
/// intact. Lines are trimmed and blank lines dropped, which also makes the
/// function idempotent.
pub fn format_sql(sql: &str) -> String {
    if sql.is_empty() {
        return String::new();
    }
    let broken = CLAUSE_KEYWORDS.replace_all(sql, "\n$1");
    broken
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_extracts_fenced_block() {
        let raw = "```sql\nSELECT * FROM users\n```";
        assert_eq!(clean_llm_sql(raw), "SELECT * FROM users");
    }

    #[test]
    fn test_clean_fence_is_case_insensitive() {
        let raw = "```SQL\nSELECT 1\n```";
        assert_eq!(clean_llm_sql(raw), "SELECT 1");
    }

    #[test]
    fn test_clean_passes_unfenced_text_through_trimmed() {
        assert_eq!(clean_llm_sql("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_clean_empty_input_is_empty() {
        assert_eq!(clean_llm_sql("   "), "");
    }

    #[test]
    fn test_format_breaks_before_where() {
        let formatted = format_sql("SELECT id FROM t WHERE id = 1");
        assert!(formatted.contains("\nWHERE"));
        assert!(formatted.contains("\nFROM"));
    }

    #[test]
    fn test_format_is_case_insensitive() {
        let formatted = format_sql("select id from t where id = 1");
        assert_eq!(formatted, "select id\nfrom t\nwhere id = 1");
    }

    #[test]
    fn test_format_keeps_grouping_intact() {
        let formatted = format_sql("SELECT GROUPING(a) FROM t");
        assert!(formatted.starts_with("SELECT GROUPING(a)"));
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = format_sql("SELECT a FROM t WHERE a > 1 ORDER BY a LIMIT 5");
        let twice = format_sql(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_format_empty_input_is_empty() {
        assert_eq!(format_sql(""), "");
    }

    #[test]
    fn test_clean_then_format_end_to_end() {
        let raw = "```sql\nSELECT a FROM t\n```";
        let sql = format_sql(&clean_llm_sql(raw));
        assert_eq!(sql, "SELECT a\nFROM t");
    }
}
