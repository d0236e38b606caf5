//! Query execution models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for executing SQL.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteRequest {
    /// SQL to run. When absent, the session's generated SQL is used.
    pub sql: Option<String>,
}

/// Result of a single statement execution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column names, empty for statements without a result set.
    pub columns: Vec<String>,

    /// Row data; each row is a vector of JSON values aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned.
    pub row_count: usize,

    /// Rows affected, for data-modifying statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    /// Whether the statement was committed as a data modification.
    pub committed: bool,

    /// Execution time in milliseconds.
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Result for a statement that returned rows.
    pub fn with_rows(
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            row_count: rows.len(),
            columns,
            rows,
            affected_rows: None,
            committed: false,
            execution_time_ms,
        }
    }

    /// Result for a statement without a result set.
    pub fn affected(affected: u64, execution_time_ms: u64) -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            affected_rows: Some(affected),
            committed: false,
            execution_time_ms,
        }
    }

    /// Marks the result as committed by the data-modifying path.
    pub fn mark_committed(mut self) -> Self {
        self.committed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_rows_counts_rows() {
        let result = QueryResult::with_rows(
            vec!["id".into(), "name".into()],
            vec![vec![1.into(), "a".into()], vec![2.into(), "b".into()]],
            3,
        );
        assert_eq!(result.row_count, 2);
        assert!(result.affected_rows.is_none());
        assert!(!result.committed);
    }

    #[test]
    fn test_affected_reports_count() {
        let result = QueryResult::affected(4, 1);
        assert_eq!(result.affected_rows, Some(4));
        assert!(!result.committed);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_mark_committed() {
        let result = QueryResult::affected(1, 1).mark_committed();
        assert!(result.committed);
    }
}
